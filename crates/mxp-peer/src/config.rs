//! Typed peer-transport configuration (§4.9). Loaded by the host
//! application (see the root `mxp` binary's config layer) and handed to
//! [`crate::dispatcher::Dispatcher::new`]; never hand-parsed here.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Reliability mode for the `"mxp"` data channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    /// Ordered, reliable delivery (retransmits enabled).
    Reliable,
    /// Effectively unreliable: zero retransmits.
    Unreliable,
}

impl Default for ChannelMode {
    fn default() -> Self {
        ChannelMode::Reliable
    }
}

/// Configuration for a [`crate::peer::Peer`] / [`crate::dispatcher::Dispatcher`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeerConfig {
    /// This node's own local id, used as `from` on signaling traffic.
    pub local_id: String,

    /// How often a Connected peer emits a heartbeat Ping.
    #[serde(with = "duration_secs", default = "default_heartbeat_interval")]
    pub heartbeat_interval: Duration,

    /// How long `Dispatcher::connect` waits for a peer to reach Connected.
    #[serde(with = "duration_secs", default = "default_connection_timeout")]
    pub connection_timeout: Duration,

    /// Reliability mode for the data channel.
    #[serde(default)]
    pub channel_mode: ChannelMode,
}

fn default_heartbeat_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_connection_timeout() -> Duration {
    Duration::from_secs(30)
}

impl PeerConfig {
    pub fn new(local_id: impl Into<String>) -> Self {
        PeerConfig {
            local_id: local_id.into(),
            heartbeat_interval: default_heartbeat_interval(),
            connection_timeout: default_connection_timeout(),
            channel_mode: ChannelMode::default(),
        }
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn with_channel_mode(mut self, mode: ChannelMode) -> Self {
        self.channel_mode = mode;
        self
    }
}

/// `serde(with = …)` helper: (de)serialize a [`Duration`] as whole seconds,
/// matching how the rest of this config's TOML files express durations.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        value.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = PeerConfig::new("local");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
        assert_eq!(config.connection_timeout, Duration::from_secs(30));
        assert_eq!(config.channel_mode, ChannelMode::Reliable);
    }
}
