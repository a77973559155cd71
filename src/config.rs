// Copyright (c) 2026 MXP contributors
//
// SPDX-License-Identifier: MIT
//! Typed configuration for the chat demo (§4.9): a [`toml`]-deserialized
//! `Config`, with CLI flags layered on top. Unknown keys are rejected —
//! unlike the tolerant JSON the A2A model accepts, an operator-facing
//! config file should fail loudly on a typo.

use std::path::Path;

use anyhow::Context;
use mxp_peer::{ChannelMode, PeerConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub peer: PeerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeerSection {
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_interval_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub connection_timeout_secs: u64,
    #[serde(default)]
    pub channel_mode: ChannelMode,
}

impl Default for PeerSection {
    fn default() -> Self {
        PeerSection {
            heartbeat_interval_secs: default_heartbeat_secs(),
            connection_timeout_secs: default_timeout_secs(),
            channel_mode: ChannelMode::default(),
        }
    }
}

fn default_heartbeat_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load `path` if given, falling back to defaults when absent. A path
    /// that exists but fails to parse is an error — we never silently fall
    /// back from a malformed file.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
        let Some(path) = path else {
            debug!("no config file given, using defaults");
            return Ok(Config::default());
        };
        let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: Config = toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn to_peer_config(&self, local_id: impl Into<String>) -> PeerConfig {
        PeerConfig::new(local_id)
            .with_heartbeat_interval(std::time::Duration::from_secs(self.peer.heartbeat_interval_secs))
            .with_connection_timeout(std::time::Duration::from_secs(self.peer.connection_timeout_secs))
            .with_channel_mode(self.peer.channel_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_a_config_file() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.peer.heartbeat_interval_secs, 5);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = std::env::temp_dir().join(format!("mxp-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "typo_field = true\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
