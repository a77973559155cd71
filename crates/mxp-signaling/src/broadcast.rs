//! Same-origin broadcast backend: every provider shares a single bus and
//! filters incoming traffic by recipient id. Suited to same-process or
//! same-tab test setups where a real relay would be overkill.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::error::SignalingError;
use crate::provider::{SignalingProvider, EVENT_CHANNEL_CAPACITY};
use crate::types::SignalMessage;

/// Shared bus backing any number of [`BroadcastProvider`]s. Clone to hand
/// out another handle onto the same underlying channel.
#[derive(Clone)]
pub struct BroadcastBus {
    tx: broadcast::Sender<SignalMessage>,
}

impl BroadcastBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        BroadcastBus { tx }
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`SignalingProvider`] whose `send` publishes onto a [`BroadcastBus`]
/// and whose `subscribe` filters that same bus down to messages addressed
/// to this provider's own local id.
pub struct BroadcastProvider {
    local_id: String,
    bus: BroadcastBus,
}

impl BroadcastProvider {
    pub fn new(local_id: impl Into<String>, bus: BroadcastBus) -> Self {
        BroadcastProvider { local_id: local_id.into(), bus }
    }
}

#[async_trait]
impl SignalingProvider for BroadcastProvider {
    async fn send(&self, msg: SignalMessage) -> Result<(), SignalingError> {
        // No live subscribers is not an error for a broadcast bus.
        let _ = self.bus.tx.send(msg);
        Ok(())
    }

    fn subscribe(&self) -> BoxStream<'static, SignalMessage> {
        let local_id = self.local_id.clone();
        let stream = BroadcastStream::new(self.bus.tx.subscribe())
            .filter_map(|r| async move { r.ok() })
            .filter(move |msg| {
                let keep = msg.addressed_to(&local_id);
                async move { keep }
            });
        Box::pin(stream)
    }

    fn local_id(&self) -> &str {
        &self.local_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignalKind;

    #[tokio::test]
    async fn delivers_only_to_addressed_recipient() {
        let bus = BroadcastBus::new();
        let alice = BroadcastProvider::new("alice", bus.clone());
        let bob = BroadcastProvider::new("bob", bus.clone());
        let mut alice_rx = alice.subscribe();
        let mut bob_rx = bob.subscribe();

        bob.send(SignalMessage::new(SignalKind::Offer, "bob", "alice", serde_json::json!({})))
            .await
            .unwrap();

        let received = alice_rx.next().await.unwrap();
        assert_eq!(received.from, "bob");

        // bob did not address himself, so his own subscriber sees nothing.
        bob.send(SignalMessage::new(SignalKind::Hangup, "alice", "everyone-else", serde_json::json!({})))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(bob_rx.next().now_or_never().flatten().is_none());
    }

    use futures::FutureExt;

    #[tokio::test]
    async fn wildcard_recipient_reaches_everyone() {
        let bus = BroadcastBus::new();
        let alice = BroadcastProvider::new("alice", bus.clone());
        let bob = BroadcastProvider::new("bob", bus.clone());
        let mut alice_rx = alice.subscribe();
        let mut bob_rx = bob.subscribe();

        alice
            .send(SignalMessage::new(SignalKind::Hangup, "alice", "*", serde_json::json!({})))
            .await
            .unwrap();

        assert_eq!(alice_rx.next().await.unwrap().kind, SignalKind::Hangup);
        assert_eq!(bob_rx.next().await.unwrap().kind, SignalKind::Hangup);
    }
}
