//! In-memory hub backend: a process-local registry of peer ids to inboxes.
//! `send` schedules delivery onto the recipient's task rather than
//! delivering inline, so callers can't accidentally depend on synchronous
//! hand-off semantics that a real relay would never provide.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::trace;

use crate::error::SignalingError;
use crate::types::SignalMessage;

use crate::provider::SignalingProvider;

type Inboxes = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<SignalMessage>>>>;

/// Shared registry backing any number of [`MemoryHubProvider`]s in the same
/// process.
#[derive(Clone, Default)]
pub struct MemoryHub {
    inboxes: Inboxes,
}

impl MemoryHub {
    pub fn new() -> Self {
        MemoryHub::default()
    }

    /// Register a provider for `local_id`, returning the receiving end of
    /// its inbox. Re-registering the same id replaces the previous inbox.
    fn register(&self, local_id: &str) -> mpsc::UnboundedReceiver<SignalMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inboxes.lock().expect("memory hub mutex poisoned").insert(local_id.to_string(), tx);
        rx
    }
}

/// A [`SignalingProvider`] backed by a [`MemoryHub`] shared in-process.
pub struct MemoryHubProvider {
    local_id: String,
    hub: MemoryHub,
    rx: Mutex<Option<mpsc::UnboundedReceiver<SignalMessage>>>,
}

impl MemoryHubProvider {
    pub fn new(local_id: impl Into<String>, hub: MemoryHub) -> Self {
        let local_id = local_id.into();
        let rx = hub.register(&local_id);
        MemoryHubProvider { local_id, hub, rx: Mutex::new(Some(rx)) }
    }
}

#[async_trait]
impl SignalingProvider for MemoryHubProvider {
    async fn send(&self, msg: SignalMessage) -> Result<(), SignalingError> {
        let target = msg.to.clone();
        let sender = {
            let inboxes = self.hub.inboxes.lock().expect("memory hub mutex poisoned");
            inboxes.get(&target).cloned()
        };
        let Some(sender) = sender else {
            return Err(SignalingError::UnknownRecipient(target));
        };
        tokio::spawn(async move {
            if sender.send(msg).is_err() {
                trace!("memory hub recipient dropped before delivery");
            }
        });
        Ok(())
    }

    fn subscribe(&self) -> BoxStream<'static, SignalMessage> {
        let rx = self.rx.lock().expect("memory hub mutex poisoned").take().expect("subscribe called more than once");
        Box::pin(UnboundedReceiverStream::new(rx))
    }

    fn local_id(&self) -> &str {
        &self.local_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignalKind;
    use futures::StreamExt;

    #[tokio::test]
    async fn delivers_to_registered_recipient() {
        let hub = MemoryHub::new();
        let alice = MemoryHubProvider::new("alice", hub.clone());
        let bob = MemoryHubProvider::new("bob", hub.clone());
        let mut bob_rx = bob.subscribe();

        alice
            .send(SignalMessage::new(SignalKind::Offer, "alice", "bob", serde_json::json!({"sdp": "..."})))
            .await
            .unwrap();

        let msg = bob_rx.next().await.unwrap();
        assert_eq!(msg.from, "alice");
    }

    #[tokio::test]
    async fn unknown_recipient_is_an_error() {
        let hub = MemoryHub::new();
        let alice = MemoryHubProvider::new("alice", hub.clone());
        let err = alice
            .send(SignalMessage::new(SignalKind::Hangup, "alice", "ghost", serde_json::json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, SignalingError::UnknownRecipient(id) if id == "ghost"));
    }
}
