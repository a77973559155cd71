//! Manual signaling backend: `receive` injects a message as if it arrived
//! over the wire; outgoing messages are handed to a caller-supplied sink.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::error::SignalingError;
use crate::provider::{SignalingProvider, EVENT_CHANNEL_CAPACITY};
use crate::types::SignalMessage;

/// A signaling provider with no real transport: useful for tests and for
/// embedding into a host application that already has its own channel.
pub struct ManualProvider {
    local_id: String,
    incoming_tx: broadcast::Sender<SignalMessage>,
    sink: Arc<dyn Fn(SignalMessage) + Send + Sync>,
}

impl ManualProvider {
    pub fn new(local_id: impl Into<String>, sink: impl Fn(SignalMessage) + Send + Sync + 'static) -> Self {
        let (incoming_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        ManualProvider { local_id: local_id.into(), incoming_tx, sink: Arc::new(sink) }
    }

    /// Inject `msg` as though it had just been received from the remote end.
    pub fn receive(&self, msg: SignalMessage) {
        // No subscribers yet is not an error — the message is simply dropped,
        // matching tokio::sync::broadcast's documented behavior.
        let _ = self.incoming_tx.send(msg);
    }
}

#[async_trait]
impl SignalingProvider for ManualProvider {
    async fn send(&self, msg: SignalMessage) -> Result<(), SignalingError> {
        (self.sink)(msg);
        Ok(())
    }

    fn subscribe(&self) -> BoxStream<'static, SignalMessage> {
        let stream = BroadcastStream::new(self.incoming_tx.subscribe()).filter_map(|r| async move { r.ok() });
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
    use std::sync::Mutex;

    #[tokio::test]
    async fn receive_is_observed_by_subscribers() {
        let provider = ManualProvider::new("local", |_| {});
        let mut rx = provider.subscribe();
        provider.receive(SignalMessage::new(SignalKind::Offer, "remote", "local", serde_json::json!({})));
        let msg = rx.next().await.unwrap();
        assert_eq!(msg.from, "remote");
    }

    #[tokio::test]
    async fn send_hands_message_to_the_sink() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sent_clone = sent.clone();
        let provider = ManualProvider::new("local", move |msg| sent_clone.lock().unwrap().push(msg));
        provider
            .send(SignalMessage::new(SignalKind::Answer, "local", "remote", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(sent.lock().unwrap().len(), 1);
    }
}
