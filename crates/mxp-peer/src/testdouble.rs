//! An in-memory [`PeerConnection`]/[`DataChannel`] double, so the state
//! machine in [`crate::peer`] can be exercised without a real ICE/SDP stack
//! (§6.6). [`InMemoryConnection::pair`] wires two instances together so
//! bytes sent on one side are actually delivered to the other — useful for
//! anything driving two `Peer`s against each other, like the CLI chat demo.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::channel::{DataChannel, IceCandidate, IceConnectionState, PeerConnection, SessionDescription};
use crate::config::ChannelMode;
use crate::error::TransportError;

struct Inner {
    sent: Mutex<Vec<Vec<u8>>>,
    open: std::sync::atomic::AtomicBool,
    outbox: Option<mpsc::UnboundedSender<Vec<u8>>>,
    inbox: Mutex<Option<mpsc::UnboundedReceiver<Vec<u8>>>>,
}

/// A `PeerConnection` double that always succeeds immediately and hands out
/// an [`InMemoryDataChannel`] sharing its sent-message log.
pub struct InMemoryConnection {
    inner: Arc<Inner>,
}

impl InMemoryConnection {
    /// A standalone double: `send` only records to `sent_messages`, nothing
    /// is ever received. Suited to exercising `Peer` in isolation, driving
    /// its receive path directly through `Peer::on_chunk`.
    pub fn new() -> Self {
        InMemoryConnection {
            inner: Arc::new(Inner {
                sent: Mutex::new(Vec::new()),
                open: std::sync::atomic::AtomicBool::new(false),
                outbox: None,
                inbox: Mutex::new(None),
            }),
        }
    }

    /// Two connections wired together: bytes sent on one side's data
    /// channel are delivered to the other's `recv`.
    pub fn pair() -> (InMemoryConnection, InMemoryConnection) {
        let (a_to_b, b_from_a) = mpsc::unbounded_channel();
        let (b_to_a, a_from_b) = mpsc::unbounded_channel();
        let a = InMemoryConnection {
            inner: Arc::new(Inner {
                sent: Mutex::new(Vec::new()),
                open: std::sync::atomic::AtomicBool::new(false),
                outbox: Some(a_to_b),
                inbox: Mutex::new(Some(a_from_b)),
            }),
        };
        let b = InMemoryConnection {
            inner: Arc::new(Inner {
                sent: Mutex::new(Vec::new()),
                open: std::sync::atomic::AtomicBool::new(false),
                outbox: Some(b_to_a),
                inbox: Mutex::new(Some(b_from_a)),
            }),
        };
        (a, b)
    }

    /// Every chunk handed to the data channel's `send`, in order.
    pub async fn sent_messages(&self) -> Vec<Vec<u8>> {
        self.inner.sent.lock().await.clone()
    }
}

impl Default for InMemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PeerConnection for InMemoryConnection {
    async fn create_offer(&self) -> Result<SessionDescription, TransportError> {
        Ok(SessionDescription("double-offer".into()))
    }

    async fn create_answer(&self) -> Result<SessionDescription, TransportError> {
        Ok(SessionDescription("double-answer".into()))
    }

    async fn set_local_description(&self, _desc: SessionDescription) -> Result<(), TransportError> {
        Ok(())
    }

    async fn set_remote_description(&self, _desc: SessionDescription) -> Result<(), TransportError> {
        Ok(())
    }

    async fn add_ice_candidate(&self, _candidate: IceCandidate) -> Result<(), TransportError> {
        Ok(())
    }

    async fn open_data_channel(&self, _mode: ChannelMode) -> Result<Box<dyn DataChannel>, TransportError> {
        self.inner.open.store(true, std::sync::atomic::Ordering::SeqCst);
        Ok(Box::new(InMemoryDataChannel { inner: self.inner.clone() }))
    }

    fn ice_state(&self) -> IceConnectionState {
        if self.inner.open.load(std::sync::atomic::Ordering::SeqCst) {
            IceConnectionState::Connected
        } else {
            IceConnectionState::New
        }
    }

    async fn close(&self) {
        self.inner.open.store(false, std::sync::atomic::Ordering::SeqCst);
    }
}

/// The data channel half of [`InMemoryConnection`].
pub struct InMemoryDataChannel {
    inner: Arc<Inner>,
}

#[async_trait]
impl DataChannel for InMemoryDataChannel {
    async fn send(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::ChannelClosed);
        }
        if let Some(outbox) = &self.inner.outbox {
            let _ = outbox.send(bytes.clone());
        }
        self.inner.sent.lock().await.push(bytes);
        Ok(())
    }

    async fn recv(&self) -> Option<Vec<u8>> {
        let mut guard = self.inner.inbox.lock().await;
        match guard.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    async fn close(&self) {
        self.inner.open.store(false, std::sync::atomic::Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.inner.open.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn paired_connections_deliver_sent_bytes_to_each_other() {
        let (a, b) = InMemoryConnection::pair();
        let a_channel = a.open_data_channel(ChannelMode::Reliable).await.unwrap();
        let b_channel = b.open_data_channel(ChannelMode::Reliable).await.unwrap();

        a_channel.send(b"hello".to_vec()).await.unwrap();
        assert_eq!(b_channel.recv().await, Some(b"hello".to_vec()));
    }
}
