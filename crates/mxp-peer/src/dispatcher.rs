//! Multi-peer dispatcher (§4.8): owns every [`Peer`] for this node, routes
//! incoming signaling by kind, and exposes an immutable stats snapshot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use mxp_core::Frame;
use mxp_signaling::{SignalKind, SignalMessage, SignalingProvider};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::channel::{IceCandidate, PeerConnection, SessionDescription};
use crate::config::PeerConfig;
use crate::error::TransportError;
use crate::peer::{Peer, PeerEvent};
use crate::state::{PeerState, Role};

/// Factory for the per-peer [`PeerConnection`] the dispatcher should open
/// when it needs a fresh `Peer` — the host supplies this since constructing
/// the underlying ICE/SDP object is outside this crate's concern.
pub trait ConnectionFactory: Send + Sync {
    fn create(&self) -> Arc<dyn PeerConnection>;
}

/// An immutable point-in-time view of dispatcher-wide counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stats {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub peers_connected: usize,
}

#[derive(Default)]
struct Counters {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
}

/// Owns `peer_id -> Peer` for this node.
pub struct Dispatcher {
    config: PeerConfig,
    signaling: Arc<dyn SignalingProvider>,
    connections: Arc<dyn ConnectionFactory>,
    peers: Mutex<HashMap<String, Arc<Peer>>>,
    events_tx: mpsc::UnboundedSender<PeerEvent>,
    counters: Counters,
}

impl Dispatcher {
    pub fn new(
        config: PeerConfig,
        signaling: Arc<dyn SignalingProvider>,
        connections: Arc<dyn ConnectionFactory>,
        events_tx: mpsc::UnboundedSender<PeerEvent>,
    ) -> Arc<Dispatcher> {
        Arc::new(Dispatcher {
            config,
            signaling,
            connections,
            peers: Mutex::new(HashMap::new()),
            events_tx,
            counters: Counters::default(),
        })
    }

    fn new_peer(self: &Arc<Self>, peer_id: &str, role: Role) -> Arc<Peer> {
        Peer::new(
            peer_id,
            role,
            self.config.clone(),
            self.connections.create(),
            self.signaling.clone(),
            self.events_tx.clone(),
        )
    }

    /// Existing Connected entry returns immediately. An entry in any other
    /// state is closed and replaced. Otherwise a fresh Initiator `Peer` is
    /// created and awaited until Connected, Timeout, or HandshakeFailed.
    pub async fn connect(self: &Arc<Self>, peer_id: &str) -> Result<Arc<Peer>, TransportError> {
        {
            let peers = self.peers.lock().await;
            if let Some(existing) = peers.get(peer_id) {
                if existing.state().await == PeerState::Connected {
                    return Ok(existing.clone());
                }
            }
        }
        if let Some(stale) = self.peers.lock().await.remove(peer_id) {
            stale.close().await;
        }

        let peer = self.new_peer(peer_id, Role::Initiator);
        self.peers.lock().await.insert(peer_id.to_string(), peer.clone());
        peer.start_as_initiator().await?;

        let result = tokio::time::timeout(self.config.connection_timeout, wait_until_settled(&peer)).await;
        match result {
            Ok(PeerState::Connected) => {
                info!(peer_id, "peer connected");
                Ok(peer)
            }
            Ok(PeerState::Failed) => Err(TransportError::HandshakeFailed(peer_id.to_string())),
            Ok(_) => Err(TransportError::HandshakeFailed(peer_id.to_string())),
            Err(_) => Err(TransportError::Timeout(peer_id.to_string())),
        }
    }

    pub async fn disconnect(self: &Arc<Self>, peer_id: &str) {
        if let Some(peer) = self.peers.lock().await.remove(peer_id) {
            peer.close().await;
        }
    }

    pub async fn send(self: &Arc<Self>, peer_id: &str, frame: Frame) -> Result<(), TransportError> {
        let peer = {
            let peers = self.peers.lock().await;
            peers.get(peer_id).cloned().ok_or_else(|| TransportError::UnknownPeer(peer_id.to_string()))?
        };
        if peer.state().await != PeerState::Connected {
            return Err(TransportError::NotConnected(peer_id.to_string()));
        }
        let len = frame.payload.len() as u64;
        peer.send(frame).await?;
        self.counters.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.counters.bytes_sent.fetch_add(len, Ordering::Relaxed);
        Ok(())
    }

    /// Encode once, send to every Connected peer. Per-peer failures are
    /// logged, not fatal.
    pub async fn broadcast(self: &Arc<Self>, frame: Frame) {
        let peers: Vec<Arc<Peer>> = self.peers.lock().await.values().cloned().collect();
        for peer in peers {
            if peer.state().await != PeerState::Connected {
                continue;
            }
            if let Err(e) = peer.send(frame.clone()).await {
                warn!(peer_id = %peer.peer_id, error = %e, "broadcast to peer failed");
                continue;
            }
            self.counters.messages_sent.fetch_add(1, Ordering::Relaxed);
            self.counters.bytes_sent.fetch_add(frame.payload.len() as u64, Ordering::Relaxed);
        }
    }

    /// Route an inbound signaling message. Messages not addressed to this
    /// node are dropped.
    pub async fn handle_signal(self: &Arc<Self>, msg: SignalMessage) {
        if !msg.addressed_to(self.signaling.local_id()) {
            return;
        }
        match msg.kind {
            SignalKind::Offer => {
                let sdp = match msg.payload.as_str() {
                    Some(s) => s.to_string(),
                    None => {
                        warn!(from = %msg.from, "offer payload was not a string, dropping");
                        return;
                    }
                };
                let peer = {
                    let mut peers = self.peers.lock().await;
                    peers.entry(msg.from.clone()).or_insert_with(|| self.new_peer(&msg.from, Role::Responder)).clone()
                };
                if let Err(e) = peer.accept_offer(SessionDescription(sdp)).await {
                    warn!(from = %msg.from, error = %e, "failed to accept offer");
                }
            }
            SignalKind::Answer => {
                let peer = self.peers.lock().await.get(&msg.from).cloned();
                let Some(peer) = peer else {
                    warn!(from = %msg.from, "answer for unknown peer, dropping");
                    return;
                };
                let sdp = match msg.payload.as_str() {
                    Some(s) => s.to_string(),
                    None => {
                        warn!(from = %msg.from, "answer payload was not a string, dropping");
                        return;
                    }
                };
                if let Err(e) = peer.accept_answer(SessionDescription(sdp)).await {
                    warn!(from = %msg.from, error = %e, "failed to accept answer");
                }
            }
            SignalKind::IceCandidate => {
                let peer = self.peers.lock().await.get(&msg.from).cloned();
                let Some(peer) = peer else {
                    warn!(from = %msg.from, "ICE candidate for unknown peer, dropping");
                    return;
                };
                let candidate = match msg.payload.as_str() {
                    Some(s) => s.to_string(),
                    None => {
                        warn!(from = %msg.from, "ICE candidate payload was not a string, dropping");
                        return;
                    }
                };
                if let Err(e) = peer.add_ice_candidate(IceCandidate(candidate)).await {
                    warn!(from = %msg.from, error = %e, "failed to apply ICE candidate");
                }
            }
            SignalKind::Hangup => {
                self.disconnect(&msg.from).await;
            }
        }
    }

    pub async fn stats(self: &Arc<Self>) -> Stats {
        let peers = self.peers.lock().await;
        let mut peers_connected = 0;
        for peer in peers.values() {
            if peer.state().await == PeerState::Connected {
                peers_connected += 1;
            }
        }
        Stats {
            messages_sent: self.counters.messages_sent.load(Ordering::Relaxed),
            messages_received: self.counters.messages_received.load(Ordering::Relaxed),
            bytes_sent: self.counters.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.counters.bytes_received.load(Ordering::Relaxed),
            peers_connected,
        }
    }

    /// Record a message delivered up to the application from `peer_id`,
    /// for the stats snapshot. Called by the host's event loop when it
    /// consumes a [`PeerEvent::Message`].
    pub fn record_received(&self, payload_len: usize) {
        self.counters.messages_received.fetch_add(1, Ordering::Relaxed);
        self.counters.bytes_received.fetch_add(payload_len as u64, Ordering::Relaxed);
    }
}

async fn wait_until_settled(peer: &Arc<Peer>) -> PeerState {
    loop {
        let state = peer.state().await;
        if matches!(state, PeerState::Connected | PeerState::Failed) {
            return state;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdouble::InMemoryConnection;
    use mxp_signaling::{BroadcastBus, BroadcastProvider};

    struct InMemoryFactory;
    impl ConnectionFactory for InMemoryFactory {
        fn create(&self) -> Arc<dyn PeerConnection> {
            Arc::new(InMemoryConnection::new())
        }
    }

    fn make_dispatcher(local_id: &str, bus: BroadcastBus) -> Arc<Dispatcher> {
        let (tx, _rx) = mpsc::unbounded_channel();
        let signaling = Arc::new(BroadcastProvider::new(local_id, bus));
        Dispatcher::new(PeerConfig::new(local_id), signaling, Arc::new(InMemoryFactory), tx)
    }

    #[tokio::test]
    async fn connect_reaches_connected_over_loopback_signaling() {
        let bus = BroadcastBus::new();
        let alice = make_dispatcher("alice", bus.clone());
        let bob = make_dispatcher("bob", bus.clone());

        let bob_signaling_task = {
            let bob = bob.clone();
            let mut bob_sub = bob.signaling.subscribe();
            tokio::spawn(async move {
                use futures::StreamExt;
                if let Some(msg) = bob_sub.next().await {
                    bob.handle_signal(msg).await;
                }
            })
        };
        let alice_signaling_task = {
            let alice = alice.clone();
            let mut alice_sub = alice.signaling.subscribe();
            tokio::spawn(async move {
                use futures::StreamExt;
                if let Some(msg) = alice_sub.next().await {
                    alice.handle_signal(msg).await;
                }
            })
        };

        let connected = alice.connect("bob").await.unwrap();
        assert_eq!(connected.peer_id, "bob");

        bob_signaling_task.abort();
        alice_signaling_task.abort();
    }

    #[tokio::test]
    async fn send_to_unknown_peer_is_an_error() {
        let bus = BroadcastBus::new();
        let alice = make_dispatcher("alice", bus);
        let err = alice.send("ghost", Frame::call(b"hi".to_vec())).await.unwrap_err();
        assert!(matches!(err, TransportError::UnknownPeer(id) if id == "ghost"));
    }
}
