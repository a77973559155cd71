//! One `Peer` per remote party (§4.7): drives the handshake, owns the data
//! channel, and runs the heartbeat.

use std::sync::Arc;
use std::time::{Duration, Instant};

use mxp_core::{DecodeError, Flags, Frame, Kind};
use mxp_signaling::{SignalKind, SignalMessage, SignalingProvider};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::channel::{DataChannel, IceCandidate, PeerConnection, SessionDescription};
use crate::config::PeerConfig;
use crate::error::TransportError;
use crate::state::{PeerState, Role};

/// Something the application layer cares about. Heartbeat traffic (Ping and
/// Pong) never produces an event — it is fully consumed inside `Peer`.
#[derive(Debug)]
pub enum PeerEvent {
    StateChanged { peer_id: String, state: PeerState },
    Message { peer_id: String, frame: Frame },
    DecodeFailed { peer_id: String, error: DecodeError },
}

struct HeartbeatState {
    last_seen: Option<Instant>,
    rtt: Option<Duration>,
    handle: Option<JoinHandle<()>>,
}

/// A single remote party's MXP connection.
pub struct Peer {
    pub peer_id: String,
    role: Role,
    config: PeerConfig,
    state: Mutex<PeerState>,
    connected_at: Mutex<Option<Instant>>,
    heartbeat: Mutex<HeartbeatState>,
    ice_queue: Mutex<Vec<IceCandidate>>,
    remote_description_set: Mutex<bool>,
    connection: Arc<dyn PeerConnection>,
    data_channel: Mutex<Option<Arc<dyn DataChannel>>>,
    signaling: Arc<dyn SignalingProvider>,
    events: tokio::sync::mpsc::UnboundedSender<PeerEvent>,
}

impl Peer {
    pub fn new(
        peer_id: impl Into<String>,
        role: Role,
        config: PeerConfig,
        connection: Arc<dyn PeerConnection>,
        signaling: Arc<dyn SignalingProvider>,
        events: tokio::sync::mpsc::UnboundedSender<PeerEvent>,
    ) -> Arc<Peer> {
        Arc::new(Peer {
            peer_id: peer_id.into(),
            role,
            config,
            state: Mutex::new(PeerState::New),
            connected_at: Mutex::new(None),
            heartbeat: Mutex::new(HeartbeatState { last_seen: None, rtt: None, handle: None }),
            ice_queue: Mutex::new(Vec::new()),
            remote_description_set: Mutex::new(false),
            connection,
            data_channel: Mutex::new(None),
            signaling,
            events,
        })
    }

    pub async fn state(&self) -> PeerState {
        *self.state.lock().await
    }

    async fn set_state(self: &Arc<Self>, state: PeerState) {
        *self.state.lock().await = state;
        debug!(peer_id = %self.peer_id, ?state, "peer state transition");
        let _ = self.events.send(PeerEvent::StateChanged { peer_id: self.peer_id.clone(), state });
    }

    /// Initiator path: create the data channel, create+set the local
    /// offer, and emit it via signaling.
    pub async fn start_as_initiator(self: &Arc<Self>) -> Result<(), TransportError> {
        self.set_state(PeerState::Connecting).await;

        let channel = self.connection.open_data_channel(self.config.channel_mode).await;
        let channel = match channel {
            Ok(c) => c,
            Err(e) => {
                self.set_state(PeerState::Failed).await;
                return Err(e);
            }
        };
        *self.data_channel.lock().await = Some(Arc::from(channel));

        let offer = match self.connection.create_offer().await {
            Ok(o) => o,
            Err(e) => {
                self.set_state(PeerState::Failed).await;
                return Err(e);
            }
        };
        if let Err(e) = self.connection.set_local_description(offer.clone()).await {
            self.set_state(PeerState::Failed).await;
            return Err(e);
        }

        self.signaling
            .send(SignalMessage::new(
                SignalKind::Offer,
                self.signaling.local_id(),
                self.peer_id.clone(),
                serde_json::Value::String(offer.0),
            ))
            .await?;

        self.spawn_heartbeat_once_open().await;
        Ok(())
    }

    /// Responder path: an Offer arrived. Set the remote description, drain
    /// any queued ICE candidates, produce and emit an Answer.
    pub async fn accept_offer(self: &Arc<Self>, offer: SessionDescription) -> Result<(), TransportError> {
        self.set_state(PeerState::Connecting).await;

        if let Err(e) = self.connection.set_remote_description(offer).await {
            self.set_state(PeerState::Failed).await;
            return Err(e);
        }
        *self.remote_description_set.lock().await = true;
        self.drain_ice_queue().await?;

        let answer = match self.connection.create_answer().await {
            Ok(a) => a,
            Err(e) => {
                self.set_state(PeerState::Failed).await;
                return Err(e);
            }
        };
        if let Err(e) = self.connection.set_local_description(answer.clone()).await {
            self.set_state(PeerState::Failed).await;
            return Err(e);
        }

        self.signaling
            .send(SignalMessage::new(
                SignalKind::Answer,
                self.signaling.local_id(),
                self.peer_id.clone(),
                serde_json::Value::String(answer.0),
            ))
            .await?;

        // The channel itself was created on the initiator's side; this call
        // is this crate's abstraction over the host's "ondatachannel" event
        // handing us the responder-side handle to that same channel.
        let channel = match self.connection.open_data_channel(self.config.channel_mode).await {
            Ok(c) => c,
            Err(e) => {
                self.set_state(PeerState::Failed).await;
                return Err(e);
            }
        };
        *self.data_channel.lock().await = Some(Arc::from(channel));

        self.spawn_heartbeat_once_open().await;
        Ok(())
    }

    /// Initiator path: an Answer arrived for our earlier Offer.
    pub async fn accept_answer(self: &Arc<Self>, answer: SessionDescription) -> Result<(), TransportError> {
        if let Err(e) = self.connection.set_remote_description(answer).await {
            self.set_state(PeerState::Failed).await;
            return Err(e);
        }
        *self.remote_description_set.lock().await = true;
        self.drain_ice_queue().await?;
        Ok(())
    }

    /// Feed an ICE candidate: queued if the remote description isn't set
    /// yet, applied immediately otherwise.
    pub async fn add_ice_candidate(self: &Arc<Self>, candidate: IceCandidate) -> Result<(), TransportError> {
        if *self.remote_description_set.lock().await {
            self.connection.add_ice_candidate(candidate).await
        } else {
            trace!(peer_id = %self.peer_id, "buffering ICE candidate before remote description is set");
            self.ice_queue.lock().await.push(candidate);
            Ok(())
        }
    }

    async fn drain_ice_queue(self: &Arc<Self>) -> Result<(), TransportError> {
        let queued = std::mem::take(&mut *self.ice_queue.lock().await);
        for candidate in queued {
            self.connection.add_ice_candidate(candidate).await?;
        }
        Ok(())
    }

    /// Called once the host's data channel signals it is open: records
    /// `connected_at`, transitions Connected, starts the heartbeat and the
    /// receive pump.
    async fn spawn_heartbeat_once_open(self: &Arc<Self>) {
        *self.connected_at.lock().await = Some(Instant::now());
        self.set_state(PeerState::Connected).await;

        if let Some(channel) = self.data_channel.lock().await.clone() {
            let this = self.clone();
            tokio::spawn(async move {
                while let Some(bytes) = channel.recv().await {
                    this.on_chunk(&bytes).await;
                }
                trace!(peer_id = %this.peer_id, "receive pump stopped, channel closed");
            });
        }

        let this = self.clone();
        let interval = self.config.heartbeat_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if this.state().await != PeerState::Connected {
                    return;
                }
                trace!(peer_id = %this.peer_id, "sending heartbeat ping");
                if let Err(e) = this.send(Frame::ping()).await {
                    warn!(peer_id = %this.peer_id, error = %e, "heartbeat ping failed");
                    return;
                }
            }
        });
        self.heartbeat.lock().await.handle = Some(handle);
    }

    /// Send path (§4.7): fails `ChannelClosed` if the data channel is not
    /// open, else encodes and writes.
    pub async fn send(self: &Arc<Self>, frame: Frame) -> Result<(), TransportError> {
        let channel = self.data_channel.lock().await.clone().ok_or(TransportError::ChannelClosed)?;
        if !channel.is_open() {
            return Err(TransportError::ChannelClosed);
        }
        let bytes = mxp_core::encode(&frame);
        channel.send(bytes).await
    }

    /// Receive path (§4.7): decode a raw chunk. Heartbeat frames are
    /// consumed here and never reach the application.
    pub async fn on_chunk(self: &Arc<Self>, bytes: &[u8]) {
        match mxp_core::decode(bytes) {
            Ok(frame) => self.on_frame(frame).await,
            Err(error) => {
                warn!(peer_id = %self.peer_id, %error, "dropping undecodable chunk");
                let _ = self.events.send(PeerEvent::DecodeFailed { peer_id: self.peer_id.clone(), error });
            }
        }
    }

    async fn on_frame(self: &Arc<Self>, frame: Frame) {
        match frame.kind {
            Kind::Ping => {
                self.heartbeat.lock().await.last_seen = Some(Instant::now());
                if let Err(e) = self.send(Frame::pong(&frame)).await {
                    warn!(peer_id = %self.peer_id, error = %e, "failed to answer heartbeat ping");
                }
            }
            Kind::Pong => {
                let now = Instant::now();
                let mut hb = self.heartbeat.lock().await;
                if let Some(last) = hb.last_seen {
                    hb.rtt = Some(now.saturating_duration_since(last));
                }
                hb.last_seen = Some(now);
            }
            _ => {
                let _ = self.events.send(PeerEvent::Message { peer_id: self.peer_id.clone(), frame });
            }
        }
    }

    pub async fn last_seen(&self) -> Option<Instant> {
        self.heartbeat.lock().await.last_seen
    }

    pub async fn rtt(&self) -> Option<Duration> {
        self.heartbeat.lock().await.rtt
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Cancel the heartbeat, close the data channel and connection,
    /// transition Closed. Safe to call more than once.
    pub async fn close(self: &Arc<Self>) {
        if self.state().await.is_terminal() {
            return;
        }
        if let Some(handle) = self.heartbeat.lock().await.handle.take() {
            handle.abort();
        }
        if let Some(channel) = self.data_channel.lock().await.take() {
            channel.close().await;
        }
        self.connection.close().await;
        self.set_state(PeerState::Closed).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdouble::InMemoryConnection;
    use mxp_signaling::ManualProvider;
    use tokio::sync::mpsc;

    fn make_peer(peer_id: &str, role: Role) -> (Arc<Peer>, mpsc::UnboundedReceiver<PeerEvent>, Arc<InMemoryConnection>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = Arc::new(InMemoryConnection::new());
        let signaling = Arc::new(ManualProvider::new("local", |_| {}));
        let peer = Peer::new(peer_id, role, PeerConfig::new("local"), connection.clone(), signaling, tx);
        (peer, rx, connection)
    }

    #[tokio::test]
    async fn ping_is_answered_with_pong_and_not_delivered() {
        let (peer, mut events, connection) = make_peer("remote", Role::Responder);
        peer.accept_offer(SessionDescription("offer".into())).await.unwrap();
        let _ = events.recv().await; // Connecting
        let _ = events.recv().await; // Connected

        let ping = Frame::ping();
        let bytes = mxp_core::encode(&ping);
        peer.on_chunk(&bytes).await;

        let sent = connection.sent_messages().await;
        let sent_frame = mxp_core::decode(sent.last().unwrap()).unwrap();
        assert_eq!(sent_frame.kind, Kind::Pong);
        assert_eq!(sent_frame.correlation_id, ping.message_id);

        assert!(events.try_recv().is_err(), "heartbeat frames must not be delivered to the app");
    }

    #[tokio::test]
    async fn ice_candidates_are_buffered_until_remote_description_is_set() {
        let (peer, _events, _connection) = make_peer("remote", Role::Initiator);
        peer.add_ice_candidate(IceCandidate("cand-1".into())).await.unwrap();
        assert_eq!(peer.ice_queue.lock().await.len(), 1);

        peer.accept_answer(SessionDescription("answer".into())).await.unwrap();
        assert!(peer.ice_queue.lock().await.is_empty());
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (peer, _events, _connection) = make_peer("remote", Role::Initiator);
        peer.close().await;
        peer.close().await;
        assert_eq!(peer.state().await, PeerState::Closed);
    }
}
