//! The datagram-channel interface consumed from the host (§6.6): a
//! peer-connection object and its data channel, expressed as traits so the
//! state machine can be driven against an in-memory double without a real
//! ICE/SDP stack.

use async_trait::async_trait;

use crate::config::ChannelMode;
use crate::error::TransportError;

/// Connection-level state reported by the underlying peer-connection
/// library, independent of MXP's own [`crate::state::PeerState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceConnectionState {
    New,
    Checking,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// An opaque session description (SDP-shaped) handed between peers via
/// signaling. Kept as an owned blob — this crate never inspects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription(pub String);

/// An opaque ICE candidate, likewise routed but never inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceCandidate(pub String);

/// The host-provided peer-connection object: `createOffer`/`createAnswer`,
/// `setLocal/RemoteDescription`, `addIceCandidate`.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription, TransportError>;
    async fn create_answer(&self) -> Result<SessionDescription, TransportError>;
    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), TransportError>;
    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), TransportError>;
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError>;

    /// Open (or reuse) the `"mxp"` data channel in the given reliability
    /// mode. Resolves only once the channel has finished negotiating and is
    /// actually open — callers do not separately await an "open" event.
    async fn open_data_channel(&self, mode: ChannelMode) -> Result<Box<dyn DataChannel>, TransportError>;

    fn ice_state(&self) -> IceConnectionState;

    async fn close(&self);
}

/// A bidirectional, binary, ordered-or-unordered data channel. `recv` takes
/// `&self` (not `&mut self`) so a single handle can be shared between the
/// sender path and a dedicated receive-pump task.
#[async_trait]
pub trait DataChannel: Send + Sync {
    async fn send(&self, bytes: Vec<u8>) -> Result<(), TransportError>;

    /// Receive the next chunk, or `None` once the channel has closed.
    async fn recv(&self) -> Option<Vec<u8>>;

    async fn close(&self);

    fn is_open(&self) -> bool;
}
