//! The signaling provider seam (§4.6).
//!
//! Per the Design Notes (§9), delivery uses a single typed channel rather
//! than an open string-keyed handler map: `subscribe` hands back a boxed
//! stream of [`SignalMessage`] rather than accepting an arbitrary closure
//! keyed by event name.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::SignalingError;
use crate::types::SignalMessage;

/// Capacity of the broadcast channel each provider publishes incoming
/// signaling messages on.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Anything that can asynchronously exchange [`SignalMessage`]s with a
/// remote party, out of band from the frame codec.
#[async_trait]
pub trait SignalingProvider: Send + Sync {
    /// Send a signaling message.
    async fn send(&self, msg: SignalMessage) -> Result<(), SignalingError>;

    /// Subscribe to incoming signaling messages addressed to this provider.
    /// A boxed stream rather than a concrete channel type so different
    /// backends can filter/transform without changing the trait.
    fn subscribe(&self) -> BoxStream<'static, SignalMessage>;

    /// This provider's own local id (used as `from` on outgoing messages).
    fn local_id(&self) -> &str;
}
