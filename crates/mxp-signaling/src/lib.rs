//! Pluggable signaling abstraction for MXP peer connections (§4.6).
//!
//! A [`SignalingProvider`] carries offer/answer/ICE-candidate exchange out
//! of band from the MXP frame codec itself; [`crate::peer`] (in `mxp-peer`)
//! drives one per [`crate::peer::Peer`] without caring which backend is in
//! use.

mod broadcast;
mod error;
mod manual;
mod memory_hub;
mod provider;
mod socket;
mod types;

pub use broadcast::{BroadcastBus, BroadcastProvider};
pub use error::SignalingError;
pub use manual::ManualProvider;
pub use memory_hub::{MemoryHub, MemoryHubProvider};
pub use provider::{SignalingProvider, EVENT_CHANNEL_CAPACITY};
pub use socket::{ReconnectPolicy, SocketRelay};
pub use types::{SignalKind, SignalMessage};
