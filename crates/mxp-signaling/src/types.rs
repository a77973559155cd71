//! Wire-shaped signaling messages (§4.6): offer/answer/candidate/hangup,
//! carrying an opaque blob supplied by the underlying peer-connection
//! library.

use serde::{Deserialize, Serialize};

/// What kind of session-description / ICE event a [`SignalMessage`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
    Hangup,
}

/// A single out-of-band signaling message routed between two local ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalMessage {
    pub kind: SignalKind,
    pub from: String,
    pub to: String,
    /// Opaque blob (SDP, ICE candidate, …) supplied by the underlying
    /// peer-connection library.
    pub payload: serde_json::Value,
}

impl SignalMessage {
    pub fn new(kind: SignalKind, from: impl Into<String>, to: impl Into<String>, payload: serde_json::Value) -> Self {
        SignalMessage { kind, from: from.into(), to: to.into(), payload }
    }

    /// True when this message should be accepted by a recipient whose local
    /// id is `local_id` — `to` matches exactly or is the broadcast wildcard.
    pub fn addressed_to(&self, local_id: &str) -> bool {
        self.to == local_id || self.to == "*"
    }
}
