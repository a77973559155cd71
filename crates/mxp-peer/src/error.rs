use thiserror::Error;

/// Transport-layer errors (§7), surfaced synchronously from `send`/`connect`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("data channel is not open")]
    ChannelClosed,

    #[error("unknown peer {0}")]
    UnknownPeer(String),

    #[error("peer {0} is not connected")]
    NotConnected(String),

    #[error("handshake with peer {0} failed")]
    HandshakeFailed(String),

    #[error("connecting to peer {0} timed out")]
    Timeout(String),

    #[error(transparent)]
    Signaling(#[from] mxp_signaling::SignalingError),
}
