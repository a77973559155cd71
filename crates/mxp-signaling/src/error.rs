use thiserror::Error;

/// Errors a signaling provider can surface from `send` or its background
/// connection task. Propagated unchanged to the caller of `Peer::connect`.
#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("signaling socket is not connected")]
    NotConnected,

    #[error("signaling socket reconnect attempts exhausted ({attempts} tries)")]
    ReconnectExhausted { attempts: u32 },

    #[error("signaling transport error: {0}")]
    Transport(String),

    #[error("no handler registered for peer {0}")]
    UnknownRecipient(String),
}
