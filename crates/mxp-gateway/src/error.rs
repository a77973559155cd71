// Copyright (c) 2026 MXP contributors
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

use crate::rpc::{
    JsonRpcError, INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND, PUSH_NOTIFICATIONS_NOT_SUPPORTED,
    TASK_NOT_CANCELABLE, TASK_NOT_FOUND, UNSUPPORTED_OPERATION,
};

/// Errors raised while dispatching a JSON-RPC request onto the A2A bridge
/// (§4.11). Mapped to a [`JsonRpcError`] before leaving this crate.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("invalid params for {method}: {reason}")]
    InvalidParams { method: String, reason: String },

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("task not cancelable: {0}")]
    TaskNotCancelable(String),

    #[error("push notifications are not supported by this gateway")]
    PushNotificationsUnsupported,

    #[error("{0} is not implemented by this gateway")]
    UnsupportedOperation(String),

    #[error(transparent)]
    Bridge(#[from] mxp_a2a::BridgeError),

    #[error(transparent)]
    Transport(#[from] mxp_peer::TransportError),
}

impl From<&GatewayError> for JsonRpcError {
    fn from(err: &GatewayError) -> Self {
        match err {
            GatewayError::UnknownMethod(m) => JsonRpcError::new(METHOD_NOT_FOUND, format!("unknown method: {m}")),
            GatewayError::InvalidParams { method, reason } => {
                JsonRpcError::new(INVALID_PARAMS, format!("invalid params for {method}: {reason}"))
            }
            GatewayError::TaskNotFound(id) => JsonRpcError::new(TASK_NOT_FOUND, format!("task not found: {id}")),
            GatewayError::TaskNotCancelable(id) => {
                JsonRpcError::new(TASK_NOT_CANCELABLE, format!("task not cancelable: {id}"))
            }
            GatewayError::PushNotificationsUnsupported => {
                JsonRpcError::new(PUSH_NOTIFICATIONS_NOT_SUPPORTED, err.to_string())
            }
            GatewayError::UnsupportedOperation(_) => JsonRpcError::new(UNSUPPORTED_OPERATION, err.to_string()),
            GatewayError::Bridge(e) => JsonRpcError::new(INTERNAL_ERROR, e.to_string()),
            GatewayError::Transport(e) => JsonRpcError::new(INTERNAL_ERROR, e.to_string()),
        }
    }
}
