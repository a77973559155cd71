// Copyright (c) 2026 MXP contributors
//
// SPDX-License-Identifier: MIT
//! Translates JSON-RPC requests into A2A bridge calls and back (§4.11).
//!
//! This crate owns no transport of its own: a [`FrameCaller`] is supplied by
//! the host, carrying a `Call` frame to some peer and returning its
//! `Response`/`Error` frame. Wiring that to an actual [`mxp_peer::Dispatcher`]
//! is the host's job, not this crate's.

use async_trait::async_trait;
use mxp_a2a::{
    from_mxp, to_mxp, to_mxp_task_call, Message, Task, METHOD_MESSAGE_SEND, METHOD_TASKS_CANCEL,
    METHOD_TASKS_GET,
};
use mxp_core::{Frame, Kind};
use serde::Deserialize;
use serde_json::Value;

use crate::error::GatewayError;
use crate::rpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

pub const METHOD_TASKS_RESUBSCRIBE: &str = "tasks/resubscribe";
pub const METHOD_PUSH_NOTIFICATION_CONFIG_SET: &str = "tasks/pushNotificationConfig/set";

/// Carries a single `Call` frame to a peer and returns its reply. Supplied
/// by the host; this crate never opens a connection itself.
#[async_trait]
pub trait FrameCaller: Send + Sync {
    async fn call(&self, frame: Frame) -> Result<Frame, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: i64,
    message: String,
}

/// Dispatch one JSON-RPC request, returning the response to write back to
/// the caller (never an `Err` — all failure paths become a JSON-RPC error
/// object inside an `Ok` response, per the protocol).
pub async fn dispatch(request: JsonRpcRequest, caller: &dyn FrameCaller) -> JsonRpcResponse {
    let id = request.id.clone();
    match dispatch_inner(request, caller).await {
        Ok(result) => JsonRpcResponse::ok(id, result),
        Err(err) => JsonRpcResponse::err(id, JsonRpcError::from(&err)),
    }
}

async fn dispatch_inner(request: JsonRpcRequest, caller: &dyn FrameCaller) -> Result<Value, GatewayError> {
    match request.method.as_str() {
        METHOD_MESSAGE_SEND => {
            let message: Message = serde_json::from_value(request.params).map_err(|e| {
                GatewayError::InvalidParams { method: request.method.clone(), reason: e.to_string() }
            })?;
            let frame = to_mxp(&message);
            let reply = caller.call(frame).await?;
            frame_to_result(&reply)
        }
        METHOD_TASKS_GET | METHOD_TASKS_CANCEL => {
            let params: TaskRefParams = serde_json::from_value(request.params).map_err(|e| {
                GatewayError::InvalidParams { method: request.method.clone(), reason: e.to_string() }
            })?;
            let task = Task::new(&params.id);
            let method = request.method.as_str();
            let frame = to_mxp_task_call(method, &task);
            let reply = caller.call(frame).await?;
            frame_to_result(&reply)
        }
        METHOD_TASKS_RESUBSCRIBE => Err(GatewayError::UnsupportedOperation(METHOD_TASKS_RESUBSCRIBE.to_string())),
        METHOD_PUSH_NOTIFICATION_CONFIG_SET => Err(GatewayError::PushNotificationsUnsupported),
        other => Err(GatewayError::UnknownMethod(other.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct TaskRefParams {
    id: String,
}

fn frame_to_result(frame: &Frame) -> Result<Value, GatewayError> {
    if frame.kind == Kind::Error {
        let envelope: ErrorEnvelope = serde_json::from_slice(&frame.payload)
            .map_err(|e| GatewayError::InvalidParams { method: "<reply>".into(), reason: e.to_string() })?;
        return Err(match envelope.error.code {
            code if code == i64::from(crate::rpc::TASK_NOT_FOUND) => GatewayError::TaskNotFound(envelope.error.message),
            code if code == i64::from(crate::rpc::TASK_NOT_CANCELABLE) => {
                GatewayError::TaskNotCancelable(envelope.error.message)
            }
            _ => GatewayError::InvalidParams { method: "<reply>".into(), reason: envelope.error.message },
        });
    }
    let bridged = from_mxp(frame)?;
    if let Some(message) = bridged.message {
        return Ok(serde_json::to_value(message).expect("Message always serializes"));
    }
    if let Some(task) = bridged.task {
        return Ok(serde_json::to_value(task).expect("Task always serializes"));
    }
    Ok(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mxp_a2a::Message;
    use mxp_core::decode;

    struct EchoCaller;

    #[async_trait]
    impl FrameCaller for EchoCaller {
        async fn call(&self, frame: Frame) -> Result<Frame, GatewayError> {
            let bridged = from_mxp(&frame).map_err(GatewayError::from)?;
            let message = bridged.message.unwrap_or_else(|| Message::agent_text("echo"));
            Ok(to_mxp(&message))
        }
    }

    /// Answers every call with a `TASK_NOT_CANCELABLE` error frame, as a
    /// peer would for a `tasks/cancel` call against a terminal task.
    struct TaskNotCancelableCaller;

    #[async_trait]
    impl FrameCaller for TaskNotCancelableCaller {
        async fn call(&self, frame: Frame) -> Result<Frame, GatewayError> {
            Ok(mxp_a2a::error_frame(&frame, crate::rpc::TASK_NOT_CANCELABLE as i64, "task already completed"))
        }
    }

    #[tokio::test]
    async fn message_send_round_trips_through_dispatch() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::json!(1),
            method: METHOD_MESSAGE_SEND.into(),
            params: serde_json::to_value(Message::user_text("hi")).unwrap(),
        };
        let response = dispatch(request, &EchoCaller).await;
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert!(result.get("parts").is_some());
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::json!(2),
            method: "nonsense/method".into(),
            params: serde_json::Value::Null,
        };
        let response = dispatch(request, &EchoCaller).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, crate::rpc::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn push_notification_config_is_reported_unsupported() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::json!(3),
            method: METHOD_PUSH_NOTIFICATION_CONFIG_SET.into(),
            params: serde_json::Value::Null,
        };
        let response = dispatch(request, &EchoCaller).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, crate::rpc::PUSH_NOTIFICATIONS_NOT_SUPPORTED);
    }

    #[tokio::test]
    async fn cancel_against_a_terminal_task_is_reported_not_cancelable() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: serde_json::json!(4),
            method: METHOD_TASKS_CANCEL.into(),
            params: serde_json::json!({ "id": "task-1" }),
        };
        let response = dispatch(request, &TaskNotCancelableCaller).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, crate::rpc::TASK_NOT_CANCELABLE);
    }

    #[test]
    fn decode_is_available_for_downstream_frame_inspection() {
        let frame = to_mxp(&Message::user_text("x"));
        let bytes = mxp_core::encode(&frame);
        assert!(decode(&bytes).is_ok());
    }
}
