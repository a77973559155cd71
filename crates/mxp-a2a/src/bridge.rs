//! A2A ↔ Frame bridge (C5): lossless mapping of messages/tasks/streams onto
//! MXP frames, via a small JSON envelope carried as the frame payload.

use mxp_core::{Frame, Kind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Message, Task};

pub const METHOD_MESSAGE_SEND: &str = "message/send";
pub const METHOD_MESSAGE_STREAM: &str = "message/stream";
pub const METHOD_TASKS_SEND: &str = "tasks/send";
pub const METHOD_TASKS_GET: &str = "tasks/get";
pub const METHOD_TASKS_CANCEL: &str = "tasks/cancel";

/// Errors raised while bridging a frame back to A2A semantics.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("malformed A2A envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),
    #[error("unknown A2A method: {0}")]
    UnknownMethod(String),
}

/// The JSON envelope carried inside a frame's payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    task: Option<Task>,
}

/// What `from_mxp` hands back to the caller.
#[derive(Debug, Clone)]
pub struct BridgedFrame {
    pub method: String,
    pub message: Option<Message>,
    pub task: Option<Task>,
    pub raw_payload: Vec<u8>,
}

fn infer_method(kind: Kind) -> &'static str {
    match kind {
        Kind::StreamOpen | Kind::StreamChunk | Kind::StreamClose => METHOD_MESSAGE_STREAM,
        _ => METHOD_MESSAGE_SEND,
    }
}

/// Encode `message` as a `Call` frame carrying a `message/send` envelope.
pub fn to_mxp(message: &Message) -> Frame {
    let envelope = Envelope {
        method: Some(METHOD_MESSAGE_SEND.to_string()),
        message: Some(message.clone()),
        task: None,
    };
    let payload = serde_json::to_vec(&envelope).expect("Envelope is always serializable");
    Frame::call(payload)
}

/// Encode `task` as a `Call` frame for one of the `tasks/*` methods.
/// `method` must be one of [`METHOD_TASKS_SEND`], [`METHOD_TASKS_GET`],
/// [`METHOD_TASKS_CANCEL`].
pub fn to_mxp_task_call(method: &str, task: &Task) -> Frame {
    let envelope = Envelope {
        method: Some(method.to_string()),
        message: None,
        task: Some(task.clone()),
    };
    let payload = serde_json::to_vec(&envelope).expect("Envelope is always serializable");
    Frame::call(payload)
}

/// Parse a frame's payload back into A2A semantics. If the envelope omits
/// `method`, it is inferred from the frame's kind.
pub fn from_mxp(frame: &Frame) -> Result<BridgedFrame, BridgeError> {
    let envelope: Envelope =
        serde_json::from_slice(&frame.payload).map_err(BridgeError::MalformedEnvelope)?;

    let method = envelope.method.unwrap_or_else(|| infer_method(frame.kind).to_string());

    Ok(BridgedFrame {
        method,
        message: envelope.message,
        task: envelope.task,
        raw_payload: frame.payload.clone(),
    })
}

/// `StreamOpen` whose `message_id` becomes the stream identifier.
pub fn to_mxp_stream_open(message: &Message) -> Frame {
    let envelope = Envelope {
        method: Some(METHOD_MESSAGE_STREAM.to_string()),
        message: Some(message.clone()),
        task: None,
    };
    let payload = serde_json::to_vec(&envelope).expect("Envelope is always serializable");
    Frame::stream_open(payload)
}

/// `StreamChunk` correlated to `open`'s `message_id` and sharing its
/// `trace_id`, carrying `text` as raw UTF-8 bytes (no JSON envelope).
pub fn to_mxp_stream_chunk(open: &Frame, text: &str) -> Frame {
    Frame::stream_chunk(open, text.as_bytes().to_vec())
}

/// `StreamClose` correlated to `open`'s `message_id` and sharing its
/// `trace_id`.
pub fn to_mxp_stream_close(open: &Frame) -> Frame {
    Frame::stream_close(open)
}

/// Structured error envelope: `{ "error": { "code": N, "message": S } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorBody {
    code: i64,
    message: String,
}

/// Build an `Error`-kind frame reporting a bridging failure back to `cause`'s
/// sender.
pub fn error_frame(cause: &Frame, code: i64, message: impl Into<String>) -> Frame {
    let envelope = ErrorEnvelope { error: ErrorBody { code, message: message.into() } };
    let payload = serde_json::to_vec(&envelope).expect("ErrorEnvelope is always serializable");
    Frame::respond_to(cause, Kind::Error, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mxp_core::{decode, encode};

    #[test]
    fn s5_message_send_round_trips_through_the_wire() {
        let msg = crate::model::Message::user_text("Search for Rust tutorials");
        let frame = to_mxp(&msg);
        let bytes = encode(&frame);
        let decoded = decode(&bytes).unwrap();
        let bridged = from_mxp(&decoded).unwrap();

        assert_eq!(bridged.method, METHOD_MESSAGE_SEND);
        let back = bridged.message.unwrap();
        assert_eq!(back.role, crate::model::Role::User);
        assert_eq!(back.text_content(), "Search for Rust tutorials");
    }

    #[test]
    fn method_is_inferred_when_envelope_omits_it() {
        let frame = Frame::call(b"{}".to_vec());
        let bridged = from_mxp(&frame).unwrap();
        assert_eq!(bridged.method, METHOD_MESSAGE_SEND);

        let open = Frame::stream_open(b"{}".to_vec());
        let bridged = from_mxp(&open).unwrap();
        assert_eq!(bridged.method, METHOD_MESSAGE_STREAM);
    }

    #[test]
    fn s4_stream_helpers_share_the_openers_message_id_and_trace_id() {
        let msg = crate::model::Message::user_text("chunk 1");
        let open = to_mxp_stream_open(&msg);
        let chunk = to_mxp_stream_chunk(&open, "chunk 1");
        let close = to_mxp_stream_close(&open);

        assert_eq!(chunk.correlation_id, open.message_id);
        assert_eq!(close.correlation_id, open.message_id);
        assert_eq!(chunk.trace_id, open.trace_id);
        assert_eq!(close.trace_id, open.trace_id);
    }

    #[test]
    fn malformed_envelope_is_reported_as_bridge_error() {
        let frame = Frame::call(b"not json".to_vec());
        assert!(matches!(from_mxp(&frame), Err(BridgeError::MalformedEnvelope(_))));
    }

    #[test]
    fn error_frame_carries_code_and_message_and_propagates_trace() {
        let cause = Frame::call(b"{}".to_vec());
        let err = error_frame(&cause, -32001, "task not found");
        assert_eq!(err.kind, Kind::Error);
        assert_eq!(err.correlation_id, cause.message_id);
        assert_eq!(err.trace_id, cause.trace_id);

        let envelope: ErrorEnvelope = serde_json::from_slice(&err.payload).unwrap();
        assert_eq!(envelope.error.code, -32001);
        assert_eq!(envelope.error.message, "task not found");
    }

    #[test]
    fn task_call_round_trips() {
        let task = crate::model::Task::new("ctx-1");
        let frame = to_mxp_task_call(METHOD_TASKS_GET, &task);
        let bridged = from_mxp(&frame).unwrap();
        assert_eq!(bridged.method, METHOD_TASKS_GET);
        assert_eq!(bridged.task.unwrap(), task);
    }
}
