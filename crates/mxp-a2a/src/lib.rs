//! A2A semantic layer: the message/task/artifact model (C4) and its
//! lossless mapping onto MXP frames (C5).

mod bridge;
mod ids;
mod model;

pub use bridge::{
    error_frame, from_mxp, to_mxp, to_mxp_stream_chunk, to_mxp_stream_close, to_mxp_stream_open,
    to_mxp_task_call, BridgeError, BridgedFrame, METHOD_MESSAGE_SEND, METHOD_MESSAGE_STREAM,
    METHOD_TASKS_CANCEL, METHOD_TASKS_GET, METHOD_TASKS_SEND,
};
pub use ids::new_strong_id;
pub use model::{
    AgentCapabilities, AgentCard, AgentSkill, Artifact, FileContent, Message, Metadata, ModelError,
    Part, Role, Task, TaskError, TaskState, TaskStatus, TransportInterface, PROTOCOL_VERSION,
};
