//! A2A data model (C4): Role/Part/Message/Task/Artifact/AgentCard.
//!
//! Every type here round-trips through a JSON-shaped value with lowerCamelCase
//! field names, optional fields omitted when empty, and tolerates unknown
//! keys on the way in (no type here sets `deny_unknown_fields`).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::new_strong_id;

/// Arbitrary JSON-compatible key/value metadata attached to a [`Message`].
pub type Metadata = HashMap<String, serde_json::Value>;

fn metadata_is_empty(m: &Metadata) -> bool {
    m.is_empty()
}

/// Error surfaced by `to_json`/`from_json` round-trip helpers.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to serialize to JSON: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to deserialize from JSON: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// Who authored a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// A single content part inside a [`Message`] or [`Artifact`].
///
/// Exactly one of the three content slots (text / file / data) is populated;
/// the `kind` tag (serialized as `"kind"`) reflects which.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Part {
    Text {
        text: String,
    },
    File {
        mime_type: String,
        #[serde(flatten)]
        content: FileContent,
    },
    Data {
        data: serde_json::Value,
    },
}

/// The populated half of a `File` part: either inline base64 bytes or a URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileContent {
    Inline { bytes: String },
    Uri { uri: String },
}

impl Part {
    pub fn text(s: impl Into<String>) -> Self {
        Part::Text { text: s.into() }
    }

    pub fn file_inline(mime_type: impl Into<String>, base64: impl Into<String>) -> Self {
        Part::File {
            mime_type: mime_type.into(),
            content: FileContent::Inline { bytes: base64.into() },
        }
    }

    pub fn file_uri(mime_type: impl Into<String>, uri: impl Into<String>) -> Self {
        Part::File {
            mime_type: mime_type.into(),
            content: FileContent::Uri { uri: uri.into() },
        }
    }

    pub fn data(value: serde_json::Value) -> Self {
        Part::Data { data: value }
    }

    /// The text, if this is a `Text` part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// A single turn in a conversation: who said it, and what it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
    pub context_id: String,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "metadata_is_empty")]
    pub metadata: Metadata,
}

impl Message {
    /// Build a message with fresh `context_id`/`message_id`.
    pub fn create(role: Role, parts: Vec<Part>) -> Self {
        Message {
            role,
            parts,
            context_id: new_strong_id(),
            message_id: new_strong_id(),
            task_id: None,
            metadata: Metadata::new(),
        }
    }

    pub fn user_text(s: impl Into<String>) -> Self {
        Message::create(Role::User, vec![Part::text(s)])
    }

    pub fn agent_text(s: impl Into<String>) -> Self {
        Message::create(Role::Agent, vec![Part::text(s)])
    }

    /// Logically modified copy with a different `context_id`.
    pub fn with_context(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = context_id.into();
        self
    }

    /// Logically modified copy linked to a [`Task`].
    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Concatenation of the text of every `Text` part, in order. Empty
    /// string if the message has no text parts.
    pub fn text_content(&self) -> String {
        self.parts.iter().filter_map(Part::as_text).collect::<Vec<_>>().join("")
    }

    pub fn to_json(&self) -> Result<serde_json::Value, ModelError> {
        serde_json::to_value(self).map_err(ModelError::Serialize)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, ModelError> {
        serde_json::from_value(value).map_err(ModelError::Deserialize)
    }
}

/// Lifecycle state of a [`Task`]. `Completed`/`Failed`/`Canceled` are
/// terminal; transitions out of a terminal state are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Failed,
    Canceled,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed | TaskState::Canceled)
    }
}

/// A task's current status, stamped with the time of the last transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Error returned when a [`Task`] transition is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("cannot transition out of terminal state {0:?}")]
    TerminalTransition(TaskState),
}

/// A unit of work tracked between two agents, with its history and any
/// artifacts produced so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub context_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub history: Vec<Message>,
}

impl Task {
    /// A fresh task in `Submitted` state.
    pub fn new(context_id: impl Into<String>) -> Self {
        Task {
            id: new_strong_id(),
            context_id: context_id.into(),
            status: TaskStatus { state: TaskState::Submitted, message: None, timestamp: Utc::now() },
            artifacts: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Replace the status and stamp the transition time. Rejected if the
    /// task is already in a terminal state.
    pub fn set_status(&mut self, state: TaskState, message: Option<String>) -> Result<(), TaskError> {
        if self.status.state.is_terminal() {
            return Err(TaskError::TerminalTransition(self.status.state));
        }
        self.status = TaskStatus { state, message, timestamp: Utc::now() };
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.status.state.is_terminal()
    }

    pub fn needs_input(&self) -> bool {
        self.status.state == TaskState::InputRequired
    }

    /// Append an artifact. Returns `true` if the task was already in a
    /// terminal state — permitted (late-delivered artifacts), but the
    /// caller should flag this case.
    pub fn add_artifact(&mut self, artifact: Artifact) -> bool {
        let was_terminal = self.is_complete();
        self.artifacts.push(artifact);
        was_terminal
    }

    pub fn to_json(&self) -> Result<serde_json::Value, ModelError> {
        serde_json::to_value(self).map_err(ModelError::Serialize)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, ModelError> {
        serde_json::from_value(value).map_err(ModelError::Deserialize)
    }
}

/// A named output produced while working a [`Task`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub artifact_id: String,
    pub name: String,
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, parts: Vec<Part>) -> Self {
        Artifact {
            artifact_id: new_strong_id(),
            name: name.into(),
            parts,
            description: None,
            metadata: None,
        }
    }
}

/// Fixed A2A protocol version this crate speaks.
pub const PROTOCOL_VERSION: &str = "0.3.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub push_notifications: bool,
    #[serde(default)]
    pub state_transition_history: bool,
    #[serde(default)]
    pub mxp_transport: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mxp_endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub input_modes: Vec<String>,
    #[serde(default)]
    pub output_modes: Vec<String>,
}

/// An extra transport the agent is reachable over, besides the primary `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportInterface {
    pub transport: String,
    pub url: String,
}

/// The agent discovery document (§6.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub protocol_version: String,
    pub name: String,
    pub description: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub capabilities: AgentCapabilities,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
    #[serde(default)]
    pub default_input_modes: Vec<String>,
    #[serde(default)]
    pub default_output_modes: Vec<String>,
    #[serde(default)]
    pub additional_interfaces: Vec<TransportInterface>,
    #[serde(default)]
    pub security_schemes: Vec<serde_json::Value>,
}

impl AgentCard {
    pub fn new(name: impl Into<String>, description: impl Into<String>, url: impl Into<String>) -> Self {
        AgentCard {
            protocol_version: PROTOCOL_VERSION.to_string(),
            name: name.into(),
            description: description.into(),
            url: url.into(),
            provider: None,
            version: None,
            capabilities: AgentCapabilities::default(),
            skills: Vec::new(),
            default_input_modes: Vec::new(),
            default_output_modes: Vec::new(),
            additional_interfaces: Vec::new(),
            security_schemes: Vec::new(),
        }
    }

    /// Advertise the MXP transport at `endpoint` (an `mxp://…` URL),
    /// mirroring the entry into `additionalInterfaces` per §6.5.
    pub fn with_mxp_transport(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.capabilities.mxp_transport = true;
        self.capabilities.mxp_endpoint = Some(endpoint.clone());
        self.additional_interfaces.push(TransportInterface { transport: "mxp".to_string(), url: endpoint });
        self
    }

    pub fn to_json(&self) -> Result<serde_json::Value, ModelError> {
        serde_json::to_value(self).map_err(ModelError::Serialize)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, ModelError> {
        serde_json::from_value(value).map_err(ModelError::Deserialize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_round_trips_through_json() {
        let msg = Message::user_text("Search for Rust tutorials").with_task("task-1");
        let json = msg.to_json().unwrap();
        let back = Message::from_json(json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn message_tolerates_unknown_keys() {
        let msg = Message::user_text("hi");
        let mut json = msg.to_json().unwrap();
        json.as_object_mut().unwrap().insert("somethingNew".into(), serde_json::json!(42));
        let back = Message::from_json(json).unwrap();
        assert_eq!(back.text_content(), "hi");
    }

    #[test]
    fn text_content_concatenates_text_parts_in_order() {
        let msg = Message::create(Role::User, vec![Part::text("a"), Part::data(serde_json::json!({})), Part::text("b")]);
        assert_eq!(msg.text_content(), "ab");
    }

    #[test]
    fn text_content_is_empty_with_no_text_parts() {
        let msg = Message::create(Role::User, vec![Part::data(serde_json::json!({}))]);
        assert_eq!(msg.text_content(), "");
    }

    #[test]
    fn s7_task_lifecycle() {
        let mut task = Task::new("ctx-1");
        assert_eq!(task.status.state, TaskState::Submitted);
        assert!(!task.is_complete());

        task.set_status(TaskState::Working, None).unwrap();
        task.set_status(TaskState::Completed, None).unwrap();
        assert!(task.is_complete());
    }

    #[test]
    fn task_rejects_transition_out_of_terminal_state() {
        let mut task = Task::new("ctx-1");
        task.set_status(TaskState::Completed, None).unwrap();
        let err = task.set_status(TaskState::Working, None).unwrap_err();
        assert_eq!(err, TaskError::TerminalTransition(TaskState::Completed));
    }

    #[test]
    fn task_round_trips_through_json() {
        let mut task = Task::new("ctx-1");
        task.history.push(Message::user_text("hello"));
        let json = task.to_json().unwrap();
        let back = Task::from_json(json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn needs_input_only_in_input_required_state() {
        let mut task = Task::new("ctx-1");
        assert!(!task.needs_input());
        task.set_status(TaskState::InputRequired, Some("clarify".into())).unwrap();
        assert!(task.needs_input());
    }

    #[test]
    fn agent_card_round_trips_and_advertises_mxp() {
        let card = AgentCard::new("Alice", "an agent", "https://alice.example")
            .with_mxp_transport("mxp://alice.example:9001");
        let json = card.to_json().unwrap();
        let back = AgentCard::from_json(json).unwrap();
        assert_eq!(back, card);
        assert_eq!(back.protocol_version, PROTOCOL_VERSION);
        assert!(back.capabilities.mxp_transport);
        assert_eq!(back.additional_interfaces.len(), 1);
    }

    #[test]
    fn exactly_one_content_slot_on_file_part() {
        let p = Part::file_inline("image/png", "YmFzZTY0");
        match p {
            Part::File { content: FileContent::Inline { bytes }, .. } => assert_eq!(bytes, "YmFzZTY0"),
            _ => panic!("expected inline file part"),
        }
    }
}
