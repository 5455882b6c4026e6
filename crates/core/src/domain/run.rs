use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::thread::ThreadId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote run lifecycle states. `Unknown` absorbs wire values introduced by
/// the service after this crate was built; they are treated as non-terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Terminal states: no further polling will change the outcome.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled | Self::Expired)
    }

    /// Terminal states other than success.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled | Self::Expired)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One asynchronous execution of an assistant against a thread. Pending tool
/// calls are populated only while the run is stalled in `requires_action`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub thread_id: ThreadId,
    pub status: RunStatus,
    pub pending_tool_calls: Vec<ToolCallRequest>,
}

/// Tool-call argument payload as it arrives on the wire: either already a
/// JSON object or a JSON-encoded string of one. Both forms must decode to
/// equal structured values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolArguments {
    Parsed(Map<String, Value>),
    Encoded(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArgumentDecodeError {
    #[error("tool arguments are not valid JSON: {0}")]
    Malformed(String),
    #[error("tool arguments decoded to a non-object value")]
    NotAnObject,
}

impl ToolArguments {
    pub fn decode(&self) -> Result<Map<String, Value>, ArgumentDecodeError> {
        match self {
            Self::Parsed(map) => Ok(map.clone()),
            Self::Encoded(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(_) => Err(ArgumentDecodeError::NotAnObject),
                Err(error) => Err(ArgumentDecodeError::Malformed(error.to_string())),
            },
        }
    }
}

/// A request, emitted by the remote run, to invoke a named local operation.
/// Consumed exactly once per `requires_action` cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub call_id: String,
    pub name: String,
    pub arguments: ToolArguments,
}

/// The output submitted back for one pending call id. The remote service
/// requires the submitted batch to cover every pending id exactly once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub call_id: String,
    pub output: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ArgumentDecodeError, RunStatus, ToolArguments};

    #[test]
    fn terminal_classification_covers_every_status() {
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Cancelled.is_terminal());
        assert!(RunStatus::Expired.is_terminal());
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::InProgress.is_terminal());
        assert!(!RunStatus::RequiresAction.is_terminal());
        assert!(!RunStatus::Cancelling.is_terminal());
        assert!(!RunStatus::Unknown.is_terminal());

        assert!(!RunStatus::Completed.is_terminal_failure());
        assert!(RunStatus::Expired.is_terminal_failure());
    }

    #[test]
    fn unknown_wire_status_decodes_without_error() {
        let status: RunStatus = serde_json::from_str("\"incomplete\"").expect("decode status");
        assert_eq!(status, RunStatus::Unknown);
        assert!(!status.is_terminal());
    }

    #[test]
    fn parsed_and_encoded_argument_forms_decode_equal() {
        let parsed = ToolArguments::Parsed(
            json!({"calendar_id": "primary", "max_results": 10})
                .as_object()
                .expect("object literal")
                .clone(),
        );
        let encoded =
            ToolArguments::Encoded(r#"{"calendar_id": "primary", "max_results": 10}"#.to_string());

        assert_eq!(parsed.decode().expect("parsed"), encoded.decode().expect("encoded"));
    }

    #[test]
    fn malformed_encoded_arguments_are_rejected() {
        let garbled = ToolArguments::Encoded("{not json".to_string());
        assert!(matches!(garbled.decode(), Err(ArgumentDecodeError::Malformed(_))));

        let scalar = ToolArguments::Encoded("42".to_string());
        assert_eq!(scalar.decode(), Err(ArgumentDecodeError::NotAnObject));
    }

    #[test]
    fn wire_form_of_arguments_round_trips() {
        let original = ToolArguments::Encoded(r#"{"event_id":"e1"}"#.to_string());
        let serialized = serde_json::to_string(&original).expect("serialize");
        let restored: ToolArguments = serde_json::from_str(&serialized).expect("deserialize");
        assert_eq!(original, restored);
    }
}
