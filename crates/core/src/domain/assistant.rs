use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Immutable assistant definition: created remotely once, then referenced by
/// id. Instructions carry the date they were rendered with; a reused
/// definition keeps that date until replaced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssistantSpec {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub tools: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssistantId(pub String);

impl std::fmt::Display for AssistantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
