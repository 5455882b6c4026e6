pub mod config;
pub mod domain;
pub mod errors;

pub use domain::assistant::{AssistantId, AssistantSpec};
pub use domain::run::{
    ArgumentDecodeError, Run, RunId, RunStatus, ToolArguments, ToolCallRequest, ToolCallResult,
};
pub use domain::thread::{LookupKey, MessageRole, ThreadId, ThreadMessage};
pub use errors::{ApplicationError, InterfaceError};
