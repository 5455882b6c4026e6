//! Agent runtime - thread resolution, run launching, and run resolution
//!
//! This crate drives one conversational request end to end:
//! 1. **Thread Resolution** (`resolver`) - find or create the durable thread
//!    for a lookup key
//! 2. **Run Launch** (`launcher`) - render the assistant definition for
//!    today's date, append the user message, start the run
//! 3. **Run Resolution** (`engine`) - poll the run, dispatch requested tool
//!    calls through the registry, submit outputs, return the final reply
//! 4. **Containment** (`orchestrator`) - one failure boundary per request so
//!    the front end sees final text or nothing, never a raw fault
//!
//! # Key Types
//!
//! - `RequestOrchestrator` - the single `handle one user request` entry point
//! - `RunResolutionEngine` / `PollPolicy` - the polling state machine
//! - `Tool` / `ToolRegistry` - the closed set of locally callable operations
//!
//! # Contract
//!
//! The remote service requires one submitted output per pending tool call id.
//! The engine always satisfies that, synthesizing an error-text output when a
//! tool is unknown or fails, so a stalled run can always resume.

pub mod engine;
pub mod launcher;
pub mod orchestrator;
pub mod registry;
pub mod resolver;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use engine::{PollPolicy, RunFailure, RunResolutionEngine};
pub use launcher::{JobLauncher, LaunchError};
pub use orchestrator::{AgentError, RequestOrchestrator};
pub use registry::{Tool, ToolRegistry};
pub use resolver::{ResolveError, ThreadResolver};
