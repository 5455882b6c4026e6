//! Remote assistants-service integration.
//!
//! Everything the rest of the system knows about the remote job service is
//! the [`AssistantsApi`] trait; the [`HttpAssistantsClient`] is the one
//! production implementation. Test doubles live with the code that drives
//! them.

pub mod client;
pub mod error;
pub mod types;

pub use client::{AssistantsApi, HttpAssistantsClient};
pub use error::ApiError;
