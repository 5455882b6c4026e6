use async_trait::async_trait;
use thiserror::Error;

use sundial_core::{LookupKey, ThreadId};

pub mod memory;
pub mod thread_link;

pub use memory::InMemoryThreadLinkRepository;
pub use thread_link::SqlThreadLinkRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Persistent mapping from a durable lookup key to its conversation thread.
/// The store is the single source of truth for thread reuse across process
/// restarts: at most one row per key.
#[async_trait]
pub trait ThreadLinkRepository: Send + Sync {
    async fn find(&self, key: &LookupKey) -> Result<Option<ThreadId>, RepositoryError>;
    async fn save(&self, key: &LookupKey, thread_id: &ThreadId) -> Result<(), RepositoryError>;
}
