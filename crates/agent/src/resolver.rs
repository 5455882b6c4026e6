use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use sundial_core::{LookupKey, ThreadId};
use sundial_db::repositories::{RepositoryError, ThreadLinkRepository};
use sundial_openai::{ApiError, AssistantsApi};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("lookup store failed: {0}")]
    Store(#[from] RepositoryError),
    #[error("stored thread `{thread_id}` could not be fetched: {source}")]
    ThreadFetch { thread_id: String, source: ApiError },
    #[error("thread creation failed: {0}")]
    ThreadCreate(ApiError),
}

/// Maps a durable lookup key to its conversation thread, creating and
/// persisting a new one on first contact. The store row is the only record
/// of the association, so the same key always lands on the same thread.
pub struct ThreadResolver {
    store: Arc<dyn ThreadLinkRepository>,
    api: Arc<dyn AssistantsApi>,
}

impl ThreadResolver {
    pub fn new(store: Arc<dyn ThreadLinkRepository>, api: Arc<dyn AssistantsApi>) -> Self {
        Self { store, api }
    }

    pub async fn resolve_or_create(&self, key: &LookupKey) -> Result<ThreadId, ResolveError> {
        if let Some(thread_id) = self.store.find(key).await? {
            return match self.api.get_thread(&thread_id).await {
                Ok(confirmed) => {
                    debug!(lookup_key = %key, thread_id = %confirmed, "reusing linked thread");
                    Ok(confirmed)
                }
                // A dangling link (thread deleted remotely) is reported, not
                // silently replaced: creating a fresh thread here would fork
                // the user's conversation history without telling anyone.
                Err(source) => {
                    Err(ResolveError::ThreadFetch { thread_id: thread_id.0, source })
                }
            };
        }

        let thread_id = self.api.create_thread().await.map_err(ResolveError::ThreadCreate)?;
        // Creation and persistence are not transactional. A crash between the
        // two leaks an orphaned remote thread; the store never holds a key
        // without a created thread behind it.
        self.store.save(key, &thread_id).await?;
        info!(lookup_key = %key, thread_id = %thread_id, "created and linked new thread");

        Ok(thread_id)
    }
}
