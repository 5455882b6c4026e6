use std::collections::HashMap;

use tokio::sync::RwLock;

use sundial_core::{LookupKey, ThreadId};

use super::{RepositoryError, ThreadLinkRepository};

#[derive(Default)]
pub struct InMemoryThreadLinkRepository {
    links: RwLock<HashMap<String, ThreadId>>,
}

#[async_trait::async_trait]
impl ThreadLinkRepository for InMemoryThreadLinkRepository {
    async fn find(&self, key: &LookupKey) -> Result<Option<ThreadId>, RepositoryError> {
        let links = self.links.read().await;
        Ok(links.get(&key.0).cloned())
    }

    async fn save(&self, key: &LookupKey, thread_id: &ThreadId) -> Result<(), RepositoryError> {
        let mut links = self.links.write().await;
        links.insert(key.0.clone(), thread_id.clone());
        Ok(())
    }
}
