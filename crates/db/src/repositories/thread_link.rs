use sqlx::Row;

use sundial_core::{LookupKey, ThreadId};

use super::{RepositoryError, ThreadLinkRepository};
use crate::DbPool;

pub struct SqlThreadLinkRepository {
    pool: DbPool,
}

impl SqlThreadLinkRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ThreadLinkRepository for SqlThreadLinkRepository {
    async fn find(&self, key: &LookupKey) -> Result<Option<ThreadId>, RepositoryError> {
        let row = sqlx::query("SELECT thread_id FROM thread_links WHERE lookup_key = ?")
            .bind(&key.0)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| ThreadId(row.get::<String, _>("thread_id"))))
    }

    async fn save(&self, key: &LookupKey, thread_id: &ThreadId) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO thread_links (lookup_key, thread_id) VALUES (?, ?)
             ON CONFLICT(lookup_key) DO UPDATE SET thread_id = excluded.thread_id",
        )
        .bind(&key.0)
        .bind(&thread_id.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sundial_core::{LookupKey, ThreadId};

    use super::SqlThreadLinkRepository;
    use crate::migrations::run_pending;
    use crate::repositories::ThreadLinkRepository;
    use crate::connect_with_settings;

    async fn repo() -> SqlThreadLinkRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrate");
        SqlThreadLinkRepository::new(pool)
    }

    #[tokio::test]
    async fn absent_key_finds_nothing() {
        let repo = repo().await;
        let found = repo.find(&LookupKey("nobody".to_string())).await.expect("find");
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn save_then_find_round_trips() {
        let repo = repo().await;
        let key = LookupKey("U1".to_string());
        let thread = ThreadId("T1".to_string());

        repo.save(&key, &thread).await.expect("save");
        let found = repo.find(&key).await.expect("find");

        assert_eq!(found, Some(thread));
    }

    #[tokio::test]
    async fn saving_twice_keeps_one_row_per_key() {
        let repo = repo().await;
        let key = LookupKey("U1".to_string());

        repo.save(&key, &ThreadId("T1".to_string())).await.expect("first save");
        repo.save(&key, &ThreadId("T2".to_string())).await.expect("second save");

        let found = repo.find(&key).await.expect("find");
        assert_eq!(found, Some(ThreadId("T2".to_string())));
    }
}
