//! Memory repository: persistence and queries for saved pages.
//!
//! Uses SqlitePoolManager; implements `memex_core::MemoryStore`.
//! Writers are append-only; dedup is lookup-before-insert by
//! (user_id, canonical_url), backed by a unique index for durability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memex_core::store::{MemoryStore, SavedRef};
use memex_core::types::{Memory, MemoryStats, NewMemory, SourceType};
use sqlx::Row;
use tracing::{debug, info};

use crate::codec::{bytes_to_embedding, embedding_to_bytes};
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct MemoryRepository {
    pool_manager: SqlitePoolManager,
}

impl MemoryRepository {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    pub fn from_pool(pool_manager: SqlitePoolManager) -> Self {
        Self { pool_manager }
    }

    pub async fn init(&self) -> Result<(), sqlx::Error> {
        info!("Creating memories table if not exists");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS memories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                url TEXT,
                canonical_url TEXT,
                title TEXT,
                content TEXT DEFAULT NULL,
                summary TEXT,
                intent TEXT DEFAULT NULL,
                embedding BLOB DEFAULT NULL,
                created_at TEXT NOT NULL,
                source_type TEXT DEFAULT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_memories_user_canonical_url
                ON memories (user_id, canonical_url);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_memories_created_at ON memories(created_at DESC);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_memories_user_id ON memories(user_id);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    fn row_to_memory(row: &sqlx::sqlite::SqliteRow) -> Result<Memory, sqlx::Error> {
        let embedding: Option<Vec<u8>> = row.try_get("embedding")?;
        let source_type: Option<String> = row.try_get("source_type")?;

        Ok(Memory {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            url: row.try_get::<Option<String>, _>("url")?.unwrap_or_default(),
            canonical_url: row
                .try_get::<Option<String>, _>("canonical_url")?
                .unwrap_or_default(),
            title: row
                .try_get::<Option<String>, _>("title")?
                .unwrap_or_default(),
            content: row
                .try_get::<Option<String>, _>("content")?
                .unwrap_or_default(),
            summary: row
                .try_get::<Option<String>, _>("summary")?
                .unwrap_or_default(),
            intent: row.try_get("intent")?,
            embedding: embedding.as_deref().and_then(bytes_to_embedding),
            created_at: row.try_get("created_at")?,
            source_type: SourceType::from_db(source_type.as_deref().unwrap_or("manual")),
        })
    }
}

#[async_trait]
impl MemoryStore for MemoryRepository {
    async fn insert(&self, memory: NewMemory) -> Result<i64, anyhow::Error> {
        let pool = self.pool_manager.pool();
        let embedding_bytes = memory.embedding.as_deref().map(embedding_to_bytes);
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO memories
                (user_id, url, canonical_url, title, content, summary, intent, embedding, created_at, source_type)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&memory.user_id)
        .bind(&memory.url)
        .bind(&memory.canonical_url)
        .bind(&memory.title)
        .bind(&memory.content)
        .bind(&memory.summary)
        .bind(&memory.intent)
        .bind(embedding_bytes)
        .bind(created_at)
        .bind(memory.source_type.as_str())
        .execute(pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(
            id,
            user_id = %memory.user_id,
            canonical_url = %memory.canonical_url,
            source_type = memory.source_type.as_str(),
            has_embedding = memory.embedding.is_some(),
            "Memory written"
        );
        Ok(id)
    }

    async fn find_by_canonical_url(
        &self,
        user_id: &str,
        canonical_url: &str,
    ) -> Result<Option<SavedRef>, anyhow::Error> {
        let pool = self.pool_manager.pool();
        let row = sqlx::query(
            r#"
            SELECT id, created_at, source_type
            FROM memories
            WHERE user_id = ? AND canonical_url = ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(canonical_url)
        .fetch_optional(pool)
        .await?;

        Ok(match row {
            Some(row) => Some(SavedRef {
                id: row.try_get("id")?,
                created_at: row.try_get("created_at")?,
                source_type: row
                    .try_get::<Option<String>, _>("source_type")?
                    .unwrap_or_default(),
            }),
            None => None,
        })
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Memory>, anyhow::Error> {
        let pool = self.pool_manager.pool();
        let rows = sqlx::query("SELECT * FROM memories WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        let memories = rows
            .iter()
            .map(Self::row_to_memory)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(user_id = %user_id, count = memories.len(), "Loaded memory snapshot");
        Ok(memories)
    }

    async fn snapshot_marker(
        &self,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, anyhow::Error> {
        let pool = self.pool_manager.pool();
        let marker: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT MAX(created_at) FROM memories WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(pool)
                .await?;
        Ok(marker)
    }

    async fn delete(&self, id: i64, user_id: &str) -> Result<(), anyhow::Error> {
        let pool = self.pool_manager.pool();
        sqlx::query("DELETE FROM memories WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    async fn stats_for_user(&self, user_id: &str) -> Result<MemoryStats, anyhow::Error> {
        let pool = self.pool_manager.pool();
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total, AVG(LENGTH(embedding)) AS avg_size
            FROM memories
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(MemoryStats {
            total_memories: row.try_get::<i64, _>("total")? as u64,
            avg_embedding_size: row
                .try_get::<Option<f64>, _>("avg_size")?
                .unwrap_or(0.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_repo() -> (MemoryRepository, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let repo = MemoryRepository::new(db_path.to_str().unwrap())
            .await
            .unwrap();
        (repo, temp_dir)
    }

    fn sample(user: &str, canonical: &str) -> NewMemory {
        NewMemory {
            user_id: user.to_string(),
            url: format!("{canonical}/"),
            canonical_url: canonical.to_string(),
            title: "A saved page".to_string(),
            content: "Body text".to_string(),
            summary: "A short synopsis.".to_string(),
            intent: None,
            embedding: Some(vec![1.0, 0.0, 0.5]),
            source_type: SourceType::Manual,
        }
    }

    #[tokio::test]
    async fn insert_and_list_round_trip() {
        let (repo, _dir) = create_test_repo().await;

        let id = repo
            .insert(sample("user1", "https://example.com/post"))
            .await
            .unwrap();
        assert!(id > 0);

        let memories = repo.list_for_user("user1").await.unwrap();
        assert_eq!(memories.len(), 1);
        assert_eq!(memories[0].canonical_url, "https://example.com/post");
        assert_eq!(memories[0].embedding.as_deref(), Some(&[1.0, 0.0, 0.5][..]));
        assert_eq!(memories[0].source_type, SourceType::Manual);

        assert!(repo.list_for_user("someone-else").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn canonical_lookup_finds_existing_row() {
        let (repo, _dir) = create_test_repo().await;
        let id = repo
            .insert(sample("user1", "https://example.com/post"))
            .await
            .unwrap();

        let found = repo
            .find_by_canonical_url("user1", "https://example.com/post")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.source_type, "manual");

        assert!(repo
            .find_by_canonical_url("user1", "https://example.com/other")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_canonical_url_is_rejected_by_unique_index() {
        let (repo, _dir) = create_test_repo().await;
        repo.insert(sample("user1", "https://example.com/post"))
            .await
            .unwrap();

        let second = repo.insert(sample("user1", "https://example.com/post")).await;
        assert!(second.is_err());

        // A different user may save the same canonical URL.
        assert!(repo
            .insert(sample("user2", "https://example.com/post"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn snapshot_marker_moves_on_insert() {
        let (repo, _dir) = create_test_repo().await;
        assert!(repo.snapshot_marker("user1").await.unwrap().is_none());

        repo.insert(sample("user1", "https://example.com/a"))
            .await
            .unwrap();
        let first = repo.snapshot_marker("user1").await.unwrap().unwrap();

        repo.insert(sample("user1", "https://example.com/b"))
            .await
            .unwrap();
        let second = repo.snapshot_marker("user1").await.unwrap().unwrap();
        assert!(second >= first);
    }

    #[tokio::test]
    async fn delete_is_scoped_to_owner() {
        let (repo, _dir) = create_test_repo().await;
        let id = repo
            .insert(sample("user1", "https://example.com/a"))
            .await
            .unwrap();

        repo.delete(id, "intruder").await.unwrap();
        assert_eq!(repo.list_for_user("user1").await.unwrap().len(), 1);

        repo.delete(id, "user1").await.unwrap();
        assert!(repo.list_for_user("user1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_count_rows_and_embedding_bytes() {
        let (repo, _dir) = create_test_repo().await;
        repo.insert(sample("user1", "https://example.com/a"))
            .await
            .unwrap();
        repo.insert(sample("user1", "https://example.com/b"))
            .await
            .unwrap();

        let stats = repo.stats_for_user("user1").await.unwrap();
        assert_eq!(stats.total_memories, 2);
        // Three f32s = 12 bytes per stored embedding.
        assert!((stats.avg_embedding_size - 12.0).abs() < f64::EPSILON);
    }
}
