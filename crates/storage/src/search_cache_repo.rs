//! Search-response cache repository.
//!
//! One row per (user_id, normalized_query). Rows are never expired by time;
//! the engine compares the stored snapshot marker against the user's current
//! marker and recomputes on mismatch, so any new memory implicitly
//! invalidates every cached response for that user.

use async_trait::async_trait;
use memex_core::store::SearchCache;
use memex_core::types::{RecentSearch, SearchCacheEntry};
use sqlx::Row;
use tracing::{debug, info};

use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct SearchCacheRepository {
    pool_manager: SqlitePoolManager,
}

impl SearchCacheRepository {
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
        info!("Creating recent_searches table if not exists");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS recent_searches (
                user_id TEXT NOT NULL,
                normalized_query TEXT NOT NULL,
                original_query TEXT NOT NULL,
                response_json TEXT NOT NULL,
                top_similarity REAL NOT NULL,
                used_ai INTEGER NOT NULL,
                memory_snapshot_at TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (user_id, normalized_query)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_recent_searches_user
                ON recent_searches(user_id, created_at DESC);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SearchCache for SearchCacheRepository {
    async fn get(
        &self,
        user_id: &str,
        normalized_query: &str,
    ) -> Result<Option<SearchCacheEntry>, anyhow::Error> {
        let pool = self.pool_manager.pool();
        let row = sqlx::query(
            r#"
            SELECT user_id, normalized_query, original_query, response_json,
                   top_similarity, used_ai, memory_snapshot_at
            FROM recent_searches
            WHERE user_id = ? AND normalized_query = ?
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(normalized_query)
        .fetch_optional(pool)
        .await?;

        Ok(match row {
            Some(row) => Some(SearchCacheEntry {
                user_id: row.try_get("user_id")?,
                normalized_query: row.try_get("normalized_query")?,
                original_query: row.try_get("original_query")?,
                response_json: row.try_get("response_json")?,
                top_similarity: row.try_get::<f64, _>("top_similarity")? as f32,
                used_ai: row.try_get::<i64, _>("used_ai")? != 0,
                memory_snapshot_at: row.try_get("memory_snapshot_at")?,
            }),
            None => None,
        })
    }

    async fn upsert(&self, entry: SearchCacheEntry) -> Result<(), anyhow::Error> {
        let pool = self.pool_manager.pool();
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO recent_searches
                (user_id, normalized_query, original_query, response_json,
                 top_similarity, used_ai, memory_snapshot_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.user_id)
        .bind(&entry.normalized_query)
        .bind(&entry.original_query)
        .bind(&entry.response_json)
        .bind(entry.top_similarity as f64)
        .bind(entry.used_ai as i64)
        .bind(entry.memory_snapshot_at)
        .bind(chrono::Utc::now())
        .execute(pool)
        .await?;

        debug!(
            user_id = %entry.user_id,
            normalized_query = %entry.normalized_query,
            used_ai = entry.used_ai,
            "Search response cached"
        );
        Ok(())
    }

    async fn recent(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<RecentSearch>, anyhow::Error> {
        let pool = self.pool_manager.pool();
        let rows = sqlx::query(
            r#"
            SELECT original_query AS query, created_at AS date
            FROM recent_searches
            WHERE user_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(RecentSearch {
                    query: row.try_get("query")?,
                    date: row.try_get("date")?,
                })
            })
            .collect()
    }
}
