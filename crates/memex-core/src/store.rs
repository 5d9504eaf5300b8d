//! # Persistent Store Interfaces
//!
//! This module defines the storage interfaces consumed by the ingestion and
//! search pipelines. Implemented by the `storage` crate (SQLite via sqlx) and
//! by in-memory mocks in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{Memory, MemoryStats, NewMemory, RecentSearch, SearchCacheEntry};

/// Minimal view of an existing row returned by the canonical-URL lookup,
/// enough to report "you saved this N days ago".
#[derive(Debug, Clone)]
pub struct SavedRef {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub source_type: String,
}

/// Trait for storing and retrieving memories.
///
/// Writers are append-only (insert-if-not-duplicate by canonical URL);
/// readers take a point-in-time snapshot per invocation.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Inserts a new memory and returns its row id.
    async fn insert(&self, memory: NewMemory) -> Result<i64, anyhow::Error>;

    /// Looks up the most recent memory for (user, canonical URL).
    /// This is the dedup path: callers check before inserting.
    async fn find_by_canonical_url(
        &self,
        user_id: &str,
        canonical_url: &str,
    ) -> Result<Option<SavedRef>, anyhow::Error>;

    /// Returns all memories for a user. The ranker brute-force scores this
    /// snapshot; the corpus is bounded per user, so no index is involved.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Memory>, anyhow::Error>;

    /// Max created_at across the user's memories, or `None` for an empty
    /// corpus. Any new insert moves this marker, implicitly invalidating
    /// every cached search response for the user.
    async fn snapshot_marker(
        &self,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, anyhow::Error>;

    /// Deletes one memory owned by the user.
    async fn delete(&self, id: i64, user_id: &str) -> Result<(), anyhow::Error>;

    /// Corpus stats for the user (count, average stored embedding size).
    async fn stats_for_user(&self, user_id: &str) -> Result<MemoryStats, anyhow::Error>;
}

/// Trait for the query-response cache keyed by (user, normalized query).
#[async_trait]
pub trait SearchCache: Send + Sync {
    /// Returns the cached entry, if any. Validity against the snapshot
    /// marker is the caller's job.
    async fn get(
        &self,
        user_id: &str,
        normalized_query: &str,
    ) -> Result<Option<SearchCacheEntry>, anyhow::Error>;

    /// Inserts or replaces the entry for (user, normalized query).
    async fn upsert(&self, entry: SearchCacheEntry) -> Result<(), anyhow::Error>;

    /// Most recent original queries for the user, newest first.
    async fn recent(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<RecentSearch>, anyhow::Error>;
}
