//! Shared test utilities for the search engine integration tests.
//!
//! In-memory store/cache plus scripted embedding and answer services, so the
//! engine runs without network or disk.

// Each test binary uses a subset of these mocks.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memex_core::store::{MemoryStore, SavedRef, SearchCache};
use memex_core::types::{
    Memory, MemoryStats, NewMemory, RecentSearch, SearchCacheEntry, SourceType,
};
use memex_core::Connectivity;
use tokio::sync::RwLock;

pub struct MockStore {
    next_id: AtomicI64,
    pub entries: Arc<RwLock<Vec<Memory>>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Inserts a memory with an explicit embedding and creation time.
    pub async fn seed(
        &self,
        user: &str,
        url: &str,
        title: &str,
        embedding: Vec<f32>,
        created_at: DateTime<Utc>,
    ) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.entries.write().await.push(Memory {
            id,
            user_id: user.to_string(),
            url: url.to_string(),
            canonical_url: url.to_string(),
            title: title.to_string(),
            content: format!("Content of {title}"),
            summary: format!("Summary of {title}"),
            intent: None,
            embedding: Some(embedding),
            created_at,
            source_type: SourceType::Manual,
        });
        id
    }
}

#[async_trait]
impl MemoryStore for MockStore {
    async fn insert(&self, memory: NewMemory) -> Result<i64, anyhow::Error> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.entries.write().await.push(Memory {
            id,
            user_id: memory.user_id,
            url: memory.url,
            canonical_url: memory.canonical_url,
            title: memory.title,
            content: memory.content,
            summary: memory.summary,
            intent: memory.intent,
            embedding: memory.embedding,
            created_at: Utc::now(),
            source_type: memory.source_type,
        });
        Ok(id)
    }

    async fn find_by_canonical_url(
        &self,
        user_id: &str,
        canonical_url: &str,
    ) -> Result<Option<SavedRef>, anyhow::Error> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|m| m.user_id == user_id && m.canonical_url == canonical_url)
            .max_by_key(|m| m.created_at)
            .map(|m| SavedRef {
                id: m.id,
                created_at: m.created_at,
                source_type: m.source_type.as_str().to_string(),
            }))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Memory>, anyhow::Error> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn snapshot_marker(
        &self,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, anyhow::Error> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.created_at)
            .max())
    }

    async fn delete(&self, id: i64, user_id: &str) -> Result<(), anyhow::Error> {
        self.entries
            .write()
            .await
            .retain(|m| !(m.id == id && m.user_id == user_id));
        Ok(())
    }

    async fn stats_for_user(&self, user_id: &str) -> Result<MemoryStats, anyhow::Error> {
        let total = self
            .entries
            .read()
            .await
            .iter()
            .filter(|m| m.user_id == user_id)
            .count();
        Ok(MemoryStats {
            total_memories: total as u64,
            avg_embedding_size: 0.0,
        })
    }
}

pub struct MockSearchCache {
    pub rows: Arc<RwLock<HashMap<(String, String), SearchCacheEntry>>>,
}

impl MockSearchCache {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl SearchCache for MockSearchCache {
    async fn get(
        &self,
        user_id: &str,
        normalized_query: &str,
    ) -> Result<Option<SearchCacheEntry>, anyhow::Error> {
        Ok(self
            .rows
            .read()
            .await
            .get(&(user_id.to_string(), normalized_query.to_string()))
            .cloned())
    }

    async fn upsert(&self, entry: SearchCacheEntry) -> Result<(), anyhow::Error> {
        self.rows.write().await.insert(
            (entry.user_id.clone(), entry.normalized_query.clone()),
            entry,
        );
        Ok(())
    }

    async fn recent(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<RecentSearch>, anyhow::Error> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id)
            .take(limit)
            .map(|e| RecentSearch {
                query: e.original_query.clone(),
                date: Utc::now(),
            })
            .collect())
    }
}

/// Embedding service that returns a scripted vector per exact query text and
/// counts invocations (for cache-hit assertions).
pub struct ScriptedEmbedder {
    pub vectors: HashMap<String, Vec<f32>>,
    pub default: Vec<f32>,
    pub calls: AtomicUsize,
}

impl ScriptedEmbedder {
    pub fn new(default: Vec<f32>) -> Self {
        Self {
            vectors: HashMap::new(),
            default,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

#[async_trait]
impl ai_client::EmbeddingService for ScriptedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        let mut out = Vec::new();
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Answer generator returning a fixed reply and counting invocations.
pub struct ScriptedGenerator {
    pub reply: String,
    pub calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ai_client::AnswerGenerator for ScriptedGenerator {
    async fn generate_answer(
        &self,
        _query: &str,
        _sources: &[ai_client::SourceExcerpt],
    ) -> Result<String, anyhow::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

pub struct FixedConnectivity(pub bool);

#[async_trait]
impl Connectivity for FixedConnectivity {
    async fn is_online(&self) -> bool {
        self.0
    }
}
