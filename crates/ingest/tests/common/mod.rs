//! Shared test utilities for ingest integration tests.
//!
//! Provides in-memory mocks for the store, fetcher, selector, summarizer,
//! embedder and connectivity probe, so pipelines run without network or disk.

// Each test binary uses a subset of these mocks.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fetch_pool::Fetcher;
use memex_core::store::{MemoryStore, SavedRef};
use memex_core::types::{ExtractedContent, HistoryEntry, Memory, MemoryStats, NewMemory};
use memex_core::Connectivity;
use tokio::sync::RwLock;

/// In-memory MemoryStore.
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
}

#[async_trait]
impl MemoryStore for MockStore {
    async fn insert(&self, memory: NewMemory) -> Result<i64, anyhow::Error> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.write().await;
        entries.push(Memory {
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
        let entries = self.entries.read().await;
        Ok(entries
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
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn snapshot_marker(
        &self,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, anyhow::Error> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.created_at)
            .max())
    }

    async fn delete(&self, id: i64, user_id: &str) -> Result<(), anyhow::Error> {
        let mut entries = self.entries.write().await;
        entries.retain(|m| !(m.id == id && m.user_id == user_id));
        Ok(())
    }

    async fn stats_for_user(&self, user_id: &str) -> Result<MemoryStats, anyhow::Error> {
        let entries = self.entries.read().await;
        let total = entries.iter().filter(|m| m.user_id == user_id).count();
        Ok(MemoryStats {
            total_memories: total as u64,
            avg_embedding_size: 0.0,
        })
    }
}

/// Fetcher that serves canned articles by URL; unknown URLs are skips.
pub struct MockFetcher {
    pub pages: HashMap<String, ExtractedContent>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }

    pub fn with_page(mut self, url: &str, content_len: usize) -> Self {
        let content = "word ".repeat(content_len / 5);
        self.pages.insert(
            url.to_string(),
            ExtractedContent {
                title: format!("Title of {url}"),
                byline: None,
                content_length: content.len(),
                word_count: content.split_whitespace().count(),
                excerpt: content.chars().take(300).collect(),
                content,
                reading_time: 1,
            },
        );
        self
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<ExtractedContent>, anyhow::Error> {
        Ok(self.pages.get(url).cloned())
    }
}

/// Selector that keeps every candidate URL, in order.
pub struct PassthroughSelector;

#[async_trait]
impl ai_client::UrlSelector for PassthroughSelector {
    async fn select_urls(
        &self,
        entries: &[HistoryEntry],
        desired: usize,
    ) -> Result<Vec<String>, anyhow::Error> {
        Ok(entries
            .iter()
            .take(desired)
            .map(|e| e.url.clone())
            .collect())
    }
}

/// Summarizer that echoes a fixed-form summary without network access.
pub struct MockSummarizer;

#[async_trait]
impl ai_client::Summarizer for MockSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, anyhow::Error> {
        Ok(format!("Summary: {}", text.chars().take(40).collect::<String>()))
    }
}

/// Embedding service returning a fixed-dimension vector for any input.
pub struct MockEmbeddingService;

#[async_trait]
impl ai_client::EmbeddingService for MockEmbeddingService {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, anyhow::Error> {
        Ok(vec![0.1; 8])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        Ok(texts.iter().map(|_| vec![0.1; 8]).collect())
    }
}

/// Probe with a fixed answer.
pub struct FixedConnectivity(pub bool);

#[async_trait]
impl Connectivity for FixedConnectivity {
    async fn is_online(&self) -> bool {
        self.0
    }
}
