//! # Core Types
//!
//! This module defines the data model shared by the ingestion and search
//! pipelines.
//!
//! ## Memory
//!
//! A saved page: extracted content plus its summary and embedding. Created
//! once by any ingestion path, immutable thereafter except owner-initiated
//! deletion.
//!
//! ## RankedMemory
//!
//! A Memory augmented transiently with similarity/recency/final scores for
//! one search invocation. Never persisted.
//!
//! ## ProcessingProgress / ProcessingResult
//!
//! Ephemeral status objects streamed to an observer while a history batch is
//! being ingested.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a memory came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    BrowserHistory,
    Manual,
    BookmarkImport,
    WebCapture,
}

impl SourceType {
    /// Stable string form used in the database `source_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::BrowserHistory => "browser-history",
            SourceType::Manual => "manual",
            SourceType::BookmarkImport => "bookmark-import",
            SourceType::WebCapture => "web-capture",
        }
    }

    /// Parses the database string form; unknown values map to `Manual`.
    pub fn from_db(s: &str) -> Self {
        match s {
            "browser-history" => SourceType::BrowserHistory,
            "bookmark-import" => SourceType::BookmarkImport,
            "web-capture" => SourceType::WebCapture,
            _ => SourceType::Manual,
        }
    }
}

/// A persisted memory record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: i64,
    pub user_id: String,
    pub url: String,
    /// Normalized URL used as the per-user dedup key.
    pub canonical_url: String,
    pub title: String,
    /// Full extracted article text.
    pub content: String,
    /// Short generated synopsis; embeddings are computed from this.
    pub summary: String,
    /// Optional user-supplied annotation ("why I saved this").
    pub intent: Option<String>,
    /// Fixed-length embedding vector; `None` when embedding failed at save time.
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub source_type: SourceType,
}

/// Insert shape for a memory; id and created_at are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub user_id: String,
    pub url: String,
    pub canonical_url: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub intent: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub source_type: SourceType,
}

/// A memory scored against one query. Exists only within a search invocation.
#[derive(Debug, Clone)]
pub struct RankedMemory {
    pub memory: Memory,
    /// Cosine similarity against the query embedding, in [-1, 1].
    pub similarity: f32,
    /// Exponential decay of age: `exp(-days / decay_days)`.
    pub recency_score: f32,
    /// Weighted blend of similarity and recency.
    pub final_score: f32,
}

/// A source record as returned to the caller of a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSource {
    pub id: String,
    pub url: String,
    pub title: String,
    pub summary: String,
    pub intent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub similarity: f32,
}

/// Confidence label attached to a search response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Final answer for one query: message, cited sources, and whether the
/// generative step produced the answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub answer: String,
    pub sources: Vec<SearchSource>,
    /// `None` only for the offline response, which is never cached.
    pub confidence: Option<Confidence>,
    pub used_ai: bool,
}

/// Readable article content produced by the extractor.
///
/// `None` from the extractor (no article, or below the minimum length) is a
/// normal skip signal, not a failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub title: String,
    pub byline: Option<String>,
    pub content: String,
    pub excerpt: String,
    pub content_length: usize,
    pub word_count: usize,
    /// Minutes at ~200 words per minute, rounded up.
    pub reading_time: u32,
}

/// One entry from an imported browsing history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub url: String,
    pub title: String,
    pub visit_time: DateTime<Utc>,
    pub visit_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typed_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visit_time: Option<DateTime<Utc>>,
}

/// A fetched article joined back to the history entry it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedEntry {
    pub url: String,
    pub title: String,
    pub content: String,
    pub content_length: usize,
    pub word_count: usize,
    pub visit_count: u32,
    pub visit_time: DateTime<Utc>,
}

/// Stage of an in-flight history ingestion batch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingStage {
    Filtering,
    AiSelection,
    Fetching,
    Complete,
    Error,
}

/// Counts at each stage of the ingestion funnel. Required terminal telemetry.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunnelStats {
    pub total_input: usize,
    pub after_blocklist: usize,
    pub sent_to_ai: usize,
    pub ai_selected: usize,
    pub successfully_fetched: usize,
    pub final_count: usize,
}

/// Progress event streamed to the ingestion observer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingProgress {
    pub stage: ProcessingStage,
    pub message: String,
    /// Percentage in 0-100.
    pub progress: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_url: Option<String>,
    pub stats: FunnelStats,
}

/// Terminal outcome of a history ingestion batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub success: bool,
    pub processed_entries: Vec<ProcessedEntry>,
    pub stats: FunnelStats,
    pub message: String,
}

/// Incoming capture request on the local control channel (one JSON object
/// per line). Also the payload the capture host validates before forwarding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_size: Option<usize>,
}

/// Reply on the local control channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureResponse {
    pub id: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed: Option<ProcessedCapture>,
}

impl CaptureResponse {
    pub fn failure(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ok: false,
            reason: Some(reason.into()),
            processed: None,
        }
    }
}

/// The processed article echoed back to the capture process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedCapture {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_id: Option<String>,
}

/// A cached search response row keyed by (user, normalized query).
#[derive(Debug, Clone)]
pub struct SearchCacheEntry {
    pub user_id: String,
    pub normalized_query: String,
    pub original_query: String,
    pub response_json: String,
    pub top_similarity: f32,
    pub used_ai: bool,
    /// Max created_at across the user's memories at compute time; the entry
    /// is stale as soon as this no longer matches.
    pub memory_snapshot_at: DateTime<Utc>,
}

/// One row from the recent-searches listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentSearch {
    pub query: String,
    pub date: DateTime<Utc>,
}

/// Per-user corpus stats surfaced to the caller.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_memories: u64,
    pub avg_embedding_size: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_type_round_trips_through_db_string() {
        for st in [
            SourceType::BrowserHistory,
            SourceType::Manual,
            SourceType::BookmarkImport,
            SourceType::WebCapture,
        ] {
            assert_eq!(SourceType::from_db(st.as_str()), st);
        }
    }

    #[test]
    fn unknown_source_type_maps_to_manual() {
        assert_eq!(SourceType::from_db("carrier-pigeon"), SourceType::Manual);
    }

    #[test]
    fn processing_stage_serializes_kebab_case() {
        let s = serde_json::to_string(&ProcessingStage::AiSelection).unwrap();
        assert_eq!(s, "\"ai-selection\"");
    }
}
