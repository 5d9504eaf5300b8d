//! # Semantic Search
//!
//! The retrieval-and-answer decision engine: embed the query, brute-force
//! rank the user's memory snapshot, dedup near-identical results, decide
//! whether generative synthesis is warranted, and compose the final answer
//! with cited sources.
//!
//! ## Modules
//!
//! - [`ranker`] - cosine similarity + recency-blended scoring
//! - [`dedup`] - same-domain/title-overlap duplicate removal
//! - [`intent`] - deterministic query intent classification
//! - [`decision`] - the tagged answer-gate decision
//! - [`composer`] - response shapes and citation extraction
//!
//! The engine also carries the snapshot-validated response cache: a cached
//! response is reused only while the user's corpus is unchanged.

use std::sync::Arc;

use ai_client::{AnswerGenerator, EmbeddingService};
use chrono::{DateTime, Utc};
use memex_core::config::{AiGateConfig, SearchConfig};
use memex_core::error::MemexError;
use memex_core::store::{MemoryStore, SearchCache};
use memex_core::types::{
    MemoryStats, RecentSearch, SearchCacheEntry, SearchResponse,
};
use memex_core::Connectivity;
use tracing::{debug, info};

pub mod composer;
pub mod decision;
pub mod dedup;
pub mod intent;
pub mod ranker;

pub use decision::SearchDecision;
pub use intent::{IntentKind, QueryIntent};

/// Normalizes a query for cache keying: trim, lowercase, collapse whitespace.
pub fn normalize_query(query: &str) -> String {
    query
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The query engine over injected store, cache and collaborator services.
pub struct SearchEngine {
    store: Arc<dyn MemoryStore>,
    cache: Arc<dyn SearchCache>,
    embedder: Arc<dyn EmbeddingService>,
    generator: Arc<dyn AnswerGenerator>,
    connectivity: Arc<dyn Connectivity>,
    search_config: SearchConfig,
    gate_config: AiGateConfig,
}

impl SearchEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn MemoryStore>,
        cache: Arc<dyn SearchCache>,
        embedder: Arc<dyn EmbeddingService>,
        generator: Arc<dyn AnswerGenerator>,
        connectivity: Arc<dyn Connectivity>,
        search_config: SearchConfig,
        gate_config: AiGateConfig,
    ) -> Self {
        Self {
            store,
            cache,
            embedder,
            generator,
            connectivity,
            search_config,
            gate_config,
        }
    }

    /// Runs one search without consulting the cache.
    pub async fn search(&self, user_id: &str, query: &str) -> Result<SearchResponse, MemexError> {
        if !self.connectivity.is_online().await {
            return Ok(composer::compose_offline());
        }

        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| MemexError::Ai(e.to_string()))?;

        let memories = self
            .store
            .list_for_user(user_id)
            .await
            .map_err(|e| MemexError::Storage(e.to_string()))?;

        let ranked = ranker::rank_memories(
            &memories,
            &query_embedding,
            Utc::now(),
            &self.search_config,
        );
        if ranked.is_empty() {
            return Ok(composer::compose_no_results());
        }

        let deduped = dedup::deduplicate_results(ranked);
        let decision =
            decision::decide(query, &deduped, &self.search_config, &self.gate_config);

        info!(
            user_id = %user_id,
            candidates = deduped.len(),
            top_similarity = deduped.first().map(|r| r.similarity).unwrap_or(0.0),
            decision = ?decision,
            "search decision"
        );

        match decision {
            SearchDecision::NoResults => Ok(composer::compose_no_results()),
            SearchDecision::WeakMatch => Ok(composer::compose_weak_match(query, &deduped)),
            SearchDecision::RecallOnly { .. } => {
                Ok(composer::compose_recall_only(&deduped, &self.search_config))
            }
            SearchDecision::Generative { intent, .. } => composer::compose_generative(
                self.generator.as_ref(),
                query,
                &deduped,
                &intent,
                &self.search_config,
                &self.gate_config,
            )
            .await
            .map_err(|e| MemexError::Ai(e.to_string())),
        }
    }

    /// Cache-wrapped search. A cached response is valid only while the
    /// stored snapshot marker matches the user's current one; any new memory
    /// invalidates every cached entry for the user implicitly.
    pub async fn search_with_cache(
        &self,
        user_id: &str,
        query: &str,
    ) -> Result<SearchResponse, MemexError> {
        let normalized_query = normalize_query(query);
        let memory_snapshot = self.snapshot_or_epoch(user_id).await?;

        if let Some(cached) = self
            .cache
            .get(user_id, &normalized_query)
            .await
            .map_err(|e| MemexError::Storage(e.to_string()))?
        {
            if cached.memory_snapshot_at == memory_snapshot {
                if let Ok(response) = serde_json::from_str::<SearchResponse>(&cached.response_json)
                {
                    debug!(user_id = %user_id, normalized_query = %normalized_query, "cache hit");
                    return Ok(response);
                }
            }
            debug!(user_id = %user_id, normalized_query = %normalized_query, "cache stale, recomputing");
        }

        let response = self.search(user_id, query).await?;

        // The offline response (confidence: None) is never cached.
        if response.confidence.is_some() {
            let entry = SearchCacheEntry {
                user_id: user_id.to_string(),
                normalized_query,
                original_query: query.to_string(),
                response_json: serde_json::to_string(&response)
                    .map_err(|e| MemexError::Unknown(e.to_string()))?,
                top_similarity: response
                    .sources
                    .first()
                    .map(|s| s.similarity)
                    .unwrap_or(0.0),
                used_ai: response.used_ai,
                memory_snapshot_at: memory_snapshot,
            };
            self.cache
                .upsert(entry)
                .await
                .map_err(|e| MemexError::Storage(e.to_string()))?;
        }

        Ok(response)
    }

    /// Corpus stats for the user.
    pub async fn search_stats(&self, user_id: &str) -> Result<MemoryStats, MemexError> {
        self.store
            .stats_for_user(user_id)
            .await
            .map_err(|e| MemexError::Storage(e.to_string()))
    }

    /// Most recent queries, newest first.
    pub async fn recent_searches(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<RecentSearch>, MemexError> {
        self.cache
            .recent(user_id, limit)
            .await
            .map_err(|e| MemexError::Storage(e.to_string()))
    }

    /// An empty corpus maps to the epoch so the first insert still changes
    /// the marker and invalidates anything cached against emptiness.
    async fn snapshot_or_epoch(&self, user_id: &str) -> Result<DateTime<Utc>, MemexError> {
        Ok(self
            .store
            .snapshot_marker(user_id)
            .await
            .map_err(|e| MemexError::Storage(e.to_string()))?
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
    }
}
