//! # Tuning Configuration
//!
//! Every empirically tuned threshold lives here as a named field with the
//! production value as its default, so the decision logic can be re-tuned
//! without touching code.

use std::time::Duration;

/// Ranking and response-shaping thresholds for the query engine.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Candidates kept after brute-force scoring.
    pub top_k: usize,
    /// Sources shown to the user on the recall-only path.
    pub max_results_to_user: usize,
    /// Similarity floor; candidates below it never enter ranking.
    pub min_similarity: f32,
    /// Below this top similarity the engine short-circuits to the
    /// low-confidence "loosely related" response.
    pub weak_match_threshold: f32,
    /// Top similarity at or above this is labeled a confident match.
    pub confident_match_threshold: f32,
    pub similarity_weight: f32,
    pub recency_weight: f32,
    /// Half-life style decay constant, in days.
    pub recency_decay_days: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 50,
            max_results_to_user: 5,
            min_similarity: 0.3,
            weak_match_threshold: 0.42,
            confident_match_threshold: 0.68,
            similarity_weight: 0.7,
            recency_weight: 0.25,
            recency_decay_days: 60.0,
        }
    }
}

/// Gates deciding when a generative answer is warranted.
#[derive(Debug, Clone, Copy)]
pub struct AiGateConfig {
    /// Candidate sources handed to the answer generator.
    pub max_sources_for_ai: usize,
    /// Skip the generative step only on a near-perfect match.
    pub perfect_match_threshold: f32,
    /// Lower bar for "find that article" queries.
    pub navigational_threshold: f32,
    /// Default gate for general queries.
    pub default_threshold: f32,
    /// Top-1/top-2 similarity gap below which results are ambiguous.
    pub ambiguity_gap: f32,
    /// Minimum deduped result count before ambiguity forces synthesis.
    pub ambiguity_min_results: usize,
}

impl Default for AiGateConfig {
    fn default() -> Self {
        Self {
            max_sources_for_ai: 5,
            perfect_match_threshold: 0.9,
            navigational_threshold: 0.7,
            default_threshold: 0.75,
            ambiguity_gap: 0.05,
            ambiguity_min_results: 3,
        }
    }
}

/// Knobs for the history ingestion pipeline and the single-item save flows.
#[derive(Debug, Clone, Copy)]
pub struct IngestConfig {
    /// Cap on URLs handed to the ranking collaborator.
    pub max_urls_to_send_ai: usize,
    /// How many URLs the ranking collaborator is asked to select.
    pub ai_desired_selection: usize,
    /// Batch is reported as fully successful at or above this count.
    pub final_process_target: usize,
    /// Extraction below this many characters is discarded as boilerplate.
    pub min_content_length: usize,
    /// Concurrent extraction jobs in a batch.
    pub fetch_concurrency: usize,
    /// Per-job timeout for batch history fetches.
    pub fetch_timeout: Duration,
    /// Per-job timeout for bookmark imports.
    pub bookmark_fetch_timeout: Duration,
    /// Per-job timeout for the interactive add-memory flow.
    pub single_url_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_urls_to_send_ai: 500,
            ai_desired_selection: 20,
            final_process_target: 20,
            min_content_length: 400,
            fetch_concurrency: 5,
            fetch_timeout: Duration::from_secs(10),
            bookmark_fetch_timeout: Duration::from_secs(15),
            single_url_timeout: Duration::from_secs(30),
        }
    }
}
