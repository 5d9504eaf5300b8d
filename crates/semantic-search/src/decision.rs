//! The answer-gate decision, as an explicit tagged type.
//!
//! Evaluated after ranking and dedup:
//!
//! 1. No results at all → `NoResults`.
//! 2. Top similarity below the weak-match threshold → `WeakMatch`
//!    (short-circuits everything else; no generative call).
//! 3. Otherwise classify intent; ambiguity (≥3 results with a near-tied
//!    top pair) forces generative synthesis regardless of intent.

use memex_core::config::{AiGateConfig, SearchConfig};
use memex_core::types::RankedMemory;
use tracing::debug;

use crate::intent::{analyze_query_intent, QueryIntent};

/// How the composer should answer. Tests assert on these variants instead of
/// re-deriving the policy from control flow.
#[derive(Debug, Clone, Copy)]
pub enum SearchDecision {
    /// Nothing ranked above the similarity floor.
    NoResults,
    /// Top match is too weak to trust; list a few loosely related sources.
    WeakMatch,
    /// Confident enough to answer from recall alone.
    RecallOnly {
        /// Top similarity cleared the confident-match bar.
        confident_match: bool,
    },
    /// Generative synthesis is warranted.
    Generative {
        intent: QueryIntent,
        /// Set when near-tied candidates forced synthesis.
        ambiguous: bool,
    },
}

/// Applies the decision policy to the deduped, similarity-sorted results.
pub fn decide(
    query: &str,
    deduped: &[RankedMemory],
    search: &SearchConfig,
    gate: &AiGateConfig,
) -> SearchDecision {
    let Some(top_result) = deduped.first() else {
        return SearchDecision::NoResults;
    };

    if top_result.similarity < search.weak_match_threshold {
        debug!(
            top_similarity = top_result.similarity,
            threshold = search.weak_match_threshold,
            "weak match short-circuit"
        );
        return SearchDecision::WeakMatch;
    }

    let intent = analyze_query_intent(query, top_result, deduped.len(), gate);

    let dominance = deduped
        .get(1)
        .map(|second| top_result.similarity - second.similarity)
        .unwrap_or(1.0);
    let ambiguous = deduped.len() >= gate.ambiguity_min_results && dominance < gate.ambiguity_gap;

    if intent.needs_ai_answer || ambiguous {
        SearchDecision::Generative { intent, ambiguous }
    } else {
        SearchDecision::RecallOnly {
            confident_match: top_result.similarity >= search.confident_match_threshold,
        }
    }
}
