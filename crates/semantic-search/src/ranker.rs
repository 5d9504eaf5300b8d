//! Brute-force similarity ranking over a user's memory snapshot.
//!
//! Cosine similarity blended with exponential recency decay. The corpus is
//! bounded per user, so scoring every stored embedding is the design, not a
//! shortcut.

use chrono::{DateTime, Utc};
use memex_core::config::SearchConfig;
use memex_core::types::{Memory, RankedMemory};

/// Cosine similarity of two vectors.
///
/// Never panics: mismatched lengths and zero-magnitude vectors yield `0.0`
/// (not NaN), so a malformed stored embedding can only rank low, not crash a
/// search.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot_product = 0.0f32;
    let mut mag_a = 0.0f32;
    let mut mag_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot_product += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }

    let mag_a = mag_a.sqrt();
    let mag_b = mag_b.sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot_product / (mag_a * mag_b)
}

/// Scores every memory against the query embedding and returns the top K by
/// blended score, best first. Deterministic for a fixed snapshot.
///
/// Memories without an embedding, or whose stored dimensionality differs
/// from the query's, are skipped rather than erroring.
pub fn rank_memories(
    memories: &[Memory],
    query_embedding: &[f32],
    now: DateTime<Utc>,
    config: &SearchConfig,
) -> Vec<RankedMemory> {
    let mut results: Vec<RankedMemory> = Vec::new();

    for memory in memories {
        let Some(embedding) = memory.embedding.as_deref() else {
            continue;
        };
        if embedding.len() != query_embedding.len() {
            continue;
        }

        let similarity = cosine_similarity(query_embedding, embedding);
        // The floor bounds the candidate set before the expensive
        // dedup/decision/synthesis steps downstream.
        if similarity < config.min_similarity {
            continue;
        }

        let days_since = ((now - memory.created_at).num_seconds().max(0)) as f32 / 86_400.0;
        let recency_score = (-days_since / config.recency_decay_days).exp();
        let final_score =
            similarity * config.similarity_weight + recency_score * config.recency_weight;

        results.push(RankedMemory {
            memory: memory.clone(),
            similarity,
            recency_score,
            final_score,
        });
    }

    results.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(config.top_k);
    results
}
