//! Near-duplicate removal over ranked results.
//!
//! Two results are duplicates iff they share a hostname AND their titles
//! overlap heavily (Jaccard over lowercase words longer than 3 characters
//! above 0.8). Greedy pass over the similarity-sorted list: first seen wins.

use std::collections::HashSet;

use memex_core::types::RankedMemory;
use memex_core::urls::hostname;
use tracing::debug;

const TITLE_OVERLAP_THRESHOLD: f32 = 0.8;

/// Jaccard similarity of the significant title words.
fn title_similarity(title1: &str, title2: &str) -> f32 {
    let words1: HashSet<String> = significant_words(title1);
    let words2: HashSet<String> = significant_words(title2);

    let union = words1.union(&words2).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = words1.intersection(&words2).count();
    intersection as f32 / union as f32
}

fn significant_words(title: &str) -> HashSet<String> {
    title
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.len() > 3)
        .map(|w| w.to_string())
        .collect()
}

/// Drops near-duplicates, keeping the first-seen (highest-ranked) result of
/// each cluster. Results whose URL fails to parse are never duplicates.
pub fn deduplicate_results(memories: Vec<RankedMemory>) -> Vec<RankedMemory> {
    let before = memories.len();
    let mut kept: Vec<RankedMemory> = Vec::new();

    for memory in memories {
        let is_duplicate = kept.iter().any(|existing| {
            let (Some(a), Some(b)) = (hostname(&memory.memory.url), hostname(&existing.memory.url))
            else {
                return false;
            };
            a == b
                && title_similarity(&memory.memory.title, &existing.memory.title)
                    > TITLE_OVERLAP_THRESHOLD
        });

        if !is_duplicate {
            kept.push(memory);
        }
    }

    if kept.len() < before {
        debug!(before, after = kept.len(), "near-duplicates dropped");
    }
    kept
}
