//! Answer composition: turns a decision plus deduped results into the final
//! response, including citation extraction on the generative path.
//!
//! A generative answer with no grounded citation is treated as untrustworthy
//! and discarded in favor of the recall-only shape. Every path reports
//! `used_ai` truthfully.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use ai_client::{AnswerGenerator, SourceExcerpt};
use memex_core::config::{AiGateConfig, SearchConfig};
use memex_core::types::{Confidence, RankedMemory, SearchResponse, SearchSource};
use regex::Regex;
use tracing::{info, warn};

use crate::intent::QueryIntent;

pub const NO_RESULTS_ANSWER: &str =
    "I couldn't find any relevant articles. Try saving more content to build your memory!";
pub const RECALL_ANSWER: &str = "Here's what I found in your saved articles:";
pub const OFFLINE_ANSWER: &str = "Please check your internet connection.";

static CITATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[?(\d+)\]?").expect("citation pattern must compile"));

fn format_source(memory: &RankedMemory) -> SearchSource {
    SearchSource {
        id: memory.memory.id.to_string(),
        url: memory.memory.url.clone(),
        title: memory.memory.title.clone(),
        summary: memory.memory.summary.clone(),
        intent: memory.memory.intent.clone(),
        created_at: memory.memory.created_at,
        similarity: memory.similarity,
    }
}

pub fn compose_offline() -> SearchResponse {
    SearchResponse {
        answer: OFFLINE_ANSWER.to_string(),
        sources: Vec::new(),
        // No confidence: the offline response must never be cached.
        confidence: None,
        used_ai: false,
    }
}

pub fn compose_no_results() -> SearchResponse {
    SearchResponse {
        answer: NO_RESULTS_ANSWER.to_string(),
        sources: Vec::new(),
        confidence: Some(Confidence::Low),
        used_ai: false,
    }
}

/// Low-confidence response naming the query, with at most 3 sources.
pub fn compose_weak_match(query: &str, deduped: &[RankedMemory]) -> SearchResponse {
    SearchResponse {
        answer: format!(
            "I found some loosely related articles, but I'm not very confident they match \"{query}\". Consider saving more specific content about this topic."
        ),
        sources: deduped.iter().take(3).map(format_source).collect(),
        confidence: Some(Confidence::Low),
        used_ai: false,
    }
}

/// Confident recall without synthesis: top sources by score.
pub fn compose_recall_only(deduped: &[RankedMemory], config: &SearchConfig) -> SearchResponse {
    SearchResponse {
        answer: RECALL_ANSWER.to_string(),
        sources: deduped
            .iter()
            .take(config.max_results_to_user)
            .map(format_source)
            .collect(),
        confidence: Some(Confidence::High),
        used_ai: false,
    }
}

/// Extracts cited source indices (0-based) from a generated answer.
/// Out-of-range numbers are ignored; duplicates collapse; order is ascending.
pub fn extract_citations(answer: &str, source_count: usize) -> Vec<usize> {
    let mut cited: BTreeSet<usize> = BTreeSet::new();
    for capture in CITATION_REGEX.captures_iter(answer) {
        if let Ok(number) = capture[1].parse::<usize>() {
            if number >= 1 && number <= source_count {
                cited.insert(number - 1);
            }
        }
    }
    cited.into_iter().collect()
}

/// Generative path: synthesize over at most `max_sources_for_ai` candidates,
/// keep only the sources the answer actually cites, and fall back to the
/// recall-only shape when nothing was cited.
pub async fn compose_generative(
    generator: &dyn AnswerGenerator,
    query: &str,
    deduped: &[RankedMemory],
    intent: &QueryIntent,
    search: &SearchConfig,
    gate: &AiGateConfig,
) -> Result<SearchResponse, anyhow::Error> {
    let candidates: Vec<&RankedMemory> =
        deduped.iter().take(gate.max_sources_for_ai).collect();
    let excerpts: Vec<SourceExcerpt> = candidates
        .iter()
        .map(|m| SourceExcerpt {
            title: m.memory.title.clone(),
            url: m.memory.url.clone(),
            summary: m.memory.summary.clone(),
        })
        .collect();

    let answer = generator.generate_answer(query, &excerpts).await?;
    let cited = extract_citations(&answer, candidates.len());

    if answer.trim().is_empty() || cited.is_empty() {
        warn!("generated answer carried no grounded citation, falling back to recall");
        return Ok(compose_recall_only(deduped, search));
    }

    info!(cited = cited.len(), "generative answer composed");
    Ok(SearchResponse {
        answer,
        sources: cited
            .into_iter()
            .map(|index| format_source(candidates[index]))
            .collect(),
        confidence: Some(intent.confidence),
        used_ai: true,
    })
}
