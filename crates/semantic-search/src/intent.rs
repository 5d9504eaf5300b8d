//! Query intent classification.
//!
//! Deterministic keyword rules evaluated in priority order: question, then
//! synthesis, then navigational, then general; first match wins. Each intent
//! carries its own bar for skipping the generative step.

use memex_core::config::AiGateConfig;
use memex_core::types::{Confidence, RankedMemory};
use serde::{Deserialize, Serialize};

const QUESTION_WORDS: &[&str] = &["who", "what", "when", "where", "why", "how", "which", "whose"];

const SYNTHESIS_KEYWORDS: &[&str] = &[
    "compare",
    "comparison",
    "difference between",
    "versus",
    "pros and cons",
    "tradeoff",
    "tradeoffs",
    "summarize",
    "summary",
    "overview",
    "synthesize",
    "connect",
    "relationship between",
    "what did i learn",
    "tell me about",
    "explain",
];

const NAVIGATIONAL_KEYWORDS: &[&str] = &[
    "find",
    "show me",
    "get",
    "open",
    "article about",
    "page about",
    "link to",
    "where is",
    "do i have",
];

/// Classified intent of one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    Question,
    Synthesis,
    Navigational,
    General,
}

/// Intent plus the AI-gating verdict derived from it.
#[derive(Debug, Clone, Copy)]
pub struct QueryIntent {
    pub kind: IntentKind,
    pub needs_ai_answer: bool,
    pub confidence: Confidence,
}

fn words_of(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

fn has_word(words: &[String], word: &str) -> bool {
    words.iter().any(|w| w == word)
}

/// Matches a keyword: whole-word for single tokens ("vs", "find"), substring
/// for multi-word phrases ("difference between").
fn matches_keyword(lower_query: &str, words: &[String], keyword: &str) -> bool {
    if keyword.contains(' ') {
        lower_query.contains(keyword)
    } else {
        has_word(words, keyword)
    }
}

/// Classifies the query against the top result and the deduped result count.
pub fn analyze_query_intent(
    query: &str,
    top_result: &RankedMemory,
    deduped_count: usize,
    gate: &AiGateConfig,
) -> QueryIntent {
    let lower_query = query.to_lowercase().trim().to_string();
    let words = words_of(&lower_query);

    let has_question_word = QUESTION_WORDS.iter().any(|w| has_word(&words, w));
    let has_question_mark = query.contains('?');
    let has_synthesis_intent = SYNTHESIS_KEYWORDS
        .iter()
        .any(|k| matches_keyword(&lower_query, &words, k))
        || has_word(&words, "vs");
    let is_navigational = NAVIGATIONAL_KEYWORDS
        .iter()
        .any(|k| matches_keyword(&lower_query, &words, k));

    // Case 1: a direct question. Skip AI only on a near-perfect match that
    // is not also asking for synthesis.
    if has_question_word || has_question_mark {
        let skip_ai =
            top_result.similarity >= gate.perfect_match_threshold && !has_synthesis_intent;
        return QueryIntent {
            kind: IntentKind::Question,
            needs_ai_answer: !skip_ai,
            confidence: confidence_from_similarity(top_result.similarity, gate.default_threshold),
        };
    }

    // Case 2: a synthesis request. Always AI unless a single perfect match.
    if has_synthesis_intent {
        let skip_ai =
            top_result.similarity >= gate.perfect_match_threshold && deduped_count == 1;
        return QueryIntent {
            kind: IntentKind::Synthesis,
            needs_ai_answer: !skip_ai,
            confidence: if deduped_count >= 2 {
                Confidence::High
            } else {
                Confidence::Medium
            },
        };
    }

    // Case 3: navigational, the user just wants the article back.
    if is_navigational {
        let skip_ai = top_result.similarity >= gate.navigational_threshold;
        return QueryIntent {
            kind: IntentKind::Navigational,
            needs_ai_answer: !skip_ai,
            confidence: confidence_from_similarity(
                top_result.similarity,
                gate.navigational_threshold,
            ),
        };
    }

    // Case 4: general query, gated on similarity alone.
    let skip_ai = top_result.similarity >= gate.default_threshold;
    QueryIntent {
        kind: IntentKind::General,
        needs_ai_answer: !skip_ai,
        confidence: confidence_from_similarity(top_result.similarity, gate.default_threshold),
    }
}

fn confidence_from_similarity(similarity: f32, bar: f32) -> Confidence {
    if similarity >= bar {
        Confidence::High
    } else {
        Confidence::Medium
    }
}
