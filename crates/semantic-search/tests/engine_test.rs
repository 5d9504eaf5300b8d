//! Integration tests for the search engine: decision paths, the
//! zero-citation fallback, and snapshot-based cache invalidation.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::Utc;
use common::*;
use memex_core::config::{AiGateConfig, SearchConfig};
use memex_core::types::Confidence;
use semantic_search::SearchEngine;

/// Unit vector at the given cosine against [1, 0].
fn vector_with_similarity(cos: f32) -> Vec<f32> {
    vec![cos, (1.0 - cos * cos).sqrt()]
}

struct Setup {
    store: Arc<MockStore>,
    cache: Arc<MockSearchCache>,
    embedder: Arc<ScriptedEmbedder>,
    generator: Arc<ScriptedGenerator>,
}

impl Setup {
    fn engine(&self, online: bool) -> SearchEngine {
        SearchEngine::new(
            self.store.clone(),
            self.cache.clone(),
            self.embedder.clone(),
            self.generator.clone(),
            Arc::new(FixedConnectivity(online)),
            SearchConfig::default(),
            AiGateConfig::default(),
        )
    }
}

fn setup(reply: &str) -> Setup {
    Setup {
        store: Arc::new(MockStore::new()),
        cache: Arc::new(MockSearchCache::new()),
        embedder: Arc::new(ScriptedEmbedder::new(vec![1.0, 0.0])),
        generator: Arc::new(ScriptedGenerator::new(reply)),
    }
}

#[tokio::test]
async fn confident_single_match_answers_from_recall_without_ai() {
    let s = setup("[1] should never be called");
    s.store
        .seed(
            "user1",
            "https://food-blog.net/steak",
            "Cooking Steak with the Reverse Sear",
            vector_with_similarity(0.95),
            Utc::now(),
        )
        .await;

    let response = s
        .engine(true)
        .search("user1", "What did I read about cooking steak?")
        .await
        .unwrap();

    assert!(!response.used_ai);
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.confidence, Some(Confidence::High));
    assert_eq!(s.generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_corpus_returns_the_no_results_shape() {
    let s = setup("unused");
    let response = s.engine(true).search("user1", "anything at all").await.unwrap();

    assert!(response.sources.is_empty());
    assert_eq!(response.confidence, Some(Confidence::Low));
    assert!(!response.used_ai);
    assert!(response.answer.contains("couldn't find"));
}

#[tokio::test]
async fn weak_top_match_lists_loosely_related_sources_without_ai() {
    let s = setup("unused");
    for i in 0..5 {
        s.store
            .seed(
                "user1",
                &format!("https://site{i}.example.net/post"),
                &format!("Unrelated Piece Number {i}"),
                vector_with_similarity(0.35),
                Utc::now(),
            )
            .await;
    }

    let response = s.engine(true).search("user1", "quantum basket weaving").await.unwrap();

    assert!(!response.used_ai);
    assert_eq!(response.confidence, Some(Confidence::Low));
    assert!(response.sources.len() <= 3);
    assert!(response.answer.contains("quantum basket weaving"));
    assert_eq!(s.generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn question_below_perfect_match_uses_the_generator_and_keeps_cited_sources() {
    let s = setup("Use the oven first, then sear [2].");
    s.store
        .seed(
            "user1",
            "https://a.example.net/one",
            "Pan Searing Basics",
            vector_with_similarity(0.8),
            Utc::now(),
        )
        .await;
    s.store
        .seed(
            "user1",
            "https://b.example.net/two",
            "Reverse Sear Guide",
            vector_with_similarity(0.6),
            Utc::now(),
        )
        .await;

    let response = s
        .engine(true)
        .search("user1", "How do I cook a thick steak?")
        .await
        .unwrap();

    assert!(response.used_ai);
    assert_eq!(s.generator.calls.load(Ordering::SeqCst), 1);
    // Only the cited source survives.
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].title, "Reverse Sear Guide");
}

#[tokio::test]
async fn zero_citation_answer_falls_back_to_recall_shape() {
    let s = setup("I have opinions but cite nothing.");
    s.store
        .seed(
            "user1",
            "https://a.example.net/one",
            "Pan Searing Basics",
            vector_with_similarity(0.8),
            Utc::now(),
        )
        .await;

    let response = s
        .engine(true)
        .search("user1", "How do I cook a thick steak?")
        .await
        .unwrap();

    // The generator ran, but its uncited answer was discarded.
    assert_eq!(s.generator.calls.load(Ordering::SeqCst), 1);
    assert!(!response.used_ai);
    assert_eq!(response.answer, semantic_search::composer::RECALL_ANSWER);
    assert_eq!(response.confidence, Some(Confidence::High));
}

#[tokio::test]
async fn offline_search_reports_connectivity_and_is_not_cached() {
    let s = setup("unused");
    let response = s
        .engine(false)
        .search_with_cache("user1", "anything")
        .await
        .unwrap();

    assert_eq!(response.answer, semantic_search::composer::OFFLINE_ANSWER);
    assert!(response.confidence.is_none());
    assert!(s.cache.rows.read().await.is_empty());
}

#[tokio::test]
async fn cache_hit_skips_recomputation_while_corpus_is_unchanged() {
    let s = setup("unused");
    s.store
        .seed(
            "user1",
            "https://a.example.net/one",
            "Pan Searing Basics",
            vector_with_similarity(0.95),
            Utc::now(),
        )
        .await;

    let engine = s.engine(true);
    let first = engine
        .search_with_cache("user1", "cooking  Steak tips")
        .await
        .unwrap();
    let embeds_after_first = s.embedder.calls.load(Ordering::SeqCst);

    // Different whitespace/case normalizes to the same cache key.
    let second = engine
        .search_with_cache("user1", "  COOKING steak   tips ")
        .await
        .unwrap();

    assert_eq!(s.embedder.calls.load(Ordering::SeqCst), embeds_after_first);
    assert_eq!(first.sources.len(), second.sources.len());
    assert_eq!(first.answer, second.answer);
}

#[tokio::test]
async fn new_memory_invalidates_the_cached_response() {
    let s = setup("unused");
    s.store
        .seed(
            "user1",
            "https://a.example.net/one",
            "Pan Searing Basics",
            vector_with_similarity(0.95),
            Utc::now(),
        )
        .await;

    let engine = s.engine(true);
    let first = engine
        .search_with_cache("user1", "cooking steak tips")
        .await
        .unwrap();
    assert_eq!(first.sources.len(), 1);

    // Ingest a second relevant memory: the snapshot marker moves.
    s.store
        .seed(
            "user1",
            "https://b.example.net/two",
            "Charcoal Grilling Notes",
            vector_with_similarity(0.93),
            Utc::now() + chrono::Duration::seconds(1),
        )
        .await;

    let second = engine
        .search_with_cache("user1", "cooking steak tips")
        .await
        .unwrap();

    // A stale cache hit would still show one source.
    assert_eq!(second.sources.len(), 2);
}
