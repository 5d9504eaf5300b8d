//! Tests for the web-capture processor.

mod common;

use std::sync::Arc;

use common::*;
use ingest::CaptureProcessor;
use memex_core::types::{CaptureRequest, SourceType};

fn request(id: &str, url: &str, text: &str) -> CaptureRequest {
    CaptureRequest {
        id: id.to_string(),
        url: Some(url.to_string()),
        title: Some("Extension Title".to_string()),
        text: Some(text.to_string()),
        html: None,
        word_count: Some(text.split_whitespace().count()),
        selected_only: None,
        node_count: None,
        html_size: None,
    }
}

fn processor(store: Arc<MockStore>) -> CaptureProcessor {
    CaptureProcessor::new(store, Arc::new(MockSummarizer), Arc::new(MockEmbeddingService))
}

#[tokio::test]
async fn capture_saves_and_echoes_the_processed_article() {
    let store = Arc::new(MockStore::new());
    let processor = processor(store.clone());

    let response = processor
        .process(
            "user1",
            request("req-1", "https://a-blog.net/post", "Some page body text."),
        )
        .await;

    assert!(response.ok);
    assert_eq!(response.id, "req-1");
    let processed = response.processed.unwrap();
    assert_eq!(processed.canonical_url.as_deref(), Some("https://a-blog.net/post"));
    assert!(processed.saved_id.is_some());

    let saved = store.entries.read().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].source_type, SourceType::WebCapture);
}

#[tokio::test]
async fn second_capture_of_the_same_page_reports_already_saved() {
    let store = Arc::new(MockStore::new());
    let processor = processor(store.clone());

    let first = processor
        .process("user1", request("req-1", "https://a-blog.net/post", "Body."))
        .await;
    assert!(first.ok);

    let second = processor
        .process("user1", request("req-2", "https://a-blog.net/post/", "Body."))
        .await;

    assert!(!second.ok);
    let reason = second.reason.unwrap();
    assert!(reason.starts_with("You saved this"), "reason: {reason}");
    // The existing row id is echoed so the extension can link to it.
    assert!(second.processed.unwrap().saved_id.is_some());
    assert_eq!(store.entries.read().await.len(), 1);
}

#[tokio::test]
async fn selected_text_saves_bypass_dedup() {
    let store = Arc::new(MockStore::new());
    let processor = processor(store.clone());

    processor
        .process("user1", request("req-1", "https://a-blog.net/post", "Full page."))
        .await;

    let mut snippet = request("req-2", "https://a-blog.net/post", "Just this sentence.");
    snippet.selected_only = Some(true);
    let response = processor.process("user1", snippet).await;

    assert!(response.ok);
    assert_eq!(store.entries.read().await.len(), 2);
}

#[tokio::test]
async fn html_payload_gets_a_readability_pass() {
    let store = Arc::new(MockStore::new());
    let processor = processor(store.clone());

    let paragraphs: String = (0..6)
        .map(|i| {
            format!(
                "<p>Paragraph {i} with plenty of real sentence content to clear the \
                 extraction threshold comfortably in this test document.</p>"
            )
        })
        .collect();
    let html = format!(
        "<html><head><title>Real Title</title></head><body><article>{paragraphs}</article></body></html>"
    );

    let mut req = request("req-1", "https://a-blog.net/post", "fallback text");
    req.html = Some(html);
    let response = processor.process("user1", req).await;

    assert!(response.ok);
    let processed = response.processed.unwrap();
    assert_eq!(processed.title.as_deref(), Some("Real Title"));
    assert!(processed.content.unwrap().contains("Paragraph 0"));
    assert!(processed.reading_time.is_some());
}
