//! Shared persistence path: clean → trim → summarize → embed → store.
//!
//! Every ingestion flow funnels through here, so all saved memories carry a
//! summary and an embedding computed the same way.

use std::sync::Arc;

use ai_client::{EmbeddingService, Summarizer};
use memex_core::store::MemoryStore;
use memex_core::text::{clean_content, trim_for_processing};
use memex_core::types::{NewMemory, SourceType};
use tracing::info;

/// A page ready to be persisted as a memory.
#[derive(Debug, Clone)]
pub struct PageToSave {
    pub url: String,
    pub canonical_url: String,
    pub title: String,
    pub content: String,
    pub intent: Option<String>,
    pub source_type: SourceType,
}

/// Cleans and trims the content, summarizes it, embeds the summary, and
/// inserts the memory. Returns the new row id.
pub async fn persist_page(
    store: &Arc<dyn MemoryStore>,
    summarizer: &Arc<dyn Summarizer>,
    embedder: &Arc<dyn EmbeddingService>,
    user_id: &str,
    page: PageToSave,
) -> Result<i64, anyhow::Error> {
    let cleaned = clean_content(&page.content);
    let trimmed = trim_for_processing(&cleaned);

    let summary = summarizer.summarize(trimmed).await?;
    // The embedding is computed from the summary, not the full content: the
    // summary fits the embedding input cap and carries the page's gist.
    let embedding = embedder.embed(&summary).await?;

    let id = store
        .insert(NewMemory {
            user_id: user_id.to_string(),
            url: page.url,
            canonical_url: page.canonical_url,
            title: page.title,
            content: cleaned,
            summary,
            intent: page.intent,
            embedding: Some(embedding),
            source_type: page.source_type,
        })
        .await?;

    info!(id, source_type = page.source_type.as_str(), "memory persisted");
    Ok(id)
}
