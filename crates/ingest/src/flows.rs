//! Single-item save flows: the interactive add-memory path and bookmark
//! import. Both reuse the fetch capability with flow-specific timeouts and
//! funnel into the shared persistence path.

use std::sync::Arc;

use ai_client::{EmbeddingService, Summarizer};
use chrono::Utc;
use fetch_pool::Fetcher;
use memex_core::config::IngestConfig;
use memex_core::error::MemexError;
use memex_core::store::MemoryStore;
use memex_core::text::time_ago;
use memex_core::types::{ExtractedContent, SourceType};
use memex_core::urls::{canonicalize_url, is_blocked};
use tracing::info;

use crate::persist::{persist_page, PageToSave};

/// User-initiated save flows over the shared service dependencies.
pub struct SaveFlows {
    store: Arc<dyn MemoryStore>,
    fetcher: Arc<dyn Fetcher>,
    summarizer: Arc<dyn Summarizer>,
    embedder: Arc<dyn EmbeddingService>,
    config: IngestConfig,
}

impl SaveFlows {
    pub fn new(
        store: Arc<dyn MemoryStore>,
        fetcher: Arc<dyn Fetcher>,
        summarizer: Arc<dyn Summarizer>,
        embedder: Arc<dyn EmbeddingService>,
        config: IngestConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            summarizer,
            embedder,
            config,
        }
    }

    /// Saves one URL the user typed in, with an optional intent annotation.
    ///
    /// Blocked URLs and duplicates are user-facing errors; the fetch runs
    /// under the interactive 30s timeout.
    pub async fn save_single_url(
        &self,
        user_id: &str,
        url: &str,
        intent: &str,
    ) -> Result<i64, MemexError> {
        let intent = check_intent(intent);
        let canonical_url = canonicalize_url(url);

        if is_blocked(url) {
            return Err(MemexError::Blocked(
                "This URL is blocked (social media, login pages, or documentation sites are filtered out)"
                    .to_string(),
            ));
        }

        let content = self
            .fetch_with_timeout(url, self.config.single_url_timeout)
            .await?
            .ok_or_else(|| {
                MemexError::Extraction(
                    "Failed to fetch content from URL. The page might be inaccessible or contain insufficient content."
                        .to_string(),
                )
            })?;

        if let Some(existing) = self
            .store
            .find_by_canonical_url(user_id, &canonical_url)
            .await
            .map_err(|e| MemexError::Storage(e.to_string()))?
        {
            return Err(MemexError::AlreadySaved(time_ago(
                existing.created_at,
                Utc::now(),
            )));
        }

        let title = if content.title.trim().is_empty() {
            "Untitled".to_string()
        } else {
            content.title.clone()
        };

        let id = persist_page(
            &self.store,
            &self.summarizer,
            &self.embedder,
            user_id,
            PageToSave {
                url: url.to_string(),
                canonical_url,
                title,
                content: content.content,
                intent,
                source_type: SourceType::Manual,
            },
        )
        .await
        .map_err(|e| MemexError::Storage(e.to_string()))?;

        info!(id, url = %url, "single URL saved");
        Ok(id)
    }

    /// Imports one bookmark. Runs under the 15s bookmark timeout; transport
    /// failures surface the human-readable reason from the extractor.
    pub async fn import_bookmark(&self, user_id: &str, url: &str) -> Result<i64, MemexError> {
        let content = self
            .fetch_with_timeout(url, self.config.bookmark_fetch_timeout)
            .await?
            .ok_or_else(|| MemexError::Extraction("Failed to extract content".to_string()))?;

        if content.content_length < self.config.min_content_length {
            return Err(MemexError::Extraction(
                "Content too short - Not enough meaningful content".to_string(),
            ));
        }

        let canonical_url = canonicalize_url(url);
        if let Some(existing) = self
            .store
            .find_by_canonical_url(user_id, &canonical_url)
            .await
            .map_err(|e| MemexError::Storage(e.to_string()))?
        {
            return Err(MemexError::AlreadySaved(time_ago(
                existing.created_at,
                Utc::now(),
            )));
        }

        let title = if content.title.trim().is_empty() {
            url.to_string()
        } else {
            content.title.clone()
        };

        let id = persist_page(
            &self.store,
            &self.summarizer,
            &self.embedder,
            user_id,
            PageToSave {
                url: url.to_string(),
                canonical_url,
                title,
                content: content.content,
                intent: None,
                source_type: SourceType::BookmarkImport,
            },
        )
        .await
        .map_err(|e| MemexError::Storage(e.to_string()))?;

        info!(id, url = %url, "bookmark imported");
        Ok(id)
    }

    /// Runs one fetch under an external timeout. The timeout cancels only
    /// this operation, never sibling work.
    async fn fetch_with_timeout(
        &self,
        url: &str,
        timeout: std::time::Duration,
    ) -> Result<Option<ExtractedContent>, MemexError> {
        match tokio::time::timeout(timeout, self.fetcher.fetch(url)).await {
            Ok(Ok(content)) => Ok(content),
            // The extractor already maps transport failures to user-facing
            // reasons; pass those through instead of double-wrapping.
            Ok(Err(e)) => Err(match e.downcast::<MemexError>() {
                Ok(memex_err) => memex_err,
                Err(other) => MemexError::Network(other.to_string()),
            }),
            Err(_) => Err(MemexError::Network(
                "Request timeout - the page took too long to load".to_string(),
            )),
        }
    }
}

fn check_intent(intent: &str) -> Option<String> {
    let trimmed = intent.trim();
    (!trimmed.is_empty()).then(|| intent.to_string())
}
