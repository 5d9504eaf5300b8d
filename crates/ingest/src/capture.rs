//! Web-capture processor: handles requests arriving over the local control
//! channel (browser extension → capture host → TCP loopback → here).
//!
//! Never returns an error to the transport; every failure becomes an
//! `ok:false` response with a reason string the extension can show.

use std::sync::Arc;

use ai_client::{EmbeddingService, Summarizer};
use chrono::Utc;
use memex_core::store::MemoryStore;
use memex_core::text::{excerpt_of, time_ago, to_single_line};
use memex_core::types::{CaptureRequest, CaptureResponse, ProcessedCapture, SourceType};
use memex_core::urls::canonicalize_url;
use tracing::{info, warn};

use crate::persist::{persist_page, PageToSave};

/// Processes validated capture requests into saved memories.
pub struct CaptureProcessor {
    store: Arc<dyn MemoryStore>,
    summarizer: Arc<dyn Summarizer>,
    embedder: Arc<dyn EmbeddingService>,
}

impl CaptureProcessor {
    pub fn new(
        store: Arc<dyn MemoryStore>,
        summarizer: Arc<dyn Summarizer>,
        embedder: Arc<dyn EmbeddingService>,
    ) -> Self {
        Self {
            store,
            summarizer,
            embedder,
        }
    }

    pub async fn process(&self, user_id: &str, req: CaptureRequest) -> CaptureResponse {
        let mut content = req.text.clone().unwrap_or_default();
        let mut title = req.title.clone().unwrap_or_default();
        let mut byline: Option<String> = None;
        let mut excerpt: Option<String> = None;
        let mut word_count = req.word_count.unwrap_or(0);
        let mut reading_time: Option<u32> = None;

        let selected_only = req.selected_only.unwrap_or(false);
        let canonical_url = req.url.as_deref().map(canonicalize_url);

        // Selected-text saves are intentionally exempt from dedup: saving a
        // second snippet from an already-saved page is a new memory.
        if let (Some(canonical), false) = (&canonical_url, selected_only) {
            match self.store.find_by_canonical_url(user_id, canonical).await {
                Ok(Some(existing)) => {
                    let ago = time_ago(existing.created_at, Utc::now());
                    return CaptureResponse {
                        id: req.id,
                        ok: false,
                        reason: Some(format!("You saved this {ago}.")),
                        processed: Some(ProcessedCapture {
                            saved_id: Some(existing.id.to_string()),
                            ..ProcessedCapture::default()
                        }),
                    };
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "dedup lookup failed");
                    return CaptureResponse::failure(req.id, "internal_error");
                }
            }
        }

        // Prefer a readability pass over the raw HTML when the extension
        // sent it; the extension's plain-text fallback stays otherwise.
        if let Some(html) = req.html.as_deref().filter(|h| !h.is_empty()) {
            let url = req.url.as_deref().unwrap_or("");
            if let Some(processed) = extractor::extract_from_html(html, 1) {
                if !processed.title.is_empty() {
                    title = processed.title;
                }
                if !processed.content.is_empty() {
                    content = processed.content;
                }
                byline = processed.byline;
                excerpt = Some(processed.excerpt);
                word_count = processed.word_count;
                reading_time = Some(processed.reading_time);
            } else {
                info!(url = %url, "readability pass found no article, keeping extension text");
            }
        }

        let excerpt = excerpt.unwrap_or_else(|| excerpt_of(&content, 300));

        let single_line_content = to_single_line(&content);
        let single_line_excerpt = to_single_line(&excerpt);

        let page = PageToSave {
            url: req.url.clone().unwrap_or_default(),
            canonical_url: canonical_url.clone().unwrap_or_default(),
            title: title.clone(),
            content: single_line_content.clone(),
            intent: None,
            source_type: SourceType::WebCapture,
        };

        match persist_page(&self.store, &self.summarizer, &self.embedder, user_id, page).await {
            Ok(saved_id) => CaptureResponse {
                id: req.id,
                ok: true,
                reason: None,
                processed: Some(ProcessedCapture {
                    url: req.url,
                    canonical_url,
                    title: Some(title),
                    content: Some(single_line_content),
                    word_count: Some(word_count),
                    excerpt: Some(single_line_excerpt),
                    byline,
                    reading_time,
                    saved_id: Some(saved_id.to_string()),
                }),
            },
            Err(e) => {
                warn!(error = %e, "capture persistence failed");
                CaptureResponse::failure(req.id, "internal_error")
            }
        }
    }
}
