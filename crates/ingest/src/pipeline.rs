//! History ingestion state machine.
//!
//! Stages: filtering → ai-selection → fetching → complete, with an absorbing
//! error state reachable from any stage. Expected empty outcomes (everything
//! blocklisted, nothing selected) terminate in `complete` with an
//! explanatory message; they are not errors. Per-item persistence failures
//! are logged and skipped; they never abort the batch.

use std::collections::HashMap;
use std::sync::Arc;

use ai_client::{EmbeddingService, Summarizer, UrlSelector};
use fetch_pool::{FetchPool, FetchPoolConfig, Fetcher};
use memex_core::config::IngestConfig;
use memex_core::error::MemexError;
use memex_core::store::MemoryStore;
use memex_core::types::{
    FunnelStats, HistoryEntry, ProcessedEntry, ProcessingProgress, ProcessingResult,
    ProcessingStage, SourceType,
};
use memex_core::urls::{canonicalize_url, normalize_for_dedup};
use memex_core::Connectivity;
use tracing::{info, warn};

use crate::filter::{apply_blocklist, cap_for_selection, dedup_by_url};
use crate::persist::{persist_page, PageToSave};

/// Orchestrates one history import batch end to end.
pub struct HistoryPipeline {
    store: Arc<dyn MemoryStore>,
    fetcher: Arc<dyn Fetcher>,
    selector: Arc<dyn UrlSelector>,
    summarizer: Arc<dyn Summarizer>,
    embedder: Arc<dyn EmbeddingService>,
    connectivity: Arc<dyn Connectivity>,
    config: IngestConfig,
}

impl HistoryPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn MemoryStore>,
        fetcher: Arc<dyn Fetcher>,
        selector: Arc<dyn UrlSelector>,
        summarizer: Arc<dyn Summarizer>,
        embedder: Arc<dyn EmbeddingService>,
        connectivity: Arc<dyn Connectivity>,
        config: IngestConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            selector,
            summarizer,
            embedder,
            connectivity,
            config,
        }
    }

    /// Runs the batch. Progress events are pushed through `progress`; the
    /// terminal result always carries the full funnel stats.
    ///
    /// A failure before fetching (no connection, selector error) emits a
    /// terminal `error` event and returns `Err`.
    pub async fn run<F>(
        &self,
        user_id: &str,
        entries: Vec<HistoryEntry>,
        progress: &mut F,
    ) -> Result<ProcessingResult, MemexError>
    where
        F: FnMut(ProcessingProgress) + Send,
    {
        let mut stats = FunnelStats {
            total_input: entries.len(),
            ..FunnelStats::default()
        };

        match self.run_inner(user_id, entries, progress, &mut stats).await {
            Ok(result) => Ok(result),
            Err(e) => {
                progress(ProcessingProgress {
                    stage: ProcessingStage::Error,
                    message: e.to_string(),
                    progress: 0.0,
                    current_url: None,
                    stats,
                });
                Err(e)
            }
        }
    }

    async fn run_inner<F>(
        &self,
        user_id: &str,
        entries: Vec<HistoryEntry>,
        progress: &mut F,
        stats: &mut FunnelStats,
    ) -> Result<ProcessingResult, MemexError>
    where
        F: FnMut(ProcessingProgress) + Send,
    {
        emit(progress, ProcessingStage::Filtering, "Filtering browsing history...", 10.0, None, *stats);
        emit(progress, ProcessingStage::Filtering, "Checking internet connection...", 15.0, None, *stats);

        // Never report an empty batch when the real cause is a dead network.
        if !self.connectivity.is_online().await {
            return Err(MemexError::NoConnection);
        }

        emit(progress, ProcessingStage::Filtering, "Applying filters...", 20.0, None, *stats);

        let filtered = apply_blocklist(entries);
        stats.after_blocklist = filtered.len();

        if filtered.is_empty() {
            emit(progress, ProcessingStage::Complete, "No processable history found", 100.0, None, *stats);
            return Ok(ProcessingResult {
                success: true,
                processed_entries: Vec::new(),
                stats: *stats,
                message: "No processable browsing history found.".to_string(),
            });
        }

        let deduped = dedup_by_url(filtered);
        let candidates = cap_for_selection(deduped.clone(), self.config.max_urls_to_send_ai);
        stats.sent_to_ai = candidates.len();

        emit(
            progress,
            ProcessingStage::AiSelection,
            &format!("Analyzing {} URLs...", stats.sent_to_ai),
            30.0,
            None,
            *stats,
        );

        let selected = self
            .selector
            .select_urls(&candidates, self.config.ai_desired_selection)
            .await
            .map_err(|e| MemexError::Ai(e.to_string()))?;
        stats.ai_selected = selected.len();

        if selected.is_empty() {
            emit(progress, ProcessingStage::Complete, "No quality content found", 100.0, None, *stats);
            return Ok(ProcessingResult {
                success: true,
                processed_entries: Vec::new(),
                stats: *stats,
                message: "No quality content found in browsing history.".to_string(),
            });
        }

        emit(
            progress,
            ProcessingStage::AiSelection,
            &format!("Selected {} quality URLs", selected.len()),
            40.0,
            None,
            *stats,
        );
        emit(progress, ProcessingStage::Fetching, "Fetching content from selected URLs...", 50.0, None, *stats);

        let processed = self
            .fetch_selected(&selected, &deduped, progress, stats)
            .await;
        stats.successfully_fetched = processed.len();

        // Persist sequentially so per-item generative calls respect the
        // rate gate. One bad item never aborts the batch.
        let mut saved = 0usize;
        for entry in &processed {
            let page = PageToSave {
                url: entry.url.clone(),
                canonical_url: canonicalize_url(&entry.url),
                title: entry.title.clone(),
                content: entry.content.clone(),
                intent: None,
                source_type: SourceType::BrowserHistory,
            };
            match persist_page(&self.store, &self.summarizer, &self.embedder, user_id, page).await
            {
                Ok(_) => saved += 1,
                Err(e) => {
                    warn!(url = %entry.url, error = %e, "failed to save entry, skipping");
                }
            }
        }
        stats.final_count = saved;

        let message = if processed.is_empty() {
            "Could not extract content from selected URLs.".to_string()
        } else if saved < self.config.final_process_target {
            format!("Successfully processed {saved} articles.")
        } else {
            format!("Successfully processed {saved} high-quality articles.")
        };

        emit(
            progress,
            ProcessingStage::Complete,
            &format!("Successfully processed {saved} articles"),
            100.0,
            None,
            *stats,
        );

        info!(
            total_input = stats.total_input,
            after_blocklist = stats.after_blocklist,
            sent_to_ai = stats.sent_to_ai,
            ai_selected = stats.ai_selected,
            successfully_fetched = stats.successfully_fetched,
            final_count = stats.final_count,
            "history batch complete"
        );

        Ok(ProcessingResult {
            success: true,
            processed_entries: processed,
            stats: *stats,
            message,
        })
    }

    /// Runs the fetch pool over the selected URLs, interpolating progress
    /// across the 50-95 band and joining results back to their history
    /// entries by normalized URL.
    async fn fetch_selected<F>(
        &self,
        selected: &[String],
        original_entries: &[HistoryEntry],
        progress: &mut F,
        stats: &mut FunnelStats,
    ) -> Vec<ProcessedEntry>
    where
        F: FnMut(ProcessingProgress) + Send,
    {
        let entry_map: HashMap<String, &HistoryEntry> = original_entries
            .iter()
            .map(|entry| (normalize_for_dedup(&entry.url), entry))
            .collect();

        let pool = FetchPool::new(
            self.fetcher.clone(),
            FetchPoolConfig {
                concurrency: self.config.fetch_concurrency,
                job_timeout: self.config.fetch_timeout,
            },
        );

        let total = selected.len();
        let mut rx = pool.fetch_all(selected.to_vec());
        let mut processed = Vec::new();
        let mut completed = 0usize;

        while let Some(outcome) = rx.recv().await {
            completed += 1;
            let fetch_progress = 50.0 + (completed as f32 / total as f32) * 45.0;
            emit(
                progress,
                ProcessingStage::Fetching,
                &format!("Fetching content ({completed}/{total})..."),
                fetch_progress,
                Some(outcome.url.clone()),
                *stats,
            );

            let Some(content) = (outcome.success).then_some(outcome.content).flatten() else {
                continue;
            };

            let Some(original) = entry_map.get(&normalize_for_dedup(&outcome.url)) else {
                warn!(url = %outcome.url, "fetched URL missing from history set, skipping");
                continue;
            };

            let title = if original.title.trim().is_empty() {
                content.title.clone()
            } else {
                original.title.clone()
            };

            processed.push(ProcessedEntry {
                url: original.url.clone(),
                title,
                content: content.content,
                content_length: content.content_length,
                word_count: content.word_count,
                visit_count: original.visit_count,
                visit_time: original.visit_time,
            });
        }

        processed
    }
}

fn emit<F>(
    progress: &mut F,
    stage: ProcessingStage,
    message: &str,
    percent: f32,
    current_url: Option<String>,
    stats: FunnelStats,
) where
    F: FnMut(ProcessingProgress) + Send,
{
    progress(ProcessingProgress {
        stage,
        message: message.to_string(),
        progress: percent,
        current_url,
        stats,
    });
}
