//! OpenAI implementation of the generative collaborators.
//!
//! One client serves all four calls. Summaries and embeddings are cached by
//! content hash; every call passes the keyed rate gate first so consecutive
//! calls sharing a key keep their minimum spacing.

use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    CreateEmbeddingRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use memex_core::types::HistoryEntry;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::cache::HashCache;
use crate::config::AiConfig;
use crate::prompts;
use crate::rate_limit::RateGate;
use crate::{AnswerGenerator, EmbeddingService, SourceExcerpt, Summarizer, UrlSelector};
use crate::MAX_INPUT_CHARS;

const CACHE_CAPACITY: usize = 1000;

/// OpenAI-backed collaborator client. Holds the async-openai client, model
/// names, content-hash caches and the rate gate.
pub struct OpenAiClient {
    client: Client<async_openai::config::OpenAIConfig>,
    chat_model: String,
    ranking_model: String,
    embedding_model: String,
    summary_cache: HashCache<String>,
    embedding_cache: HashCache<Vec<f32>>,
    rate_gate: RateGate,
}

impl OpenAiClient {
    /// Creates a client from config. If the key is empty, falls back to the
    /// OPENAI_API_KEY environment variable.
    pub fn new(config: &dyn AiConfig) -> Self {
        let api_key = if config.api_key().is_empty() {
            std::env::var("OPENAI_API_KEY").unwrap_or_default()
        } else {
            config.api_key().to_string()
        };

        let mut openai_config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = config.base_url().filter(|s| !s.is_empty()) {
            openai_config = openai_config.with_api_base(url);
        }
        let client = Client::with_config(openai_config);

        Self {
            client,
            chat_model: config.chat_model().to_string(),
            ranking_model: config.ranking_model().to_string(),
            embedding_model: config.embedding_model().to_string(),
            summary_cache: HashCache::new(CACHE_CAPACITY),
            embedding_cache: HashCache::new(CACHE_CAPACITY),
            rate_gate: RateGate::default(),
        }
    }

    /// Replaces the rate gate (tests use a zero-interval gate).
    pub fn with_rate_gate(mut self, gate: RateGate) -> Self {
        self.rate_gate = gate;
        self
    }

    fn validate_input(text: &str) -> Result<(), anyhow::Error> {
        if text.trim().is_empty() {
            anyhow::bail!("Invalid input: text must be a non-empty string");
        }
        if text.len() > MAX_INPUT_CHARS {
            anyhow::bail!("Text too long. Maximum 20,000 characters");
        }
        Ok(())
    }

    async fn chat(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, anyhow::Error> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(temperature)
            .max_tokens(max_tokens)
            .build()?;

        let response = self.client.chat().create(request).await?;

        if let Some(ref usage) = response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "OpenAI chat usage"
            );
        }

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();
        Ok(content)
    }
}

#[async_trait]
impl Summarizer for OpenAiClient {
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn summarize(&self, text: &str) -> Result<String, anyhow::Error> {
        Self::validate_input(text)?;

        let cache_key = HashCache::<String>::key_for(text);
        if let Some(cached) = self.summary_cache.get(&cache_key) {
            debug!("returning cached summary");
            return Ok(cached);
        }

        self.rate_gate.wait("summarize").await;
        info!(model = %self.chat_model, "step: generating summary");

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(prompts::SUMMARY_SYSTEM_PROMPT)
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompts::build_summary_user_prompt(text))
                .build()?
                .into(),
        ];

        let summary = self.chat(&self.chat_model, messages, 0.5, 150).await?;
        self.summary_cache.put(cache_key, summary.clone());
        Ok(summary)
    }
}

#[async_trait]
impl EmbeddingService for OpenAiClient {
    #[instrument(skip(self, text), fields(model = %self.embedding_model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        Self::validate_input(text)?;

        let cache_key = HashCache::<Vec<f32>>::key_for(text);
        if let Some(cached) = self.embedding_cache.get(&cache_key) {
            debug!("returning cached embedding");
            return Ok(cached);
        }

        self.rate_gate.wait("embed").await;

        let request = CreateEmbeddingRequestArgs::default()
            .model(self.embedding_model.clone())
            .input(vec![text])
            .build()?;

        let response = self.client.embeddings().create(request).await?;
        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .unwrap_or_default();

        if embedding.is_empty() {
            anyhow::bail!("Invalid embedding returned from API");
        }

        info!(dimension = embedding.len(), "step: embedding generated");
        self.embedding_cache.put(cache_key, embedding.clone());
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        for text in texts {
            Self::validate_input(text)?;
        }

        self.rate_gate.wait("embed").await;

        let request = CreateEmbeddingRequestArgs::default()
            .model(self.embedding_model.clone())
            .input(texts.to_vec())
            .build()?;

        let response = self.client.embeddings().create(request).await?;
        let embeddings: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();

        if embeddings.len() != texts.len() {
            anyhow::bail!(
                "Embedding count mismatch: requested {}, got {}",
                texts.len(),
                embeddings.len()
            );
        }
        Ok(embeddings)
    }
}

/// Formats history candidates as the compact JSON list the ranking prompt
/// expects: most recent first, 1-based index, url, title, visit count.
fn prepare_urls_for_selection(entries: &[HistoryEntry]) -> String {
    let mut sorted: Vec<&HistoryEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.visit_time.cmp(&a.visit_time));

    let url_data: Vec<serde_json::Value> = sorted
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            json!({
                "index": index + 1,
                "url": entry.url,
                "title": entry.title,
                "visitCount": entry.visit_count,
            })
        })
        .collect();

    serde_json::to_string_pretty(&url_data).unwrap_or_else(|_| "[]".to_string())
}

#[async_trait]
impl UrlSelector for OpenAiClient {
    #[instrument(skip(self, entries), fields(candidate_count = entries.len(), desired))]
    async fn select_urls(
        &self,
        entries: &[HistoryEntry],
        desired: usize,
    ) -> Result<Vec<String>, anyhow::Error> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        self.rate_gate.wait("select_urls").await;
        info!(model = %self.ranking_model, "step: ranking history URLs");

        let url_data = prepare_urls_for_selection(entries);
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(prompts::build_selection_system_prompt(desired))
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompts::build_selection_user_prompt(&url_data, desired))
                .build()?
                .into(),
        ];

        let raw = self.chat(&self.ranking_model, messages, 0.1, 1500).await?;

        // Malformed output degrades to an empty selection, never an error.
        match serde_json::from_str::<Vec<String>>(raw.trim()) {
            Ok(mut urls) => {
                urls.truncate(desired);
                info!(selected = urls.len(), "step: ranking done");
                Ok(urls)
            }
            Err(e) => {
                warn!(error = %e, raw_preview = %raw.chars().take(200).collect::<String>(), "failed to parse URL selection output");
                Ok(Vec::new())
            }
        }
    }
}

/// Formats candidate sources as the numbered excerpts the answer prompt cites.
fn format_sources_for_answer(sources: &[SourceExcerpt]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(index, source)| {
            format!(
                "[{}] {}\nURL: {}\nSummary: {}",
                index + 1,
                source.title,
                source.url,
                source.summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl AnswerGenerator for OpenAiClient {
    #[instrument(skip(self, query, sources), fields(source_count = sources.len()))]
    async fn generate_answer(
        &self,
        query: &str,
        sources: &[SourceExcerpt],
    ) -> Result<String, anyhow::Error> {
        self.rate_gate.wait("answer").await;
        info!(model = %self.chat_model, "step: generating grounded answer");

        let sources_text = format_sources_for_answer(sources);
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(prompts::ANSWER_SYSTEM_PROMPT)
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompts::build_answer_user_prompt(&sources_text, query))
                .build()?
                .into(),
        ];

        self.chat(&self.chat_model, messages, 0.7, 500).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(url: &str, days_ago: i64, visits: u32) -> HistoryEntry {
        HistoryEntry {
            url: url.to_string(),
            title: format!("Title for {url}"),
            visit_time: Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
                - chrono::Duration::days(days_ago),
            visit_count: visits,
            typed_count: None,
            last_visit_time: None,
        }
    }

    #[test]
    fn selection_payload_is_recency_sorted_with_one_based_indices() {
        let entries = vec![
            entry("https://old.example.com/a", 9, 3),
            entry("https://new.example.com/b", 1, 1),
        ];
        let payload = prepare_urls_for_selection(&entries);
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&payload).unwrap();

        assert_eq!(parsed[0]["index"], 1);
        assert_eq!(parsed[0]["url"], "https://new.example.com/b");
        assert_eq!(parsed[1]["url"], "https://old.example.com/a");
        assert_eq!(parsed[1]["visitCount"], 3);
    }

    #[test]
    fn answer_sources_are_numbered_from_one() {
        let sources = vec![
            SourceExcerpt {
                title: "First".into(),
                url: "https://a.example.com".into(),
                summary: "About A.".into(),
            },
            SourceExcerpt {
                title: "Second".into(),
                url: "https://b.example.com".into(),
                summary: "About B.".into(),
            },
        ];
        let formatted = format_sources_for_answer(&sources);
        assert!(formatted.starts_with("[1] First"));
        assert!(formatted.contains("[2] Second"));
        assert!(formatted.contains("URL: https://b.example.com"));
    }
}
