//! # AI Client
//!
//! Interfaces for the four generative collaborators the pipelines consume:
//! summarization, embedding, history-URL ranking, and answer synthesis.
//! All four are fallible, rate-limited, and cacheable by content hash.
//!
//! The traits keep the pipelines testable without network access; the
//! [`OpenAiClient`] implements all four against the OpenAI API.

use async_trait::async_trait;
use memex_core::types::HistoryEntry;
use serde::{Deserialize, Serialize};

mod cache;
mod config;
mod openai;
mod prompts;
mod rate_limit;

pub use cache::HashCache;
pub use config::{AiConfig, EnvAiConfig};
pub use openai::OpenAiClient;
pub use rate_limit::RateGate;

/// Input cap applied to summarization and embedding calls.
pub const MAX_INPUT_CHARS: usize = 20_000;

/// Produces a short synopsis of article text (2-3 sentences).
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String, anyhow::Error>;
}

/// Service for generating text embeddings.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Generates an embedding vector for a single text string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error>;

    /// Generates embedding vectors for multiple texts in a single API call.
    /// This is more efficient than calling `embed` multiple times.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error>;
}

/// Ranks browsing-history candidates and returns the URLs most worth
/// remembering, best first, capped at `desired`.
///
/// Malformed collaborator output degrades to an empty list, never an error.
#[async_trait]
pub trait UrlSelector: Send + Sync {
    async fn select_urls(
        &self,
        entries: &[HistoryEntry],
        desired: usize,
    ) -> Result<Vec<String>, anyhow::Error>;
}

/// One candidate source handed to the answer generator, formatted upstream as
/// a numbered excerpt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceExcerpt {
    pub title: String,
    pub url: String,
    pub summary: String,
}

/// Synthesizes a grounded answer from the query plus candidate sources.
/// Returns free text containing bracketed numeric citations (`[1]`, `[2]`);
/// extracting and validating citations is the composer's job.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate_answer(
        &self,
        query: &str,
        sources: &[SourceExcerpt],
    ) -> Result<String, anyhow::Error>;
}
