//! AI service configuration: trait and env-based implementation.

use anyhow::Result;
use std::env;

/// AI service configuration interface.
pub trait AiConfig: Send + Sync {
    /// API key for the OpenAI-compatible endpoint (OPENAI_API_KEY).
    fn api_key(&self) -> &str;
    /// Optional base URL for OpenAI-compatible endpoints (OPENAI_BASE_URL).
    fn base_url(&self) -> Option<&str>;
    /// Chat model used for summaries and answer synthesis.
    fn chat_model(&self) -> &str;
    /// Chat model used for history-URL ranking.
    fn ranking_model(&self) -> &str;
    fn embedding_model(&self) -> &str;
}

/// AI config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvAiConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub chat_model: String,
    pub ranking_model: String,
    pub embedding_model: String,
}

impl AiConfig for EnvAiConfig {
    fn api_key(&self) -> &str {
        &self.api_key
    }
    fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref().filter(|s| !s.is_empty())
    }
    fn chat_model(&self) -> &str {
        &self.chat_model
    }
    fn ranking_model(&self) -> &str {
        &self.ranking_model
    }
    fn embedding_model(&self) -> &str {
        &self.embedding_model
    }
}

impl EnvAiConfig {
    /// Load from environment variables.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        let base_url = env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let chat_model =
            env::var("MEMEX_CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let ranking_model =
            env::var("MEMEX_RANKING_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string());
        let embedding_model = env::var("MEMEX_EMBEDDING_MODEL")
            .unwrap_or_else(|_| "text-embedding-3-small".to_string());
        Ok(Self {
            api_key,
            base_url,
            chat_model,
            ranking_model,
            embedding_model,
        })
    }

    /// Validate config (AI-backed commands require an API key).
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            anyhow::bail!("OPENAI_API_KEY must be set");
        }
        Ok(())
    }
}
