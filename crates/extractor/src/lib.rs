//! # Content Extractor
//!
//! Given raw HTML or a URL, strips boilerplate and returns readable article
//! text with title, word count and reading time. Leaf dependency used by both
//! the ingestion and capture pipelines.
//!
//! Returning `None` is the normal skip signal (no article found, or content
//! below the minimum length); it is not a failure. Transport failures are
//! errors, carrying a user-legible reason instead of a raw error code.

use std::time::Duration;

use async_trait::async_trait;
use fetch_pool::Fetcher;
use memex_core::error::MemexError;
use memex_core::types::ExtractedContent;
use memex_core::Connectivity;
use tracing::{debug, warn};

mod readability;

pub use readability::extract_from_html;

/// Browser-like user agent; some sites serve bot UAs an empty shell.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub fetch_timeout: Duration,
    pub min_content_length: usize,
    pub user_agent: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            min_content_length: 400,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// HTML-to-article extractor with an HTTP client for URL-based extraction.
#[derive(Debug, Clone)]
pub struct Extractor {
    client: reqwest::Client,
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Result<Self, MemexError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| MemexError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self, MemexError> {
        Self::new(ExtractorConfig::default())
    }

    /// Extracts the main article from already-fetched HTML.
    pub fn extract_html(&self, html: &str, url: &str) -> Option<ExtractedContent> {
        let extracted = readability::extract_from_html(html, self.config.min_content_length);
        if extracted.is_none() {
            debug!(url = %url, "no readable article in HTML");
        }
        extracted
    }

    /// Fetches the URL with the configured timeout and extracts the article.
    ///
    /// Non-2xx responses are a skip (`Ok(None)`); transport errors carry the
    /// human-readable reason from [`describe_fetch_error`].
    pub async fn extract_url(&self, url: &str) -> Result<Option<ExtractedContent>, MemexError> {
        self.extract_url_with_timeout(url, self.config.fetch_timeout)
            .await
    }

    /// Same as [`extract_url`](Self::extract_url) with an explicit per-call
    /// timeout (15s bookmark imports, 30s interactive saves).
    pub async fn extract_url_with_timeout(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Option<ExtractedContent>, MemexError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| MemexError::Network(describe_fetch_error(&e)))?;

        if !response.status().is_success() {
            debug!(url = %url, status = %response.status(), "non-success response, skipping");
            return Ok(None);
        }

        let html = response
            .text()
            .await
            .map_err(|e| MemexError::Network(describe_fetch_error(&e)))?;

        Ok(self.extract_html(&html, url))
    }
}

#[async_trait]
impl Fetcher for Extractor {
    async fn fetch(&self, url: &str) -> Result<Option<ExtractedContent>, anyhow::Error> {
        Ok(self.extract_url(url).await?)
    }
}

/// Maps a transport error to the reason string shown to users, instead of
/// leaking raw error codes.
pub fn describe_fetch_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        return "Connection timeout - Site took too long to respond".to_string();
    }

    // reqwest wraps hyper/rustls causes; the chain text is the only stable
    // way to tell DNS failures from refusals across platforms.
    let chain = format!("{err:?}").to_lowercase();
    if chain.contains("dns") || chain.contains("resolve") || chain.contains("not found") {
        "Site not found - Invalid URL".to_string()
    } else if chain.contains("refused") {
        "Connection refused - Site is not accessible".to_string()
    } else if chain.contains("reset") {
        "Connection reset - Site closed the connection".to_string()
    } else if chain.contains("certificate") || chain.contains("tls") || chain.contains("ssl") {
        "SSL certificate error - Site security certificate is invalid".to_string()
    } else if err.is_connect() {
        "Connection failed - Site is not reachable".to_string()
    } else {
        format!("Request failed - {err}")
    }
}

/// Bounded GET probe against a known-reachable host.
pub struct ReqwestConnectivity {
    client: reqwest::Client,
    probe_url: String,
    timeout: Duration,
}

impl ReqwestConnectivity {
    pub fn new(probe_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            probe_url: probe_url.into(),
            timeout,
        }
    }
}

impl Default for ReqwestConnectivity {
    fn default() -> Self {
        Self::new("https://www.google.com", Duration::from_secs(5))
    }
}

#[async_trait]
impl Connectivity for ReqwestConnectivity {
    async fn is_online(&self) -> bool {
        match self
            .client
            .get(&self.probe_url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(error = %e, "connectivity probe failed");
                false
            }
        }
    }
}
