//! Capture payload validation.
//!
//! Runs on the capture host before the network hop, so oversized pages are
//! rejected locally without ever contacting the application. Selected-text
//! requests get the tighter text-only check; full-page captures are bounded
//! on words, HTML bytes and DOM node count as well.

use memex_core::types::CaptureRequest;

/// Caps for full-page captures. Slightly above the extension's own limits to
/// allow minor counting differences between the two sides.
#[derive(Debug, Clone, Copy)]
pub struct PayloadLimits {
    pub text_chars: usize,
    pub html_bytes: usize,
    pub words: usize,
    pub node_count: usize,
}

impl Default for PayloadLimits {
    fn default() -> Self {
        Self {
            text_chars: 120_000,
            html_bytes: 350 * 1024,
            words: 25_000,
            node_count: 100_000,
        }
    }
}

/// Checks the request shape: non-empty `id`, `url` and `title`, and at least
/// one of `text`/`html`.
pub fn validate_shape(req: &CaptureRequest) -> Result<(), String> {
    if req.id.trim().is_empty() {
        return Err("invalid_request".to_string());
    }
    if req.url.as_deref().map_or(true, |u| u.trim().is_empty()) {
        return Err("invalid_request".to_string());
    }
    if req.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
        return Err("invalid_request".to_string());
    }
    if req.text.is_none() && req.html.is_none() {
        return Err("invalid_request".to_string());
    }
    Ok(())
}

/// Checks the payload size caps. The error string is the user-facing reason.
pub fn validate_payload(req: &CaptureRequest, limits: &PayloadLimits) -> Result<(), String> {
    let text_len = req.text.as_deref().map(|t| t.len()).unwrap_or(0);

    if req.selected_only.unwrap_or(false) {
        if text_len > limits.text_chars {
            return Err("Selected text too long to process.".to_string());
        }
        return Ok(());
    }

    if req.word_count.unwrap_or(0) > limits.words {
        return Err("Page contains too many words to process.".to_string());
    }
    if req.html_size.unwrap_or(0) > limits.html_bytes {
        return Err("HTML size too large to process.".to_string());
    }
    if req.node_count.unwrap_or(0) > limits.node_count {
        return Err("Page has too many DOM nodes to process.".to_string());
    }
    if text_len > limits.text_chars {
        return Err("Text content too long to process.".to_string());
    }
    Ok(())
}
