//! Text cleanup helpers shared by the persistence path and the bridge.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

/// Input cap applied before summarization/embedding.
pub const MAX_PROCESSING_CHARS: usize = 20_000;

static FOOTER_NOISE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)Copyright.*$",
        r"(?i)All rights reserved.*$",
        r"(?i)subscribe to our newsletter.*",
        r"(?i)follow us on.*$",
        r"(?i)sign up to read more.*",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("footer pattern must compile"))
    .collect()
});

/// Collapses whitespace and strips common footer noise (copyright lines,
/// newsletter and social prompts, paywall teasers).
pub fn clean_content(text: &str) -> String {
    let mut out = text.split_whitespace().collect::<Vec<_>>().join(" ");
    for pattern in FOOTER_NOISE.iter() {
        out = pattern.replace(&out, "").into_owned();
    }
    out.trim().to_string()
}

/// Caps text at the processing limit, slicing on a char boundary.
pub fn trim_for_processing(text: &str) -> &str {
    match text.char_indices().nth(MAX_PROCESSING_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Collapses all whitespace runs (including newlines) to single spaces.
pub fn to_single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max_chars` characters, on a char boundary.
pub fn excerpt_of(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Human-readable age of a timestamp: "just now", "5 minutes ago",
/// "3 weeks ago", "2 months ago".
pub fn time_ago(from: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - from).num_seconds().max(0);

    const MINUTE: i64 = 60;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;
    const WEEK: i64 = 7 * DAY;
    const MONTH: i64 = 30 * DAY;

    if diff < MINUTE {
        "just now".to_string()
    } else if diff < HOUR {
        format!("{} minutes ago", diff / MINUTE)
    } else if diff < DAY {
        format!("{} hours ago", diff / HOUR)
    } else if diff < WEEK {
        format!("{} days ago", diff / DAY)
    } else if diff < MONTH {
        format!("{} weeks ago", diff / WEEK)
    } else {
        format!("{} months ago", diff / MONTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn clean_content_strips_footer_noise() {
        let cleaned = clean_content("Real   article text. Copyright 2024 Acme Inc.");
        assert_eq!(cleaned, "Real article text.");
    }

    #[test]
    fn trim_for_processing_caps_length() {
        let long = "x".repeat(MAX_PROCESSING_CHARS + 50);
        assert_eq!(trim_for_processing(&long).len(), MAX_PROCESSING_CHARS);
        assert_eq!(trim_for_processing("short"), "short");
    }

    #[test]
    fn time_ago_buckets() {
        let now = Utc::now();
        assert_eq!(time_ago(now, now), "just now");
        assert_eq!(time_ago(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(time_ago(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(time_ago(now - Duration::days(2), now), "2 days ago");
        assert_eq!(time_ago(now - Duration::days(10), now), "1 weeks ago");
        assert_eq!(time_ago(now - Duration::days(90), now), "3 months ago");
    }

    #[test]
    fn time_ago_never_negative() {
        let now = Utc::now();
        assert_eq!(time_ago(now + Duration::minutes(5), now), "just now");
    }
}
