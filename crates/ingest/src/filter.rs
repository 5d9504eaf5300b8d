//! History filtering: blocklist exclusion, URL dedup, and the recency cap
//! applied before candidates go to the ranking collaborator.

use memex_core::types::HistoryEntry;
use memex_core::urls::{is_blocked, normalize_for_dedup};
use std::collections::HashMap;
use tracing::debug;

/// Drops entries matching the fixed domain/pattern blocklist. A hard
/// exclude: blocked entries are never scored. Idempotent by construction.
pub fn apply_blocklist(entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    let before = entries.len();
    let kept: Vec<HistoryEntry> = entries
        .into_iter()
        .filter(|entry| !is_blocked(&entry.url))
        .collect();
    debug!(before, after = kept.len(), "blocklist applied");
    kept
}

/// Collapses duplicate URLs (lowercased, trailing slash stripped), keeping
/// the entry with the higher visit count.
pub fn dedup_by_url(entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    let mut seen: HashMap<String, HistoryEntry> = HashMap::new();

    for entry in entries {
        let key = normalize_for_dedup(&entry.url);
        match seen.get(&key) {
            Some(existing) if existing.visit_count >= entry.visit_count => {}
            _ => {
                seen.insert(key, entry);
            }
        }
    }

    seen.into_values().collect()
}

/// Sorts by recency (most recent visit first) and caps the candidate set, so
/// truncation favors fresh browsing.
pub fn cap_for_selection(mut entries: Vec<HistoryEntry>, max: usize) -> Vec<HistoryEntry> {
    entries.sort_by(|a, b| b.visit_time.cmp(&a.visit_time));
    entries.truncate(max);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn entry(url: &str, visits: u32, days_ago: i64) -> HistoryEntry {
        HistoryEntry {
            url: url.to_string(),
            title: url.to_string(),
            visit_time: Utc::now() - Duration::days(days_ago),
            visit_count: visits,
            typed_count: None,
            last_visit_time: None,
        }
    }

    #[test]
    fn blocklist_is_idempotent() {
        let entries = vec![
            entry("https://github.com/a/b", 1, 0),
            entry("https://a-blog.net/post", 1, 0),
            entry("https://youtube.com/watch?v=x", 3, 1),
            entry("https://example.com/docs/intro", 2, 2),
        ];

        let once = apply_blocklist(entries);
        let urls_once: Vec<&str> = once.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls_once, vec!["https://a-blog.net/post"]);

        let twice = apply_blocklist(once.clone());
        assert_eq!(
            once.iter().map(|e| &e.url).collect::<Vec<_>>(),
            twice.iter().map(|e| &e.url).collect::<Vec<_>>()
        );
    }

    #[test]
    fn dedup_keeps_the_higher_visit_count() {
        let entries = vec![
            entry("https://example.com/post/", 5, 0),
            entry("https://example.com/post", 1, 0),
        ];

        let deduped = dedup_by_url(entries);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].visit_count, 5);
        assert_eq!(deduped[0].url, "https://example.com/post/");
    }

    #[test]
    fn dedup_is_case_insensitive() {
        let entries = vec![
            entry("https://Example.com/Post", 2, 0),
            entry("https://example.com/post", 7, 0),
        ];
        let deduped = dedup_by_url(entries);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].visit_count, 7);
    }

    #[test]
    fn cap_prefers_recent_visits() {
        let entries = vec![
            entry("https://old.example.com", 1, 30),
            entry("https://newest.example.com", 1, 0),
            entry("https://newer.example.com", 1, 3),
        ];

        let capped = cap_for_selection(entries, 2);
        let urls: Vec<&str> = capped.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://newest.example.com", "https://newer.example.com"]
        );
    }
}
