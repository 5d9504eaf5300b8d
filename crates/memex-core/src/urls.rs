//! # URL Canonicalization and Blocklist
//!
//! Canonical URLs are the per-user dedup key: lowercased host, stripped
//! `www.`, stripped tracking params, stripped fragment and trailing slash.
//!
//! The blocklist is a hard exclude applied before any scoring: domains that
//! never hold save-worthy articles (social media, video, webmail, package
//! registries, code hosting) and URL patterns that mark auth flows, official
//! docs, file downloads, and local/private addresses.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Canonicalizes a URL for dedup. Unparseable input is returned unchanged.
pub fn canonicalize_url(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw) else {
        return raw.to_string();
    };

    let normalized_host = parsed.host_str().map(|host| {
        let lowered = host.to_lowercase();
        lowered.strip_prefix("www.").unwrap_or(&lowered).to_string()
    });
    if let Some(host) = normalized_host {
        // set_host only fails for cannot-be-a-base URLs, which parse() above
        // already produced a host for.
        let _ = parsed.set_host(Some(&host));
    }

    parsed.set_fragment(None);

    let mut kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !k.starts_with("utm_") && k != "ref")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    kept.sort();
    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        let query = kept
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&query));
    }

    let trimmed = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&trimmed);

    parsed.to_string()
}

/// Normalizes a URL for history dedup: lowercase, trailing slash stripped.
/// Cheaper than full canonicalization; used to collapse visit rows.
pub fn normalize_for_dedup(url: &str) -> String {
    url.to_lowercase().trim_end_matches('/').to_string()
}

/// Hostname of a URL, if it parses.
pub fn hostname(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
}

const BLOCKED_DOMAINS: &[&str] = &[
    // Social media
    "twitter.com",
    "x.com",
    "facebook.com",
    "instagram.com",
    "linkedin.com",
    "reddit.com",
    "tiktok.com",
    "snapchat.com",
    "pinterest.com",
    // Video platforms
    "youtube.com",
    "youtu.be",
    "twitch.tv",
    "vimeo.com",
    // Email & communication
    "mail.google.com",
    "outlook.live.com",
    "outlook.office.com",
    "yahoo.com/mail",
    "slack.com",
    "discord.com",
    "teams.microsoft.com",
    "zoom.us",
    // Cloud storage
    "drive.google.com",
    "dropbox.com",
    "onedrive.live.com",
    "docs.google.com",
    // Package registries
    "npmjs.com",
    "npm.io",
    "cdnjs.com",
    "unpkg.com",
    "jsdelivr.net",
    "crates.io",
    // Icon libraries
    "lucide.dev",
    "fontawesome.com",
    "heroicons.com",
    "flaticon.com",
    // Search result pages
    "google.com/search",
    "bing.com/search",
    "duckduckgo.com/",
    // Analytics
    "analytics.google.com",
    // Code hosting
    "github.com",
    "gitlab.com",
    "bitbucket.org",
];

static BLOCKED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Auth flows
        r"(?i)/(login|signin|sign-in|signup|sign-up|register|auth|oauth|sso|callback|logout)",
        // API endpoints
        r"(?i)/api/",
        r"(?i)/graphql",
        // Official documentation paths
        r"(?i)/docs?/",
        r"(?i)/documentation/",
        r"(?i)/guide",
        r"(?i)/guides/",
        r"(?i)/reference",
        r"(?i)/getting-started",
        r"(?i)/quickstart",
        r"(?i)readthedocs\.io",
        // File downloads
        r"(?i)\.(pdf|zip|rar|tar|gz|exe|dmg|pkg|deb|rpm)$",
        // Media files
        r"(?i)\.(jpg|jpeg|png|gif|svg|webp|mp4|mp3|wav|avi|mov)$",
        // Local / private addresses
        r"(?i)localhost",
        r"127\.0\.0\.1",
        r"192\.168\.",
        r"(?i)\.local",
        r"(?i)^file://",
        // Redirect query params
        r"(?i)[?&](redirect|return|returnUrl|next|continue|callback)=",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("blocklist pattern must compile"))
    .collect()
});

/// True when the URL matches the fixed domain or pattern blocklist.
pub fn is_blocked(url: &str) -> bool {
    let lower = url.to_lowercase();
    if BLOCKED_DOMAINS.iter().any(|domain| lower.contains(domain)) {
        return true;
    }
    BLOCKED_PATTERNS.iter().any(|pattern| pattern.is_match(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_strips_www_tracking_and_trailing_slash() {
        let canon = canonicalize_url("https://WWW.Example.com/post/?utm_source=x&b=2&a=1&ref=tw#top");
        assert_eq!(canon, "https://example.com/post?a=1&b=2");
    }

    #[test]
    fn canonicalize_is_stable_across_equivalent_forms() {
        let a = canonicalize_url("https://www.example.com/article/");
        let b = canonicalize_url("https://example.com/article");
        assert_eq!(a, b);
    }

    #[test]
    fn canonicalize_leaves_garbage_untouched() {
        assert_eq!(canonicalize_url("not a url"), "not a url");
    }

    #[test]
    fn normalize_for_dedup_collapses_case_and_trailing_slash() {
        assert_eq!(
            normalize_for_dedup("https://Example.com/Post/"),
            "https://example.com/post"
        );
    }

    #[test]
    fn blocklist_catches_domains_and_patterns() {
        assert!(is_blocked("https://github.com/rust-lang/rust"));
        assert!(is_blocked("https://react.dev/docs/hooks"));
        assert!(is_blocked("https://example.com/login?next=/home"));
        assert!(is_blocked("http://localhost:3000/app"));
        assert!(is_blocked("https://example.com/report.pdf"));
        assert!(!is_blocked("https://some-blog.net/how-i-debugged-react"));
    }
}
