//! Deep-link detection for recall item titles.
//!
//! A title is a deep link when, after trimming, it starts with an `http://`
//! or `https://` URL or any `scheme://` where the scheme is a letter followed
//! by letters, digits, `+`, `.` or `-`. Matching is anchored at the start.

use std::sync::LazyLock;

use regex::Regex;

static DEEPLINK_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)^https?://").expect("valid http pattern"),
        Regex::new(r"(?i)^[a-z][a-z0-9+.\-]*://").expect("valid scheme pattern"),
    ]
});

/// Whether `text` looks like a URL or app link.
#[must_use]
pub fn is_deeplink(text: &str) -> bool {
    let text = text.trim();
    DEEPLINK_PATTERNS.iter().any(|pattern| pattern.is_match(text))
}
