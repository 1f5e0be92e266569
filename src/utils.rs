//! Utility functions for string handling around scraped pages and LLM output.
//!
//! This module provides helper functions used throughout the application:
//! - String truncation for logging
//! - Code-fence stripping for LLM responses
//! - JSON error detection for handling LLM response truncation
//! - Whitespace normalization for extracted article text

use once_cell::sync::Lazy;
use regex::Regex;

static OPENING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_-]*[ \t]*\r?\n?").expect("valid fence regex"));

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (on a character
/// boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// When the LLM response is cut off (e.g., due to token limits), the
/// resulting JSON will fail to parse with an EOF error.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Remove a wrapping Markdown code fence from an LLM response.
///
/// Models often answer with ```` ```json\n{...}\n``` ```` even when asked
/// for bare JSON. The fence is removed only when the trimmed text both
/// starts and ends with triple backticks; an optional language tag after
/// the opening fence is dropped too.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() < 6 || !trimmed.starts_with("```") || !trimmed.ends_with("```") {
        return trimmed;
    }
    let inner = &trimmed[..trimmed.len() - 3];
    let inner = match OPENING_FENCE.find(inner) {
        Some(m) => &inner[m.end()..],
        None => &inner[3..],
    };
    inner.trim()
}

/// Normalize extracted article text into paragraphs.
///
/// Every line is trimmed, empty lines are dropped, and the remaining lines
/// are joined with a blank line between them.
pub fn normalize_text(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
