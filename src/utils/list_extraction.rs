//! List extraction from LLM responses.
//!
//! Turns one free-text reply into an ordered list of strings. Two shapes are
//! recognised:
//! 1. A numbered list (`1. first 2. second ...`) at the start of the reply,
//!    split directly without normalisation
//! 2. Anything else goes through [`normalize`], then the first bracketed span
//!    is parsed as a list literal
//!
//! Extraction never fails loudly: an unusable reply yields `None`.
//!
//! # Example
//!
//! ```
//! use prompt_forge::utils::extract_list;
//!
//! let reply = "Here you go:\n['What is a black hole?', 'Why is the sky blue?']";
//! assert_eq!(
//!     extract_list(reply),
//!     Some(vec!["What is a black hole?".to_string(), "Why is the sky blue?".to_string()])
//! );
//! assert_eq!(extract_list("I cannot help with that."), None);
//! ```

use std::sync::LazyLock;

use regex::Regex;

use super::literal::parse_literal_list;
use super::normalize::normalize;

static NUMBERED_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s").expect("valid regex"));
static NUMBERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\s").expect("valid regex"));

/// Extracts a list of strings from a raw reply.
///
/// Returns `Some(vec![])` for a legitimately empty list and `None` when no
/// list could be found or parsed.
pub fn extract_list(text: &str) -> Option<Vec<String>> {
    let text = text.trim_start();
    if NUMBERED_START.is_match(text) {
        return Some(split_numbered_list(text));
    }

    tracing::debug!(text = %text, "Normalizing reply");
    let normalized = normalize(text);
    tracing::debug!(text = %normalized, "Normalized reply");

    let body = find_bracketed_span(&normalized)?;
    match parse_literal_list(body) {
        Ok(items) => Some(items),
        Err(e) => {
            tracing::warn!(error = %e, body = %body, "Bracketed span is not a list literal");
            None
        }
    }
}

/// Splits `1. a 2. b` style text on its markers, dropping empty segments.
pub fn split_numbered_list(text: &str) -> Vec<String> {
    NUMBERED_MARKER
        .split(text)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Finds the first `[...]` span with no unquoted brackets inside and returns
/// its contents (without the brackets).
///
/// Double-quoted strings, with backslash escapes, may contain brackets. A
/// `"` with no closing partner is treated as an ordinary character.
pub fn find_bracketed_span(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    for (start, &b) in bytes.iter().enumerate() {
        if b != b'[' {
            continue;
        }
        let body_start = start + 1;
        if let Some(len) = closing_bracket(&bytes[body_start..]) {
            return Some(&text[body_start..body_start + len]);
        }
    }
    None
}

/// Offset of the `]` closing a span body, or `None` if an unquoted `[`
/// appears first or the text ends.
fn closing_bracket(body: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i < body.len() {
        match body[i] {
            b']' => return Some(i),
            b'[' => return None,
            b'"' => {
                if let Some(len) = closing_quote(&body[i + 1..]) {
                    i += len + 2;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn closing_quote(rest: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}
