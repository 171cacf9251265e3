//! Search query normalization.
//!
//! Quoted phrases survive as a single exact-match token (quotes kept), every
//! other run of non-whitespace is its own token, and the tokens are re-joined
//! with single spaces. A quote without a partner never forms a phrase and is
//! scanned like any other character.

use regex::Regex;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)"|(\S+)"#).expect("token pattern is valid"));

/// Normalizes a free-text query for the repository search endpoint.
pub fn normalize_query(query: &str) -> String {
    TOKEN
        .captures_iter(query)
        .filter_map(|caps| {
            if let Some(phrase) = caps.get(1) {
                Some(format!("\"{}\"", phrase.as_str()))
            } else {
                caps.get(2).map(|word| word.as_str().to_string())
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
