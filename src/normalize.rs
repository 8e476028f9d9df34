use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Compiled patterns
// ---------------------------------------------------------------------------

static PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Lowercase, strip punctuation and collapse whitespace.
///
/// Applied to both transcripts and protocol phrases so that substring checks
/// ignore case and punctuation: `"Don't Yell!!"` becomes `"dont yell"`.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = PUNCT_RE.replace_all(lowered.trim(), "");
    WHITESPACE_RE.replace_all(&stripped, " ").trim().to_string()
}

// ---------------------------------------------------------------------------
// Text metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextMetrics {
    pub word_count: usize,
    pub unique_words: usize,
}

impl TextMetrics {
    /// Counts whitespace-separated tokens of the text as given to the checker.
    pub fn of(text: &str) -> Self {
        let words: Vec<&str> = text.split_whitespace().collect();
        let unique: HashSet<&str> = words.iter().copied().collect();
        Self {
            word_count: words.len(),
            unique_words: unique.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_case() {
        assert_eq!(normalize("Don't Yell!!"), "dont yell");
        assert_eq!(normalize("  Hello,   Student.\nLet's begin "), "hello student lets begin");
    }

    #[test]
    fn punctuation_only_normalizes_to_empty() {
        assert_eq!(normalize("?!... --"), "");
    }

    #[test]
    fn metrics_count_unique_tokens() {
        let m = TextMetrics::of("the cat saw the dog");
        assert_eq!(m.word_count, 5);
        assert_eq!(m.unique_words, 4);
    }
}
