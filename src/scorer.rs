use std::fmt;

use serde::Serialize;

use crate::config::Thresholds;
use crate::embedding::EmbeddingIndex;
use crate::error::Result;
use crate::protocol::Category;

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    #[serde(rename = "Excellent protocol compliance")]
    Excellent,
    #[serde(rename = "Moderate compliance - could improve")]
    Moderate,
    #[serde(rename = "Needs significant improvement")]
    NeedsImprovement,
}

impl Verdict {
    pub fn for_score(score: f64, thresholds: &Thresholds) -> Self {
        if score >= thresholds.high_compliance {
            Verdict::Excellent
        } else if score >= thresholds.medium_compliance {
            Verdict::Moderate
        } else {
            Verdict::NeedsImprovement
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Excellent => "Excellent protocol compliance",
            Verdict::Moderate => "Moderate compliance - could improve",
            Verdict::NeedsImprovement => "Needs significant improvement",
        }
    }

    pub fn suggestions(self) -> &'static [&'static str] {
        match self {
            Verdict::Excellent => &["Keep using these effective phrases"],
            Verdict::Moderate => &[
                "Try incorporating more protocol phrases",
                "Be more explicit in following guidelines",
            ],
            Verdict::NeedsImprovement => &[
                "Review the protocol guidelines",
                "Practice using recommended phrases",
            ],
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub score: f64,
    pub verdict: Verdict,
    pub suggestions: Vec<String>,
    /// Leading exemplar phrases of the category, shown regardless of verdict.
    pub examples: Vec<String>,
}

impl Feedback {
    pub fn new(category: &Category, score: f64, thresholds: &Thresholds, max_examples: usize) -> Self {
        let verdict = Verdict::for_score(score, thresholds);
        Self {
            score,
            verdict,
            suggestions: verdict.suggestions().iter().map(|s| s.to_string()).collect(),
            examples: category.phrases().iter().take(max_examples).cloned().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// How a category score was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScoreSource {
    ExactMatch,
    Semantic,
}

pub struct CategoryScorer<'a> {
    index: &'a EmbeddingIndex,
    thresholds: &'a Thresholds,
    max_examples: usize,
}

impl<'a> CategoryScorer<'a> {
    pub fn new(index: &'a EmbeddingIndex, thresholds: &'a Thresholds, max_examples: usize) -> Self {
        Self {
            index,
            thresholds,
            max_examples,
        }
    }

    /// Score one category against already-normalized text.
    ///
    /// A verbatim phrase match short-circuits to the exact-match score without
    /// touching the embedding model.
    pub fn score(&self, normalized_text: &str, category: &Category) -> Result<(f64, Feedback)> {
        let (score, source) = if category.has_exact_match(normalized_text) {
            (self.thresholds.exact_match, ScoreSource::ExactMatch)
        } else {
            (
                self.index.similarity(normalized_text, category.name())?,
                ScoreSource::Semantic,
            )
        };
        tracing::debug!(category = category.name(), score, ?source, "category scored");

        let feedback = Feedback::new(category, score, self.thresholds, self.max_examples);
        Ok((score, feedback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_buckets_follow_thresholds() {
        let t = Thresholds::default();
        assert_eq!(Verdict::for_score(100.0, &t), Verdict::Excellent);
        assert_eq!(Verdict::for_score(70.0, &t), Verdict::Excellent);
        assert_eq!(Verdict::for_score(69.99, &t), Verdict::Moderate);
        assert_eq!(Verdict::for_score(40.0, &t), Verdict::Moderate);
        assert_eq!(Verdict::for_score(39.99, &t), Verdict::NeedsImprovement);
        assert_eq!(Verdict::for_score(0.0, &t), Verdict::NeedsImprovement);
    }

    #[test]
    fn verdict_serializes_as_text() {
        let json = serde_json::to_string(&Verdict::Moderate).unwrap();
        assert_eq!(json, "\"Moderate compliance - could improve\"");
    }
}
