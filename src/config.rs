use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{read_config_file, GuardError, Result};

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Score cutoffs used to bucket category scores into verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Score assigned when a protocol phrase occurs verbatim.
    pub exact_match: f64,
    pub high_compliance: f64,
    pub medium_compliance: f64,
    pub low_compliance: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            exact_match: 100.0,
            high_compliance: 70.0,
            medium_compliance: 40.0,
            low_compliance: 20.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Category weights
// ---------------------------------------------------------------------------

const POSITIVE_SUM_MIN: f64 = 0.95;
const POSITIVE_SUM_MAX: f64 = 1.05;

/// Signed importance weight per category. Negative weights penalize presence.
/// Categories without an entry do not move the overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryWeights(HashMap<String, f64>);

impl CategoryWeights {
    pub fn new(weights: HashMap<String, f64>) -> Self {
        Self(weights)
    }

    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    pub fn get(&self, category: &str) -> Option<f64> {
        self.0.get(category).copied()
    }

    pub fn set(&mut self, category: impl Into<String>, weight: f64) {
        self.0.insert(category.into(), weight);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of absolute weights; the overall-score denominator.
    pub fn absolute_sum(&self) -> f64 {
        self.0.values().map(|w| w.abs()).sum()
    }

    pub fn positive_sum(&self) -> f64 {
        self.0.values().filter(|w| **w > 0.0).sum()
    }

    /// Positive weights are expected to sum to roughly 1.0. The defaults are
    /// advisory, so an imbalance is only logged.
    pub fn is_balanced(&self) -> bool {
        (POSITIVE_SUM_MIN..=POSITIVE_SUM_MAX).contains(&self.positive_sum())
    }

    pub(crate) fn warn_if_unbalanced(&self) {
        if !self.is_balanced() {
            tracing::warn!(
                positive_sum = self.positive_sum(),
                "positive category weights should sum to ~1.0"
            );
        }
    }
}

impl Default for CategoryWeights {
    fn default() -> Self {
        let table: &[(&str, f64)] = &[
            // Communication
            ("Communication - Greeting the Student", 0.10),
            ("Communication - Tutor Misbehavior", -0.20),
            ("Communication - Off-Topic Conversations", -0.15),
            // Problem identification
            ("Teaching - Confirming the Problem", 0.08),
            ("Teaching - Identifying the Student's Need", 0.08),
            ("Teaching - Identifying Student's Requirement", 0.08),
            // Concept explanation
            ("Teaching - Identifying Core Concepts", 0.10),
            ("Teaching - Checking Student's Understanding of the Core Concept", 0.10),
            ("Teaching - Revising or Teaching the Concept if Required", 0.10),
            ("Teaching - Explaining the Concept or Procedure", 0.12),
            ("Teaching - Visualizing the Concepts While Teaching", 0.05),
            // Problem solving
            ("Teaching - Solving the Problem Step-by-Step", 0.15),
            ("Teaching - Confirming Student's Understanding of Steps", 0.10),
            ("Teaching - Encouraging Student to Solve Independently", 0.10),
            // Conclusion
            ("Teaching - Giving the Final Solution", 0.08),
            ("Teaching - Confirming Student's Understanding at the End", 0.08),
            // Feedback
            ("Teaching - Asking Student to Rate the Session", 0.05),
            ("Teaching - Asking Student to Mark as Favourite Tutor", 0.03),
        ];
        Self(
            table
                .iter()
                .map(|(name, weight)| (name.to_string(), *weight))
                .collect(),
        )
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for CategoryWeights {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, w)| (k.into(), w)).collect())
    }
}

// ---------------------------------------------------------------------------
// Violation sources
// ---------------------------------------------------------------------------

/// Names of the negative categories scanned for verbatim violations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViolationCategories {
    pub misbehavior: String,
    pub off_topic: String,
}

impl Default for ViolationCategories {
    fn default() -> Self {
        Self {
            misbehavior: "Communication - Tutor Misbehavior".to_string(),
            off_topic: "Communication - Off-Topic Conversations".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Checker configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    pub thresholds: Thresholds,
    pub weights: CategoryWeights,
    pub violation_categories: ViolationCategories,
    /// Exemplar phrases attached to each feedback record.
    pub max_examples: usize,
    /// Entries in each of the top and bottom category lists.
    pub ranking_size: usize,
    /// Phrases shown per violation type in the text report.
    pub report_violation_examples: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            weights: CategoryWeights::default(),
            violation_categories: ViolationCategories::default(),
            max_examples: 3,
            ranking_size: 3,
            report_violation_examples: 3,
        }
    }
}

impl CheckerConfig {
    /// Load from a JSON file. Absent fields keep their defaults; a present
    /// `weights` object replaces the default table entirely.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = read_config_file(path)?;
        let config: CheckerConfig =
            serde_json::from_str(&raw).map_err(|source| GuardError::ConfigParse {
                origin: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_weights(mut self, weights: CategoryWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        if !(t.low_compliance <= t.medium_compliance
            && t.medium_compliance <= t.high_compliance
            && t.high_compliance <= t.exact_match)
        {
            return Err(GuardError::invalid(format!(
                "thresholds must be ordered low <= medium <= high <= exact, got {}/{}/{}/{}",
                t.low_compliance, t.medium_compliance, t.high_compliance, t.exact_match
            )));
        }
        if let Some((name, w)) = self.weights.iter().find(|(_, w)| !w.is_finite()) {
            return Err(GuardError::invalid(format!(
                "weight for '{name}' is not a finite number: {w}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_cover_all_tutoring_categories() {
        let w = CategoryWeights::default();
        assert_eq!(w.len(), 18);
        assert_eq!(w.get("Communication - Tutor Misbehavior"), Some(-0.20));
        // The shipped table is advisory and does not sum to 1.0.
        assert!(!w.is_balanced());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: CheckerConfig =
            serde_json::from_str(r#"{"weights": {"Greeting": 1.0}, "ranking_size": 5}"#).unwrap();
        assert_eq!(cfg.weights.len(), 1);
        assert!(cfg.weights.is_balanced());
        assert_eq!(cfg.ranking_size, 5);
        assert_eq!(cfg.max_examples, 3);
        assert_eq!(cfg.thresholds, Thresholds::default());
    }

    #[test]
    fn unordered_thresholds_are_rejected() {
        let mut cfg = CheckerConfig::default();
        cfg.thresholds.medium_compliance = 90.0;
        assert!(cfg.validate().is_err());
    }
}
