//! Protocol compliance scoring for tutoring-session transcripts.
//!
//! A [`ProtocolChecker`] owns a validated protocol definition, the embedding
//! index built from its exemplar phrases, and the scoring configuration.
//! Each call to [`ProtocolChecker::analyze_text`] is independent; the checker
//! is read-only after construction and can be shared across threads.

pub mod aggregate;
pub mod config;
pub mod embedding;
pub mod error;
pub mod map;
pub mod normalize;
pub mod protocol;
pub mod report;
pub mod scorer;
pub mod violations;

use std::path::Path;
use std::sync::Arc;

pub use aggregate::{Aggregate, RankedCategory};
pub use config::{CategoryWeights, CheckerConfig, Thresholds, ViolationCategories};
pub use embedding::{Embedder, EmbeddingIndex, HashingEmbedder};
#[cfg(feature = "neural")]
pub use embedding::SentenceEmbedder;
pub use error::{ErrorKind, GuardError, Result};
pub use map::OrderedMap;
pub use normalize::{normalize, TextMetrics};
pub use protocol::{Category, ProtocolDefinition};
pub use report::{AnalysisResult, ReportOptions};
pub use scorer::{CategoryScorer, Feedback, Verdict};
pub use violations::{ViolationType, Violations};

// ---------------------------------------------------------------------------
// Checker
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ProtocolChecker {
    protocol: ProtocolDefinition,
    index: EmbeddingIndex,
    config: CheckerConfig,
}

impl ProtocolChecker {
    /// Build the embedding index for `protocol`. This is the only place the
    /// embedding backend encodes exemplar phrases.
    pub fn new(
        protocol: ProtocolDefinition,
        embedder: Arc<dyn Embedder>,
        config: CheckerConfig,
    ) -> Result<Self> {
        config.validate()?;
        config.weights.warn_if_unbalanced();
        for (name, _) in config.weights.iter() {
            if protocol.get(name).is_none() {
                tracing::debug!(category = name, "weighted category not in protocol");
            }
        }

        let index = EmbeddingIndex::build(embedder, &protocol)?;
        Ok(Self {
            protocol,
            index,
            config,
        })
    }

    pub fn from_path(
        protocol_path: impl AsRef<Path>,
        embedder: Arc<dyn Embedder>,
        config: CheckerConfig,
    ) -> Result<Self> {
        let protocol = ProtocolDefinition::from_path(protocol_path)?;
        Self::new(protocol, embedder, config)
    }

    pub fn protocol(&self) -> &ProtocolDefinition {
        &self.protocol
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    /// Replace the protocol. The new index is built before anything is swapped,
    /// so on error the checker keeps its previous protocol and index.
    pub fn reload_protocol(&mut self, protocol: ProtocolDefinition) -> Result<()> {
        let index = EmbeddingIndex::build(self.index.shared_embedder(), &protocol)?;
        self.protocol = protocol;
        self.index = index;
        tracing::info!(categories = self.protocol.len(), "protocol reloaded");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Analysis
    // -----------------------------------------------------------------------

    /// Score a normalized transcript against every protocol category.
    ///
    /// Empty or whitespace-only input is rejected before any scoring work.
    pub fn analyze_text(&self, text: &str) -> Result<AnalysisResult> {
        if text.trim().is_empty() {
            return Err(GuardError::EmptyInput);
        }

        let clean_text = normalize(text);
        let violations = violations::detect(
            &clean_text,
            &self.protocol,
            &self.config.violation_categories,
        );

        let scorer = CategoryScorer::new(
            &self.index,
            &self.config.thresholds,
            self.config.max_examples,
        );
        let mut category_scores = OrderedMap::with_capacity(self.protocol.len());
        let mut feedback = OrderedMap::with_capacity(self.protocol.len());
        for category in self.protocol.categories() {
            let (score, record) = scorer.score(&clean_text, category)?;
            category_scores.insert(category.name(), score);
            feedback.insert(category.name(), record);
        }

        let Aggregate {
            overall_score,
            top_categories,
            bottom_categories,
        } = aggregate::aggregate(
            &category_scores,
            &self.config.weights,
            self.config.ranking_size,
        );

        let text_metrics = TextMetrics::of(text);
        tracing::info!(
            overall_score,
            words = text_metrics.word_count,
            violations = violations.len(),
            "transcript analyzed"
        );

        Ok(AnalysisResult {
            overall_score,
            category_scores,
            feedback,
            violations,
            text_metrics,
            top_categories,
            bottom_categories,
        })
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            detail_below: self.config.thresholds.medium_compliance,
            violation_examples: self.config.report_violation_examples,
        }
    }

    pub fn generate_report(&self, result: &AnalysisResult) -> String {
        report::render(result, &self.report_options())
    }
}
