//! Phrase embeddings and nearest-exemplar similarity.
//!
//! The index encodes every protocol phrase once when it is built and then
//! answers `similarity` queries by encoding only the query text. Encoding is
//! the most expensive step in an analysis, so the scorer calls `similarity`
//! only for categories without a verbatim match.

mod hashing;
#[cfg(feature = "neural")]
mod neural;

use std::collections::HashMap;
use std::sync::Arc;

pub use hashing::HashingEmbedder;
#[cfg(feature = "neural")]
pub use neural::SentenceEmbedder;

use crate::error::{GuardError, Result};
use crate::protocol::ProtocolDefinition;

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Sentence-embedding backend. Implementations must be deterministic: the same
/// text always encodes to the same vector.
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    fn dimension(&self) -> usize;

    fn encode(&self, text: &str) -> Result<Vec<f32>>;

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.encode(t)).collect()
    }
}

// ---------------------------------------------------------------------------
// Vector math
// ---------------------------------------------------------------------------

/// Cosine similarity. Zero vectors compare as 0.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Map a cosine similarity to a 0-100 percentage with two decimals.
///
/// Negative similarities clamp to 0 so a category score never leaves [0, 100].
pub fn similarity_to_score(similarity: f32) -> f64 {
    let clamped = (similarity as f64).clamp(0.0, 1.0);
    (clamped * 10_000.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

pub struct EmbeddingIndex {
    embedder: Arc<dyn Embedder>,
    vectors: HashMap<String, Vec<Vec<f32>>>,
}

impl std::fmt::Debug for EmbeddingIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingIndex")
            .field("embedder", &self.embedder.name())
            .field("categories", &self.vectors.len())
            .finish()
    }
}

impl EmbeddingIndex {
    pub fn build(embedder: Arc<dyn Embedder>, protocol: &ProtocolDefinition) -> Result<Self> {
        let dim = embedder.dimension();
        let mut vectors = HashMap::with_capacity(protocol.len());

        for category in protocol.categories() {
            let encoded = embedder.encode_batch(category.phrases())?;
            if encoded.len() != category.phrases().len() {
                return Err(GuardError::model(format!(
                    "{} returned {} vectors for {} phrases in '{}'",
                    embedder.name(),
                    encoded.len(),
                    category.phrases().len(),
                    category.name()
                )));
            }
            if let Some(bad) = encoded.iter().find(|v| v.len() != dim) {
                return Err(GuardError::model(format!(
                    "{} produced a {}-dimensional vector, expected {dim}",
                    embedder.name(),
                    bad.len()
                )));
            }
            vectors.insert(category.name().to_string(), encoded);
        }

        tracing::info!(
            backend = embedder.name(),
            dimension = dim,
            categories = protocol.len(),
            phrases = protocol.phrase_count(),
            "embedding index built"
        );
        Ok(Self { embedder, vectors })
    }

    /// Best cosine match between `text` and the category's exemplars, as 0-100.
    pub fn similarity(&self, text: &str, category: &str) -> Result<f64> {
        let exemplars = self
            .vectors
            .get(category)
            .ok_or_else(|| GuardError::UnknownCategory {
                name: category.to_string(),
            })?;

        let query = self.embedder.encode(text)?;
        let best = exemplars
            .iter()
            .map(|v| cosine(&query, v))
            .fold(f32::NEG_INFINITY, f32::max);
        Ok(similarity_to_score(best))
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn shared_embedder(&self) -> Arc<dyn Embedder> {
        Arc::clone(&self.embedder)
    }

    pub fn category_count(&self) -> usize {
        self.vectors.len()
    }
}
