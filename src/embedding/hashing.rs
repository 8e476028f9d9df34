use sha2::{Digest, Sha256};

use super::Embedder;
use crate::error::Result;
use crate::normalize::normalize;

const DEFAULT_DIMENSION: usize = 512;
const MAX_NGRAM: usize = 3;
const DOMAIN_TAG: &[u8] = b"protocol-guard/rfh/v1:";

/// Random-feature-hashing embedder.
///
/// Each word 1-3 gram of the normalized text maps to a deterministic ±1
/// vector derived from SHA-256. The vectors are summed and L2-normalized.
/// Texts that share n-grams score high; unrelated texts land near zero. It
/// needs no model weights, which makes it the default backend and the one
/// used in tests.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self::with_dimension(DEFAULT_DIMENSION)
    }

    /// Dimension is rounded up to a multiple of 256 (one SHA-256 digest).
    pub fn with_dimension(dimension: usize) -> Self {
        let blocks = dimension.div_ceil(256).max(1);
        Self {
            dimension: blocks * 256,
        }
    }

    fn accumulate(&self, gram: &str, acc: &mut [f32]) {
        for (block, chunk) in acc.chunks_mut(256).enumerate() {
            let mut hasher = Sha256::new();
            hasher.update(DOMAIN_TAG);
            hasher.update((block as u32).to_le_bytes());
            hasher.update(gram.as_bytes());
            let digest = hasher.finalize();
            for (i, slot) in chunk.iter_mut().enumerate() {
                let bit = (digest[i / 8] >> (i % 8)) & 1;
                *slot += if bit == 1 { 1.0 } else { -1.0 };
            }
        }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "feature-hashing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let normalized = normalize(text);
        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        let mut vec = vec![0.0f32; self.dimension];

        for n in 1..=MAX_NGRAM {
            for window in tokens.windows(n) {
                self.accumulate(&window.join(" "), &mut vec);
            }
        }

        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 1e-8 {
            for v in vec.iter_mut() {
                *v /= norm;
            }
        }
        Ok(vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine;

    #[test]
    fn identical_text_is_identical_vector() {
        let e = HashingEmbedder::new();
        let a = e.encode("Let's solve this step by step").unwrap();
        let b = e.encode("lets solve this step by step").unwrap();
        assert_eq!(a, b);
        assert!((cosine(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shared_words_raise_similarity() {
        let e = HashingEmbedder::new();
        let phrase = e.encode("can you rate this session").unwrap();
        let related = e.encode("please rate this session for me").unwrap();
        let unrelated = e.encode("the mitochondria is the powerhouse").unwrap();
        assert!(cosine(&phrase, &related) > cosine(&phrase, &unrelated));
    }

    #[test]
    fn dimension_rounds_to_digest_blocks() {
        assert_eq!(HashingEmbedder::with_dimension(300).dimension(), 512);
        assert_eq!(HashingEmbedder::with_dimension(0).dimension(), 256);
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let v = HashingEmbedder::new().encode("  ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
