//! Pretrained sentence-transformer backend (feature `neural`).
//!
//! Loads a BERT-family checkpoint such as
//! `sentence-transformers/all-MiniLM-L6-v2` from a local directory holding
//! `config.json`, `tokenizer.json` and `model.safetensors`, and produces
//! mean-pooled, L2-normalized sentence vectors on the CPU.

use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams};

use super::Embedder;
use crate::error::{GuardError, Result};

/// Fields of `config.json` needed outside of candle's own model config.
#[derive(Debug, Deserialize)]
struct Shape {
    hidden_size: usize,
    max_position_embeddings: usize,
}

pub struct SentenceEmbedder {
    name: String,
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    hidden_size: usize,
}

impl SentenceEmbedder {
    pub fn load(model_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = model_dir.as_ref();
        if !dir.is_dir() {
            return Err(GuardError::model(format!(
                "model directory not found: {}",
                dir.display()
            )));
        }
        let device = Device::Cpu;

        let config_path = dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            GuardError::model(format!("failed to read {}: {e}", config_path.display()))
        })?;
        let config: BertConfig = serde_json::from_str(&raw).map_err(|e| {
            GuardError::model(format!("invalid model config {}: {e}", config_path.display()))
        })?;
        let shape: Shape = serde_json::from_str(&raw).map_err(|e| {
            GuardError::model(format!("invalid model config {}: {e}", config_path.display()))
        })?;

        let tokenizer_path = dir.join("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            GuardError::model(format!(
                "tokenizer load failed at {}: {e}",
                tokenizer_path.display()
            ))
        })?;
        limit_length(&mut tokenizer, shape.max_position_embeddings)?;

        let weights_path: PathBuf = dir.join("model.safetensors");
        if !weights_path.is_file() {
            return Err(GuardError::model(format!(
                "safetensors file not found at {}",
                weights_path.display()
            )));
        }
        // SAFETY: the weights file is memory-mapped read-only and is not
        // modified while the model is alive.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device) }
            .map_err(|e| GuardError::model(format!("weight load failed: {e}")))?;
        let model = BertModel::load(vb, &config)
            .map_err(|e| GuardError::model(format!("model construction failed: {e}")))?;

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sentence-transformer".to_string());

        tracing::info!(
            model = %name,
            hidden_size = shape.hidden_size,
            max_tokens = shape.max_position_embeddings,
            "sentence embedder loaded"
        );

        Ok(Self {
            name,
            model,
            tokenizer,
            device,
            hidden_size: shape.hidden_size,
        })
    }

    fn forward(&self, text: &str) -> candle_core::Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| candle_core::Error::Msg(format!("tokenization failed: {e}")))?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask =
            Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        // (1, seq, hidden)
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // Mean pooling over real tokens only.
        let mask_f = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask_f)?.sum(1)?;
        let counts = (mask_f.sum(1)? + 1e-9)?;
        let pooled = summed.broadcast_div(&counts)?;

        let norm = (pooled.sqr()?.sum_keepdim(1)?.sqrt()? + 1e-12)?;
        let normalized = pooled.broadcast_div(&norm)?;
        normalized.squeeze(0)?.to_vec1::<f32>()
    }
}

/// Truncate inside the tokenizer so [CLS] and [SEP] survive long inputs.
fn limit_length(tokenizer: &mut Tokenizer, max_length: usize) -> Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| GuardError::model(format!("tokenizer truncation setup failed: {e}")))?;
    Ok(())
}

impl Embedder for SentenceEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.hidden_size
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        self.forward(text)
            .map_err(|e| GuardError::model(format!("{} encode failed: {e}", self.name)))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    const TOKENIZER: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": {
            "type": "BertProcessing",
            "sep": ["[SEP]", 3],
            "cls": ["[CLS]", 2]
        },
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": { "[PAD]": 0, "[UNK]": 1, "[CLS]": 2, "[SEP]": 3, "hello": 4, "student": 5 },
            "unk_token": "[UNK]"
        }
    }"#;

    #[test]
    fn long_input_keeps_special_tokens() {
        let mut tokenizer = Tokenizer::from_str(TOKENIZER).unwrap();
        limit_length(&mut tokenizer, 5).unwrap();

        let encoding = tokenizer
            .encode("hello student hello student hello student", true)
            .unwrap();
        let ids = encoding.get_ids();
        assert_eq!(ids.len(), 5);
        assert_eq!(ids.first(), Some(&2));
        assert_eq!(ids.last(), Some(&3));
        assert_eq!(encoding.get_attention_mask().len(), 5);
    }
}
