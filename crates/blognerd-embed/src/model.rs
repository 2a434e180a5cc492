use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;

use blognerd_core::config::{expand_path, EmbeddingConfig};
use blognerd_core::traits::Embedder;
use blognerd_core::types::EmbedPurpose;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_batch;

/// Local BGE-M3 dense embedder.
pub struct BgeM3Embedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    query_instruction: Option<String>,
}

impl BgeM3Embedder {
    pub fn load(cfg: &EmbeddingConfig) -> Result<Self> {
        let device = select_device();
        let model_dir = resolve_model_dir(cfg.model_dir.as_deref())?;
        tracing::info!(dir = %model_dir.display(), "🔄 Loading BGE-M3 model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| {
                anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e)
            })?;

        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig =
            serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;

        let weights_path = model_dir.join("pytorch_model.bin");
        let weights: HashMap<String, Tensor> =
            candle_core::pickle::read_all(&weights_path)?.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        tracing::info!(dim = config.hidden_size, "✅ BGE-M3 model loaded");

        Ok(Self {
            model,
            tokenizer,
            device,
            dim: config.hidden_size,
            max_len: cfg.max_len,
            query_instruction: cfg.query_instruction.clone(),
        })
    }

    fn prepare(&self, texts: &[String], purpose: EmbedPurpose) -> Vec<String> {
        match (purpose, self.query_instruction.as_deref()) {
            (EmbedPurpose::Query, Some(instruction)) => {
                texts.iter().map(|t| format!("{instruction}{t}")).collect()
            }
            _ => texts.to_vec(),
        }
    }
}

impl Embedder for BgeM3Embedder {
    fn dim(&self) -> usize { self.dim }

    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String], purpose: EmbedPurpose) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let inputs = self.prepare(texts, purpose);
        let (input_ids, attention_mask) =
            tokenize_batch(&self.tokenizer, &inputs, self.max_len, &self.device)?;
        let token_type_ids = Tensor::zeros(input_ids.dims(), DType::I64, &self.device)?;
        let hidden =
            self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        if start.elapsed().as_millis() > 100 * texts.len() as u128 {
            tracing::warn!(
                batch = texts.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "⚠️  Slow embedding"
            );
        }
        Ok(vectors)
    }
}

/// Config value first, then `APP_MODEL_DIR`, `MODEL_DIR` and the usual
/// checkout-relative locations.
fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    let candidates = configured
        .map(expand_path)
        .into_iter()
        .chain(std::env::var("APP_MODEL_DIR").ok().map(PathBuf::from))
        .chain(std::env::var("MODEL_DIR").ok().map(PathBuf::from))
        .chain([
            Path::new("../models/bge-m3").to_path_buf(),
            Path::new("models/bge-m3").to_path_buf(),
        ]);
    for dir in candidates {
        if dir.exists() {
            tracing::debug!(dir = %dir.display(), "📦 Using model dir");
            return Ok(dir);
        }
    }
    Err(anyhow!("Could not locate BGE-M3 model directory"))
}
