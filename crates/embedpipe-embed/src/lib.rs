//! Sentence embedding stack: all-MiniLM-L6-v2 on candle.
//!
//! The model directory (tokenizer.json, config.json, and either
//! model.safetensors or pytorch_model.bin) is resolved from `APP_MODEL_DIR`,
//! `MODEL_DIR`, the `model.dir` config key, or `models/all-MiniLM-L6-v2`.
//! Fetching and caching the files is the caller's problem.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, ensure, Context, Result};
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use embedpipe_core::config::{expand_path, Config};
use embedpipe_core::Embedder;

pub mod device;
pub mod pool;
pub mod tokenize;

pub use device::select_device;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_batch_on_device;

pub const EMBEDDING_DIM: usize = 384;
pub const MAX_TOKENS: usize = 256;

/// all-MiniLM-L6-v2 loaded once and held immutably for the process
/// lifetime. Every embedding is a single batched forward pass followed by
/// masked mean pooling and L2 normalization.
pub struct MiniLmEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl MiniLmEmbedder {
    pub fn new() -> Result<Self> {
        let device = device::select_device();
        let model_dir = resolve_model_dir()?;
        info!("loading all-MiniLM-L6-v2 from {}", model_dir.display());

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            anyhow!(
                "Failed to load tokenizer from {}: {}",
                tokenizer_path.display(),
                e
            )
        })?;

        let config_path = model_dir.join("config.json");
        let config_text = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&config_text)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        let vb = load_weights(&model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        debug!("model ready");
        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }
}

impl Embedder for MiniLmEmbedder {
    fn dim(&self) -> usize {
        EMBEDDING_DIM
    }

    fn max_len(&self) -> usize {
        MAX_TOKENS
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let (input_ids, attention_mask) =
            tokenize::tokenize_batch_on_device(&self.tokenizer, texts, MAX_TOKENS, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = pool::masked_mean_l2(&hidden, &attention_mask)?;
        let rows = pooled.to_device(&Device::Cpu)?.to_vec2::<f32>()?;
        ensure!(
            rows.len() == texts.len(),
            "batch size mismatch: {} embeddings for {} texts",
            rows.len(),
            texts.len()
        );
        Ok(rows)
    }
}

/// safetensors if present (memory-mapped), otherwise the pickle checkpoint.
fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        debug!("weights: {}", safetensors.display());
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DTYPE, device)? };
        return Ok(vb);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    debug!("weights: {}", pickle.display());
    let tensors = candle_core::pickle::read_all(&pickle)
        .with_context(|| format!("Failed to load weights from {}", pickle.display()))?;
    let tensors: HashMap<String, Tensor> = tensors.into_iter().collect();
    Ok(VarBuilder::from_tensors(tensors, DTYPE, device))
}

/// Deterministic hash-based embedder for tests and environments without
/// model weights. Same shape contract as the real model: fixed dimension,
/// unit norm, order-preserving.
pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;

        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        MAX_TOKENS
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// The process-wide embedder: the real model, or the fake one when
/// `APP_USE_FAKE_EMBEDDINGS` is set.
pub fn get_default_embedder() -> Result<Box<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake {
        info!("using fake embedder ({}d)", EMBEDDING_DIM);
        return Ok(Box::new(FakeEmbedder::new(EMBEDDING_DIM)));
    }
    Ok(Box::new(MiniLmEmbedder::new()?))
}

fn resolve_model_dir() -> Result<PathBuf> {
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = expand_path(&dir);
            if p.exists() {
                debug!("model dir from {}: {}", var, p.display());
                return Ok(p);
            }
        }
    }
    if let Ok(config) = Config::load() {
        if let Ok(dir) = config.get::<String>("model.dir") {
            let p = expand_path(&dir);
            if p.exists() {
                debug!("model dir from config: {}", p.display());
                return Ok(p);
            }
        }
    }
    let fallback = Path::new("models/all-MiniLM-L6-v2");
    if fallback.exists() {
        return Ok(fallback.to_path_buf());
    }
    Err(anyhow!(
        "Could not locate the all-MiniLM-L6-v2 model directory (set APP_MODEL_DIR or model.dir)"
    ))
}
