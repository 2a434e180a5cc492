use anyhow::Result;
use std::sync::Arc;

use blognerd_core::config::EmbeddingConfig;
use blognerd_core::traits::Embedder;

pub mod device;
pub mod hash;
pub mod model;
pub mod pool;
pub mod retry;
pub mod tokenize;

pub use hash::HashEmbedder;
pub use model::BgeM3Embedder;
pub use pool::masked_mean_l2;
pub use retry::{Backoff, RetryPolicy, Retrying};

/// BGE-M3 output width.
pub const DEFAULT_DIM: usize = 1024;

/// `APP_USE_FAKE_EMBEDDINGS=1|true` forces the hash embedder regardless of config.
pub fn fake_embeddings_forced() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Build the configured embedder of width `dim`, wrapped in the retry policy.
pub fn get_default_embedder(cfg: &EmbeddingConfig, dim: usize) -> Result<Arc<dyn Embedder>> {
    let policy = RetryPolicy::from_config(cfg);
    if cfg.use_fake || fake_embeddings_forced() {
        tracing::info!(dim, "🧪 Using HashEmbedder");
        return Ok(Arc::new(Retrying::new(HashEmbedder::new(dim, cfg.max_len), policy)));
    }
    let model = BgeM3Embedder::load(cfg)?;
    if model.dim() != dim {
        let actual = model.dim();
        return Err(blognerd_core::Error::DimensionMismatch { expected: dim, actual }.into());
    }
    Ok(Arc::new(Retrying::new(model, policy)))
}
