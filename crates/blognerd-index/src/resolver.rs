use anyhow::Result;
use std::sync::Arc;

use blognerd_core::traits::{Embedder, EmbeddingResolver};
use blognerd_core::types::{EmbedPurpose, EmbeddingVector};

use crate::search::LanceIndex;

/// Embeds through the configured model and reads `like:` seeds from the
/// stored vectors of one namespace.
pub struct IndexBackedResolver {
    embedder: Arc<dyn Embedder>,
    index: Arc<LanceIndex>,
    seed_namespace: String,
}

impl IndexBackedResolver {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<LanceIndex>,
        seed_namespace: impl Into<String>,
    ) -> Self {
        Self { embedder, index, seed_namespace: seed_namespace.into() }
    }
}

impl EmbeddingResolver for IndexBackedResolver {
    fn embed(&self, texts: &[String], purpose: EmbedPurpose) -> Result<Vec<EmbeddingVector>> {
        self.embedder.embed_batch(texts, purpose)
    }

    fn fetch_by_id(&self, id: &str) -> Result<Option<EmbeddingVector>> {
        self.index.fetch_vector(&self.seed_namespace, id)
    }
}
