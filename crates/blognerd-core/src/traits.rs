use crate::types::{EmbedPurpose, EmbeddingVector, IndexQuery, RawMatch};

/// Text → vector model. Implementations return L2-normalized vectors of `dim()` length.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String], purpose: EmbedPurpose) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Resolves query vectors for the orchestrator.
pub trait EmbeddingResolver: Send + Sync {
    /// One vector per input text, in input order.
    fn embed(&self, texts: &[String], purpose: EmbedPurpose)
        -> anyhow::Result<Vec<EmbeddingVector>>;
    /// Stored vector of an indexed document; `Ok(None)` when the id is unknown.
    fn fetch_by_id(&self, id: &str) -> anyhow::Result<Option<EmbeddingVector>>;
}

/// Nearest-neighbour search over a namespaced index with metadata filters.
pub trait VectorIndex: Send + Sync {
    fn query(&self, request: &IndexQuery) -> anyhow::Result<Vec<RawMatch>>;
}
