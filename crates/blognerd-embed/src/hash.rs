use anyhow::Result;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use blognerd_core::traits::Embedder;
use blognerd_core::types::EmbedPurpose;

/// Deterministic bag-of-words embedder for tests and offline development.
///
/// Each lowercased word is hashed into one bucket, so texts sharing words
/// score higher under cosine similarity. Query and document embeddings of the
/// same text are identical.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
    max_len: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize, max_len: usize) -> Self { Self { dim: dim.max(1), max_len } }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| !w.is_empty())
            .take(self.max_len.max(1))
            .collect();
        if words.is_empty() {
            // Keep the vector non-zero so cosine distance stays defined.
            v[bucket(text, self.dim).0] = 1.0;
            return v;
        }
        for word in &words {
            let (idx, weight) = bucket(word, self.dim);
            v[idx] += 0.5 + weight;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        v.iter_mut().for_each(|x| *x /= norm);
        v
    }
}

fn bucket(token: &str, dim: usize) -> (usize, f32) {
    let mut hasher = XxHash64::with_seed(0);
    token.hash(&mut hasher);
    let h = hasher.finish();
    ((h as usize) % dim, ((h >> 32) as u32) as f32 / u32::MAX as f32)
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String], _purpose: EmbedPurpose) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
