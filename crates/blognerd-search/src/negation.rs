use blognerd_core::types::EmbeddingVector;
use blognerd_core::{Error, Result};

/// Moves a query vector away from a negative example: `primary - w * negative`.
#[derive(Debug, Clone, Copy)]
pub struct NegationComposer {
    weight: f32,
}

impl Default for NegationComposer {
    fn default() -> Self { Self { weight: 0.5 } }
}

impl NegationComposer {
    pub fn with_weight(weight: f32) -> Self { Self { weight } }

    pub fn weight(&self) -> f32 { self.weight }

    /// The result is not renormalized.
    pub fn compose(&self, primary: &[f32], negative: &[f32]) -> Result<EmbeddingVector> {
        if primary.len() != negative.len() {
            return Err(Error::DimensionMismatch {
                expected: primary.len(),
                actual: negative.len(),
            });
        }
        Ok(primary.iter().zip(negative).map(|(p, n)| p - self.weight * n).collect())
    }
}
