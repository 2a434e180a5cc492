use thiserror::Error;

/// Failures surfaced by a single search call.
///
/// `Parse` and `Lookup` reject the query itself; `Search` wraps a failing
/// collaborator (embedding service or vector index) and keeps the cause.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid value for '{key}': {value:?} is not a number")]
    Parse { key: String, value: String },

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Search failed: {context}")]
    Search {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn search(context: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Search { context: context.into(), source }
    }

    /// True when the caller should present the failure as a rejected query
    /// rather than a backend outage.
    pub fn is_query_rejected(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Lookup(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
