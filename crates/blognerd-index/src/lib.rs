//! LanceDB-backed vector index.
//!
//! One Lance table per namespace, with a fixed column layout for pages and
//! feeds. Implements the synchronous `VectorIndex` trait by blocking on a
//! private tokio runtime, plus the JSON-lines ingest path and an
//! `EmbeddingResolver` that reads stored vectors back for `like:`.

pub mod records;
pub mod resolver;
pub mod schema;
pub mod search;
pub mod sql;
pub mod table;
pub mod writer;

pub use records::IndexDocument;
pub use resolver::IndexBackedResolver;
pub use search::LanceIndex;
pub use writer::{IngestReport, JsonlIngest};
