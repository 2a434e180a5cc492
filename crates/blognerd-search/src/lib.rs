//! Search orchestration: vector resolution, index dispatch and projection of
//! raw matches into presentable results, plus feed exports.

pub mod dates;
pub mod export;
pub mod negation;
pub mod orchestrator;
pub mod projector;

pub use export::{to_csv, to_opml, to_rss};
pub use negation::NegationComposer;
pub use orchestrator::SearchOrchestrator;
pub use projector::ResultProjector;
