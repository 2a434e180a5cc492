//! blognerd-query
//!
//! Directive mini-language for the search box: `rust async since:last_week
//! site:example.com <tokio> sort:time`. The tokenizer finds directive spans in
//! one pass, the lexicon translates each value, and the parser reduces the
//! matches into a `ParsedQuery`.

pub mod compose;
pub mod lexicon;
pub mod parser;
pub mod tokenizer;

pub use compose::{more_from_site, more_like_this, SearchOptions, SearchType};
pub use lexicon::{DirectiveKey, DirectiveLexicon, Effect};
pub use parser::QueryParser;
pub use tokenizer::{scan, strip_spans, DirectiveMatch};
