//! Domain types used by the parser, the orchestrator and the index collaborators.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::filter::FilterPredicate;

pub type DocId = String;
pub type Metadata = Map<String, Value>;
pub type EmbeddingVector = Vec<f32>;

/// Which partition of the index a query targets.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Individual posts.
    #[default]
    Pages,
    /// Sites / RSS feeds.
    Feeds,
}

/// Index partition names for the two scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespaces {
    pub pages: String,
    pub feeds: String,
}

impl Namespaces {
    pub fn for_scope(&self, scope: Scope) -> &str {
        match scope {
            Scope::Pages => &self.pages,
            Scope::Feeds => &self.feeds,
        }
    }

    pub fn scope_of(&self, namespace: &str) -> Option<Scope> {
        if namespace == self.pages {
            Some(Scope::Pages)
        } else if namespace == self.feeds {
            Some(Scope::Feeds)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Relevance,
    Recency,
}

/// The `<...>` span of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegativeExample {
    Text(String),
    /// Unterminated or empty brackets; rejected when the query is resolved.
    Malformed(String),
}

/// Output of the query parser. Never mutated after parsing.
///
/// - `residual_text`: free text left after stripping directives (never empty)
/// - `filter`: metadata predicate built from filtering directives
/// - `similarity_seed_id`: id from `like:`, resolved to a stored vector
/// - `negative`: text from `<...>`, subtracted from the query vector
/// - `is_feed_search`: `type:feeds` or a feeds default scope
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    pub residual_text: String,
    pub filter: FilterPredicate,
    pub sort_key: Option<SortKey>,
    pub similarity_seed_id: Option<DocId>,
    pub negative: Option<NegativeExample>,
    pub is_feed_search: bool,
}

impl ParsedQuery {
    pub fn scope(&self) -> Scope {
        if self.is_feed_search { Scope::Feeds } else { Scope::Pages }
    }

    pub fn negative_text(&self) -> Option<&str> {
        match &self.negative {
            Some(NegativeExample::Text(t)) => Some(t),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedPurpose {
    Query,
    Document,
}

impl EmbedPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Document => "document",
        }
    }
}

/// What the index should search with. Exactly one of the two is sent.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryInput {
    Vector(EmbeddingVector),
    /// Embedded by the index itself.
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexQuery {
    pub namespace: String,
    pub input: QueryInput,
    pub filter: FilterPredicate,
    pub top_k: usize,
    pub include_values: bool,
}

/// A match as returned by the index. Higher `score` is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMatch {
    pub id: DocId,
    pub score: f32,
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<EmbeddingVector>,
}

impl RawMatch {
    pub fn new(id: impl Into<DocId>, score: f32, metadata: Metadata) -> Self {
        Self { id: id.into(), score, metadata, values: None }
    }

    /// String metadata value; empty strings count as missing.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).and_then(Value::as_f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestPost {
    pub title: String,
    pub url: String,
    pub date: String,
    pub subtitle: String,
}

/// One presentable search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub score: f32,
    pub basedomain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rss_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_post: Option<LatestPost>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    pub total_results: usize,
    pub elapsed_seconds: f64,
}

impl SearchOutcome {
    pub fn new(results: Vec<SearchResult>, elapsed_seconds: f64) -> Self {
        Self { total_results: results.len(), results, elapsed_seconds }
    }
}
