use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use blognerd_core::traits::{EmbeddingResolver, VectorIndex};
use blognerd_core::types::{
    EmbedPurpose, EmbeddingVector, IndexQuery, LatestPost, Namespaces, NegativeExample,
    ParsedQuery, QueryInput, Scope, SearchOutcome, SearchResult, SortKey,
};
use blognerd_core::{Clause, Error, FilterPredicate, Result};
use blognerd_query::QueryParser;

use crate::negation::NegationComposer;
use crate::projector::ResultProjector;

/// Pages fetched per feed when looking for its newest post.
const LATEST_POST_CANDIDATES: usize = 50;
/// Neutral text used to embed latest-post lookups; only the filter matters.
const GENERIC_QUERY: &str = "content";
/// Neutral text for the feed-entry lookup behind `similar_sites`.
const SITE_LOOKUP_QUERY: &str = "blog content";

/// Runs one search: vector resolution, a single index call, projection.
///
/// Holds only shared immutable collaborators, so one instance can serve
/// concurrent callers.
pub struct SearchOrchestrator {
    resolver: Arc<dyn EmbeddingResolver>,
    index: Arc<dyn VectorIndex>,
    namespaces: Namespaces,
    parser: QueryParser,
    negation: NegationComposer,
    projector: ResultProjector,
}

impl SearchOrchestrator {
    pub fn new(
        resolver: Arc<dyn EmbeddingResolver>,
        index: Arc<dyn VectorIndex>,
        namespaces: Namespaces,
    ) -> Self {
        Self {
            resolver,
            index,
            namespaces,
            parser: QueryParser::new(),
            negation: NegationComposer::default(),
            projector: ResultProjector::new(),
        }
    }

    /// Parse `raw` and run it.
    pub fn search(&self, raw: &str, default_scope: Scope, limit: usize) -> Result<SearchOutcome> {
        let parsed = self.parser.parse(raw, default_scope)?;
        self.execute(&parsed, limit)
    }

    pub fn execute(&self, query: &ParsedQuery, limit: usize) -> Result<SearchOutcome> {
        let scope = query.scope();
        let request = if query.is_feed_search {
            IndexQuery {
                namespace: self.namespaces.feeds.clone(),
                input: QueryInput::Text(query.residual_text.clone()),
                filter: FilterPredicate::new(),
                top_k: limit,
                include_values: false,
            }
        } else {
            IndexQuery {
                namespace: self.namespaces.pages.clone(),
                input: QueryInput::Vector(self.resolve_vector(query)?),
                filter: query.filter.clone(),
                top_k: limit,
                include_values: false,
            }
        };
        self.run(&request, scope, query.sort_key)
    }

    /// Feeds closest to `domain`'s own feed entry, by its stored vector.
    /// A domain with no entry is matched on its embedded name instead.
    pub fn similar_sites(&self, domain: &str, limit: usize) -> Result<SearchOutcome> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(Error::Lookup("similar sites needs a domain".to_string()));
        }
        let vector = match self.stored_feed_vector(domain)? {
            Some(v) => v,
            None => {
                debug!(domain, "no feed entry for domain, embedding its name");
                self.embed_one(domain)?
            }
        };
        let request = IndexQuery {
            namespace: self.namespaces.feeds.clone(),
            input: QueryInput::Vector(vector),
            filter: FilterPredicate::new(),
            top_k: limit,
            include_values: false,
        };
        self.run(&request, Scope::Feeds, None)
    }

    fn stored_feed_vector(&self, domain: &str) -> Result<Option<EmbeddingVector>> {
        let request = IndexQuery {
            namespace: self.namespaces.feeds.clone(),
            input: QueryInput::Vector(self.embed_one(SITE_LOOKUP_QUERY)?),
            filter: FilterPredicate::new().with("baseurl", Clause::eq(domain)),
            top_k: 1,
            include_values: true,
        };
        let raw = self
            .index
            .query(&request)
            .map_err(|e| Error::search(format!("looking up feed entry for '{domain}'"), e))?;
        Ok(raw.into_iter().next().and_then(|m| m.values))
    }

    /// The single timed index call; embedding happens before it.
    fn run(
        &self,
        request: &IndexQuery,
        scope: Scope,
        sort_key: Option<SortKey>,
    ) -> Result<SearchOutcome> {
        let started = Instant::now();
        let raw = self
            .index
            .query(request)
            .map_err(|e| Error::search(format!("querying namespace '{}'", request.namespace), e))?;
        let elapsed = started.elapsed().as_secs_f64();

        let matches = raw.len();
        let results = self.projector.project(raw, scope, sort_key);
        info!(
            namespace = %request.namespace,
            matches,
            results = results.len(),
            elapsed,
            "search done"
        );
        Ok(SearchOutcome::new(results, elapsed))
    }

    fn resolve_vector(&self, query: &ParsedQuery) -> Result<EmbeddingVector> {
        if let Some(NegativeExample::Malformed(raw)) = &query.negative {
            return Err(Error::Lookup(format!("unterminated or empty negation '{raw}'")));
        }

        if let Some(id) = &query.similarity_seed_id {
            if query.negative.is_some() {
                debug!(id = %id, "negation ignored for like: queries");
            }
            return self
                .resolver
                .fetch_by_id(id)
                .map_err(|e| Error::search(format!("fetching vector for '{id}'"), e))?
                .ok_or_else(|| Error::Lookup(format!("no indexed document with id '{id}'")));
        }

        let primary = self.embed_one(&query.residual_text)?;
        match query.negative_text() {
            Some(negative) => {
                let negative = self.embed_one(negative)?;
                self.negation.compose(&primary, &negative)
            }
            None => Ok(primary),
        }
    }

    fn embed_one(&self, text: &str) -> Result<EmbeddingVector> {
        self.resolver
            .embed(&[text.to_string()], EmbedPurpose::Query)
            .map_err(|e| Error::search("embedding query text", e))?
            .into_iter()
            .next()
            .ok_or_else(|| {
                let cause = anyhow::anyhow!("embedder returned no vector");
                Error::search("embedding query text", cause)
            })
    }

    /// Attach each feed's newest indexed post, for the first `max_feeds`
    /// results. Lookups that fail are logged and skipped.
    pub fn attach_latest_posts(&self, results: &mut [SearchResult], max_feeds: usize) {
        if results.is_empty() || max_feeds == 0 {
            return;
        }
        let generic = match self.embed_one(GENERIC_QUERY) {
            Ok(v) => v,
            Err(e) => {
                warn!("latest posts skipped: {}", e);
                return;
            }
        };
        for result in results.iter_mut().take(max_feeds) {
            if result.basedomain.is_empty() {
                continue;
            }
            let request = IndexQuery {
                namespace: self.namespaces.pages.clone(),
                input: QueryInput::Vector(generic.clone()),
                filter: FilterPredicate::new()
                    .with("base_url", Clause::eq(result.basedomain.as_str())),
                top_k: LATEST_POST_CANDIDATES,
                include_values: false,
            };
            let raw = match self.index.query(&request) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("latest post lookup for {} failed: {}", result.basedomain, e);
                    continue;
                }
            };
            let newest = self
                .projector
                .project(raw, Scope::Pages, Some(SortKey::Recency))
                .into_iter()
                .next();
            result.latest_post = newest.map(|p| LatestPost {
                title: p.title,
                url: p.url,
                date: p.date,
                subtitle: p.subtitle,
            });
        }
    }
}
