use std::collections::BTreeMap;

use chrono::Utc;
use tracing::debug;

use blognerd_core::types::{ParsedQuery, Scope};
use blognerd_core::{FilterPredicate, Result};

use crate::lexicon::{
    DirectiveKey, DirectiveLexicon, Effect, ACADEMIC, FEED_MARKER, PLACEHOLDER_TEXT,
};
use crate::tokenizer::{scan, strip_spans, DirectiveMatch};

/// Turns a raw search-box string into a `ParsedQuery`.
///
/// ```
/// use blognerd_core::types::Scope;
/// use blognerd_query::QueryParser;
///
/// let q = QueryParser::new().parse_at("rust lang:en", Scope::Pages, 0).unwrap();
/// assert_eq!(q.residual_text, "rust");
/// assert_eq!(q.filter.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryParser {
    lexicon: DirectiveLexicon,
}

impl QueryParser {
    pub fn new() -> Self { Self { lexicon: DirectiveLexicon::new() } }

    pub fn parse(&self, raw: &str, default_scope: Scope) -> Result<ParsedQuery> {
        self.parse_at(raw, default_scope, Utc::now().timestamp())
    }

    /// Parse with an explicit clock; `now` is unix seconds for `since:` windows.
    pub fn parse_at(&self, raw: &str, default_scope: Scope, now: i64) -> Result<ParsedQuery> {
        let found = scan(raw);

        // Substring match: `rust type:feeds,` is still a feed search.
        if raw.contains(FEED_MARKER) || default_scope == Scope::Feeds {
            return Ok(self.feed_query(raw, &found));
        }

        // Later repeats of a key are stripped but do not contribute.
        let mut first: BTreeMap<DirectiveKey, &DirectiveMatch<'_>> = BTreeMap::new();
        for m in &found {
            first.entry(m.key).or_insert(m);
        }

        let mut filter = FilterPredicate::new();
        let mut sort_key = None;
        let mut similarity_seed_id = None;
        let mut negative = None;
        let mut academic = false;

        for key in DirectiveKey::RESOLUTION_ORDER {
            let Some(m) = first.get(&key) else { continue };
            match key {
                DirectiveKey::Type => {
                    academic = self.lexicon.content_type(m.value) == Some(ACADEMIC)
                }
                DirectiveKey::Score if academic => {
                    debug!(value = m.value, "score threshold ignored for academic content");
                    continue;
                }
                _ => {}
            }
            match self.lexicon.translate(key, m.value, now)? {
                Effect::Filter(field, clause) => {
                    filter.insert(field, clause);
                }
                Effect::SimilaritySeed(id) => similarity_seed_id = Some(id),
                Effect::Negative(example) => negative = Some(example),
                Effect::Sort(k) => sort_key = Some(k),
                Effect::Nothing => {
                    debug!(key = key.prefix(), value = m.value, "directive value not recognized")
                }
            }
        }

        let spans: Vec<_> = found.iter().map(|m| m.span.clone()).collect();
        let parsed = ParsedQuery {
            residual_text: residual_or_placeholder(strip_spans(raw, &spans)),
            filter,
            sort_key,
            similarity_seed_id,
            negative,
            is_feed_search: false,
        };
        debug!(residual = %parsed.residual_text, filter = %parsed.filter, "parsed query");
        Ok(parsed)
    }

    /// Feed searches skip directive processing: `sort:` tokens and every
    /// `type:feeds` occurrence are dropped from the text, and no filter is built.
    fn feed_query(&self, raw: &str, found: &[DirectiveMatch<'_>]) -> ParsedQuery {
        let sort_spans: Vec<_> =
            found.iter().filter(|m| m.key == DirectiveKey::Sort).map(|m| m.span.clone()).collect();
        let text = strip_spans(raw, &sort_spans).replace(FEED_MARKER, " ");
        let residual_text =
            residual_or_placeholder(text.split_whitespace().collect::<Vec<_>>().join(" "));
        debug!(residual = %residual_text, "parsed feed query");
        ParsedQuery {
            residual_text,
            filter: FilterPredicate::new(),
            sort_key: None,
            similarity_seed_id: None,
            negative: None,
            is_feed_search: true,
        }
    }
}

fn residual_or_placeholder(text: String) -> String {
    if text.is_empty() { PLACEHOLDER_TEXT.to_string() } else { text }
}
