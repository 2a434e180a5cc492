//! Directive keys, their value tables, and what each one contributes.

use blognerd_core::types::{NegativeExample, SortKey};
use blognerd_core::{Clause, Error, Result};

/// Metadata fields targeted by filtering directives.
pub mod fields {
    pub const CONTENT_TYPE: &str = "rsstype";
    pub const SITE_TYPE: &str = "site_type";
    pub const OWNER_TYPE: &str = "owner_type";
    pub const PUBLISHED: &str = "unix_time";
    pub const BASE_URL: &str = "base_url";
    pub const LANG: &str = "lang";
    pub const SCORE: &str = "score";
    pub const LENGTH: &str = "length";
}

/// Substituted for an empty residual so the embedder never sees "".
pub const PLACEHOLDER_TEXT: &str = "a";
/// Any occurrence of this text turns the query into a feed search.
pub const FEED_MARKER: &str = "type:feeds";
pub const ACADEMIC: &str = "academic";
const EVERYTHING: &str = "everything";
const INDIVIDUAL: &str = "individual";

const DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DirectiveKey {
    Type,
    Sype,
    Oype,
    Since,
    Site,
    Lang,
    Score,
    Length,
    Like,
    Negation,
    Sort,
}

impl DirectiveKey {
    /// Order in which matched directives are resolved, independent of where
    /// they appear in the input.
    pub const RESOLUTION_ORDER: [DirectiveKey; 11] = [
        Self::Type,
        Self::Sype,
        Self::Oype,
        Self::Since,
        Self::Site,
        Self::Lang,
        Self::Score,
        Self::Length,
        Self::Like,
        Self::Negation,
        Self::Sort,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            Self::Type => "type:",
            Self::Sype => "sype:",
            Self::Oype => "oype:",
            Self::Since => "since:",
            Self::Site => "site:",
            Self::Lang => "lang:",
            Self::Score => "score:",
            Self::Length => "length:",
            Self::Like => "like:",
            Self::Negation => "<",
            Self::Sort => "sort:",
        }
    }

    /// Split a whitespace-free token into `(key, value)` when it starts with a
    /// `key:` prefix. Matching is case-sensitive.
    pub fn split_token(token: &str) -> Option<(DirectiveKey, &str)> {
        Self::RESOLUTION_ORDER
            .iter()
            .filter(|k| **k != Self::Negation)
            .find_map(|k| token.strip_prefix(k.prefix()).map(|value| (*k, value)))
    }
}

/// What a single directive contributes to the parsed query.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Filter(&'static str, Clause),
    SimilaritySeed(String),
    Negative(NegativeExample),
    Sort(SortKey),
    /// Recognized key with an unrecognized or empty value.
    Nothing,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DirectiveLexicon;

impl DirectiveLexicon {
    pub fn new() -> Self { Self }

    /// `type:` synonyms → canonical content type.
    pub fn content_type(&self, value: &str) -> Option<&'static str> {
        match value {
            "news" => Some("news"),
            "academic" | "arxiv" | "arxiv.org" | "papers" | "journals" => Some(ACADEMIC),
            "blog" | "blogs" => Some("blog"),
            _ => None,
        }
    }

    /// `sype:` value → accepted `site_type` labels.
    pub fn site_types(&self, value: &str) -> Option<&'static [&'static str]> {
        match value {
            "blog" => Some(&["blog", "individual / personal blog"]),
            "periodic" => Some(&["periodic newsletter digest"]),
            "eng" => Some(&["company engineering blog"]),
            "news" => Some(&["news / media publication"]),
            _ => None,
        }
    }

    /// `since:` window length in seconds.
    pub fn since_seconds(&self, value: &str) -> Option<i64> {
        match value {
            "yesterday" => Some(DAY),
            "last_3days" => Some(3 * DAY),
            "last_week" => Some(7 * DAY),
            "last_month" => Some(30 * DAY),
            "last_3months" => Some(3 * 30 * DAY),
            "last_year" => Some(365 * DAY),
            _ => None,
        }
    }

    pub fn sort_key(&self, value: &str) -> Option<SortKey> {
        match value {
            "time" | "date" | "recent" => Some(SortKey::Recency),
            "relevance" | "score" => Some(SortKey::Relevance),
            _ => None,
        }
    }

    /// Translate one directive value. `now` is the unix time used for `since:`.
    ///
    /// Unrecognized values yield `Effect::Nothing`; only a non-numeric
    /// `score:`/`length:` value is an error.
    pub fn translate(&self, key: DirectiveKey, value: &str, now: i64) -> Result<Effect> {
        let effect = match key {
            DirectiveKey::Type => match self.content_type(value) {
                Some(t) => Effect::Filter(fields::CONTENT_TYPE, Clause::eq(t)),
                None => Effect::Nothing,
            },
            DirectiveKey::Sype => match self.site_types(value) {
                Some(labels) => {
                    let labels = labels.iter().map(|s| s.to_string()).collect();
                    Effect::Filter(fields::SITE_TYPE, Clause::is_in(labels))
                }
                None => Effect::Nothing,
            },
            DirectiveKey::Oype => match value {
                "" | EVERYTHING => Effect::Nothing,
                INDIVIDUAL => Effect::Filter(fields::OWNER_TYPE, Clause::eq(INDIVIDUAL)),
                _ => Effect::Filter(fields::OWNER_TYPE, Clause::ne(INDIVIDUAL)),
            },
            DirectiveKey::Since => match self.since_seconds(value) {
                Some(secs) => Effect::Filter(fields::PUBLISHED, Clause::gt(now - secs)),
                None => Effect::Nothing,
            },
            DirectiveKey::Site if !value.is_empty() => {
                Effect::Filter(fields::BASE_URL, Clause::eq(value))
            }
            DirectiveKey::Lang if !value.is_empty() => {
                Effect::Filter(fields::LANG, Clause::eq(value))
            }
            DirectiveKey::Score => {
                Effect::Filter(fields::SCORE, Clause::gt(parse_threshold(key, value)?))
            }
            DirectiveKey::Length => {
                Effect::Filter(fields::LENGTH, Clause::gt(parse_threshold(key, value)?))
            }
            DirectiveKey::Like if !value.is_empty() => Effect::SimilaritySeed(value.to_string()),
            DirectiveKey::Negation => Effect::Negative(negative_example(value)),
            DirectiveKey::Sort => self.sort_key(value).map_or(Effect::Nothing, Effect::Sort),
            DirectiveKey::Site | DirectiveKey::Lang | DirectiveKey::Like => Effect::Nothing,
        };
        Ok(effect)
    }
}

fn parse_threshold(key: DirectiveKey, value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::Parse { key: key.prefix().to_string(), value: value.to_string() })
}

/// `raw` is the whole bracket span as written, e.g. `<helm charts>`.
fn negative_example(raw: &str) -> NegativeExample {
    match raw.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        Some(inner) if !inner.trim().is_empty() => NegativeExample::Text(inner.trim().to_string()),
        _ => NegativeExample::Malformed(raw.to_string()),
    }
}
