use std::collections::HashSet;

use blognerd_core::types::{RawMatch, Scope, SearchResult, SortKey};

use crate::dates::{format_day, parse_published};

/// Turns raw index matches into deduplicated, ranked results.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultProjector;

impl ResultProjector {
    pub fn new() -> Self { Self }

    pub fn project(
        &self,
        raw: Vec<RawMatch>,
        scope: Scope,
        sort_key: Option<SortKey>,
    ) -> Vec<SearchResult> {
        let ranked = by_score(raw);
        match scope {
            Scope::Feeds => project_feeds(ranked),
            Scope::Pages => project_pages(ranked, sort_key == Some(SortKey::Recency)),
        }
    }
}

/// Stable sort, best score first.
fn by_score(mut raw: Vec<RawMatch>) -> Vec<RawMatch> {
    raw.sort_by(|a, b| b.score.total_cmp(&a.score));
    raw
}

fn round3(score: f32) -> f32 { (score * 1000.0).round() / 1000.0 }

pub(crate) fn collapse_newlines(title: &str) -> String {
    title.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Publish time in unix seconds: `unix_time`, else a parsed `dt_published`.
pub(crate) fn published_at(m: &RawMatch) -> Option<i64> {
    m.number("unix_time")
        .map(|t| t as i64)
        .or_else(|| m.text("dt_published").and_then(parse_published).map(|dt| dt.timestamp()))
}

fn project_pages(ranked: Vec<RawMatch>, newest_first: bool) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    let mut rows: Vec<(Option<i64>, SearchResult)> = Vec::with_capacity(ranked.len());
    for m in ranked {
        let title = collapse_newlines(m.text("title").unwrap_or_default());
        if !seen.insert(title.clone()) {
            continue;
        }
        let published = published_at(&m);
        let result = SearchResult {
            title,
            subtitle: m.text("subtitle").unwrap_or_default().to_string(),
            date: m.text("dt_published").map(format_day).unwrap_or_default(),
            score: round3(m.score),
            basedomain: m.text("base_url").unwrap_or_default().to_string(),
            rss_url: None,
            latest_post: None,
            url: m.id,
        };
        rows.push((published, result));
    }
    if newest_first {
        // None sorts below Some, so undated rows end up last.
        rows.sort_by(|a, b| b.0.cmp(&a.0));
    }
    rows.into_iter().map(|(_, r)| r).collect()
}

fn project_feeds(ranked: Vec<RawMatch>) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(ranked.len());
    for m in ranked {
        let baseurl = m.text("baseurl").unwrap_or(&m.id).to_string();
        if !seen.insert(baseurl.clone()) {
            continue;
        }
        let title = match m.text("owner_name") {
            Some(owner) => format!("{owner} ({baseurl})"),
            None => baseurl.clone(),
        };
        out.push(SearchResult {
            url: baseurl.clone(),
            title,
            subtitle: m.text("short_summary").unwrap_or_default().to_string(),
            date: String::new(),
            score: round3(m.score),
            basedomain: baseurl,
            rss_url: Some(m.id.clone()),
            latest_post: None,
        });
    }
    out
}
