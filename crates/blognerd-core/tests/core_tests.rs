use serde_json::json;
use tempfile::TempDir;

use blognerd_core::config::{expand_path, resolve_with_base};
use blognerd_core::types::{
    NegativeExample, ParsedQuery, RawMatch, Scope, SearchOutcome, SearchResult,
};
use blognerd_core::{Clause, Error, FilterPredicate};

fn parsed(is_feed_search: bool, negative: Option<NegativeExample>) -> ParsedQuery {
    ParsedQuery {
        residual_text: "a".into(),
        filter: FilterPredicate::new(),
        sort_key: None,
        similarity_seed_id: None,
        negative,
        is_feed_search,
    }
}

#[test]
fn parsed_query_scope_and_negative_text() {
    assert_eq!(parsed(true, None).scope(), Scope::Feeds);
    assert_eq!(parsed(false, None).scope(), Scope::Pages);
    let q = parsed(false, Some(NegativeExample::Text("helm charts".into())));
    assert_eq!(q.negative_text(), Some("helm charts"));
    let q = parsed(false, Some(NegativeExample::Malformed("<helm".into())));
    assert_eq!(q.negative_text(), None);
}

#[test]
fn raw_match_metadata_accessors() {
    let meta = json!({"title": "Hello", "empty": "", "score": 0.7, "unix_time": 1_700_000_000i64});
    let m = RawMatch::new("https://a.dev/p", 0.9, meta.as_object().cloned().unwrap());
    assert_eq!(m.text("title"), Some("Hello"));
    assert_eq!(m.text("empty"), None, "empty strings read as missing");
    assert_eq!(m.text("missing"), None);
    assert_eq!(m.number("score"), Some(0.7));
    assert_eq!(m.number("unix_time"), Some(1_700_000_000.0));
}

#[test]
fn outcome_serializes_caller_shape() {
    let result = SearchResult {
        url: "https://a.dev/p".into(),
        title: "Hello".into(),
        subtitle: "sub".into(),
        date: "01-02-2024".into(),
        score: 0.912,
        basedomain: "a.dev".into(),
        rss_url: None,
        latest_post: None,
    };
    let outcome = SearchOutcome::new(vec![result], 0.25);
    let v = serde_json::to_value(&outcome).unwrap();
    assert_eq!(v["total_results"], 1);
    assert_eq!(v["results"][0]["basedomain"], "a.dev");
    assert!(v["results"][0].get("rss_url").is_none(), "absent optionals are skipped");
}

#[test]
fn error_classification() {
    assert!(Error::Parse { key: "score".into(), value: "high".into() }.is_query_rejected());
    assert!(Error::Lookup("doc-123".into()).is_query_rejected());
    let err = Error::search("index query", anyhow::anyhow!("connection reset"));
    assert!(!err.is_query_rejected());
    let source = std::error::Error::source(&err).map(|s| s.to_string());
    assert_eq!(source.as_deref(), Some("connection reset"));
}

#[test]
fn filter_predicate_is_additive() {
    let filter =
        FilterPredicate::new().with("lang", Clause::eq("en")).with("score", Clause::gt(0.6));
    assert_eq!(filter.len(), 2);
}

#[test]
fn expand_and_resolve_paths() {
    let tmp = TempDir::new().unwrap();
    std::env::set_var("BLOGNERD_TEST_DIR", tmp.path());
    let p = expand_path("${BLOGNERD_TEST_DIR}/lancedb");
    assert_eq!(p, tmp.path().join("lancedb"));
    let rel = resolve_with_base(tmp.path(), "indexes/lancedb");
    assert_eq!(rel, tmp.path().join("indexes/lancedb"));
    let abs = resolve_with_base(tmp.path(), "/var/tmp/x");
    assert_eq!(abs, std::path::PathBuf::from("/var/tmp/x"));
}
