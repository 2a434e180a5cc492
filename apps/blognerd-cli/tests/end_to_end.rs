use std::path::PathBuf;

use blognerd_cli::{build_orchestrator, open_index};
use blognerd_core::config::AppConfig;
use blognerd_core::types::Scope;
use blognerd_core::Error;
use blognerd_embed::get_default_embedder;
use blognerd_index::JsonlIngest;
use blognerd_search::{to_csv, to_rss, SearchOrchestrator};
use tempfile::TempDir;

fn test_data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../test_data").join(name)
}

fn settings(tmp: &TempDir) -> AppConfig {
    let mut s = AppConfig::default();
    s.index.uri = tmp.path().join("lancedb").to_string_lossy().to_string();
    s.index.dimension = 32;
    s.embedding.use_fake = true;
    s.embedding.retry_attempts = 1;
    s
}

fn seeded() -> (TempDir, AppConfig, SearchOrchestrator) {
    let tmp = TempDir::new().expect("tmp");
    let s = settings(&tmp);
    let embedder = get_default_embedder(&s.embedding, s.index.dimension).expect("fake embedder");
    let index = open_index(&s, embedder.clone()).expect("open index");
    let ingest = JsonlIngest::new(&index).with_embedder(embedder);
    let pages = ingest.ingest_path(&s.search.pages_namespace, &test_data("pages.jsonl")).unwrap();
    assert_eq!(pages.written, 6);
    let feeds = ingest.ingest_path(&s.search.feeds_namespace, &test_data("feeds.jsonl")).unwrap();
    assert_eq!(feeds.written, 3);
    let orchestrator = build_orchestrator(&s).expect("orchestrator");
    (tmp, s, orchestrator)
}

#[test]
fn directive_query_filters_and_ranks() {
    let (_tmp, _s, o) = seeded();
    let query = "Sourdough starters baking at home lang:en type:blog";
    let outcome = o.search(query, Scope::Pages, 10).unwrap();
    assert_eq!(outcome.results[0].url, "https://b.dev/bread");
    assert_eq!(outcome.results[0].date, "29-12-2023");
    assert!(outcome.results.iter().all(|r| r.basedomain != "c.dev"), "lang:de news filtered out");
    assert!(outcome.results.iter().all(|r| r.basedomain != "e.dev"), "academic filtered out");
    assert_eq!(outcome.total_results, outcome.results.len());
}

#[test]
fn more_from_site_sorts_by_date() {
    let (_tmp, _s, o) = seeded();
    let outcome = o.search(&blognerd_query::more_from_site("a.dev"), Scope::Pages, 10).unwrap();
    let urls: Vec<_> = outcome.results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, ["https://a.dev/borrowck", "https://a.dev/rust-async"]);
}

#[test]
fn like_uses_the_stored_document_vector() {
    let (_tmp, _s, o) = seeded();
    let query = blognerd_query::more_like_this("https://d.dev/k8s");
    let outcome = o.search(&query, Scope::Pages, 3).unwrap();
    assert_eq!(outcome.results[0].url, "https://d.dev/k8s");

    let err = o.search("like:https://nowhere.dev/x", Scope::Pages, 3).unwrap_err();
    assert!(matches!(err, Error::Lookup(_)));
}

#[test]
fn feed_search_exports_and_gets_latest_posts() {
    let (_tmp, s, o) = seeded();
    let mut outcome = o.search("Rust systems programming blog", Scope::Feeds, 10).unwrap();
    assert_eq!(outcome.results.len(), 3);
    assert_eq!(outcome.results[0].rss_url.as_deref(), Some("https://a.dev/feed.xml"));

    o.attach_latest_posts(&mut outcome.results, s.search.latest_posts_max_feeds);
    let latest = outcome.results[0].latest_post.as_ref().expect("a.dev has pages");
    assert_eq!(latest.url, "https://a.dev/borrowck");

    let csv = to_csv(&outcome.results);
    let row = "Ana (a.dev),Rust systems programming blog,a.dev,https://a.dev/feed.xml";
    assert!(csv.lines().any(|l| l == row));
}

#[test]
fn similar_sites_starts_from_the_stored_feed_vector() {
    let (_tmp, _s, o) = seeded();
    let outcome = o.similar_sites("b.dev", 3).unwrap();
    assert_eq!(outcome.results.len(), 3);
    assert_eq!(outcome.results[0].basedomain, "b.dev");
    assert!(outcome.results[0].score > 0.99, "own entry is an exact match");

    let unknown = o.similar_sites("nowhere.dev", 3).unwrap();
    assert_eq!(unknown.results.len(), 3, "falls back to the embedded domain name");
}

#[test]
fn rss_export_lists_matching_posts() {
    let (_tmp, _s, o) = seeded();
    let outcome = o.search("Rust async runtimes site:a.dev", Scope::Pages, 10).unwrap();
    let now = chrono::Utc::now();
    let rss = to_rss(&outcome.results, "Rust async runtimes", Scope::Pages, now);
    assert!(rss.contains("<title>BlogNerd Search: Rust async runtimes</title>"));
    assert_eq!(rss.matches("<item>").count(), 2);
    assert!(rss.contains("<guid isPermaLink=\"true\">https://a.dev/rust-async</guid>"));
    assert!(rss.contains("<source>a.dev</source>"));
}
