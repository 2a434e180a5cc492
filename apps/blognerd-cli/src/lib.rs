//! Wiring shared by the `blognerd` and `blognerd-indexer` binaries.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use blognerd_core::config::{expand_path, AppConfig};
use blognerd_core::traits::Embedder;
use blognerd_core::types::{SearchOutcome, SearchResult};
use blognerd_embed::get_default_embedder;
use blognerd_index::{IndexBackedResolver, LanceIndex};
use blognerd_query::{SearchOptions, SearchType};
use blognerd_search::SearchOrchestrator;

/// Logs go to stderr so `--json` output stays parseable. `RUST_LOG` wins over `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Open the index at `index.uri`; `embedder` serves text queries against it.
pub fn open_index(settings: &AppConfig, embedder: Arc<dyn Embedder>) -> Result<Arc<LanceIndex>> {
    let uri = expand_path(&settings.index.uri);
    let index =
        LanceIndex::open(&uri.to_string_lossy(), settings.namespaces(), settings.index.dimension)?
            .with_text_embedder(embedder);
    Ok(Arc::new(index))
}

pub fn build_orchestrator(settings: &AppConfig) -> Result<SearchOrchestrator> {
    let embedder = get_default_embedder(&settings.embedding, settings.index.dimension)?;
    let index = open_index(settings, embedder.clone())?;
    let resolver = Arc::new(IndexBackedResolver::new(
        embedder,
        index.clone(),
        settings.search.pages_namespace.clone(),
    ));
    Ok(SearchOrchestrator::new(resolver, index, settings.namespaces()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Query(String),
    Shell,
    Like(String),
    Site(String),
    Similar(String),
    Export { format: ExportFormat, query: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Opml,
    Csv,
    Rss,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub command: Command,
    pub options: SearchOptions,
    pub limit: Option<usize>,
    pub json: bool,
    pub out: Option<String>,
}

pub const USAGE: &str = "Usage: blognerd <query|shell|like|site|similar|export> [args...]
  blognerd query \"<query>\" [--limit N] [--sites] [--type T] [--since WINDOW] [--json]
  blognerd shell [--sites] [--limit N]
  blognerd like <url>
  blognerd site <domain>
  blognerd similar <domain>
  blognerd export <opml|csv|rss> \"<query>\" [--limit N] [--out FILE]";

/// Hand-rolled flag parsing; free words after the command form its argument.
pub fn parse_args(args: &[String]) -> std::result::Result<Args, String> {
    let (cmd, rest) = args.split_first().ok_or_else(|| USAGE.to_string())?;
    let mut options = SearchOptions::default();
    let mut limit = None;
    let mut json = false;
    let mut out = None;
    let mut words: Vec<String> = Vec::new();

    let mut i = 0;
    while i < rest.len() {
        match rest[i].as_str() {
            "--limit" | "-n" => {
                let v = flag_value(rest, &mut i, "--limit")?;
                let n = v.parse::<usize>().map_err(|_| "Error: --limit requires a number")?;
                limit = Some(n);
            }
            "--sites" => options.search_type = SearchType::Sites,
            "--type" => options.content = Some(flag_value(rest, &mut i, "--type")?),
            "--since" => options.time = Some(flag_value(rest, &mut i, "--since")?),
            "--out" | "-o" => out = Some(flag_value(rest, &mut i, "--out")?),
            "--json" => json = true,
            arg if arg.starts_with("--") => return Err(format!("Unknown flag: {arg}")),
            word => words.push(word.to_string()),
        }
        i += 1;
    }

    let joined = words.join(" ");
    let command = match cmd.as_str() {
        "query" | "q" => Command::Query(joined),
        "shell" => Command::Shell,
        "like" if !joined.is_empty() => Command::Like(joined),
        "site" if !joined.is_empty() => Command::Site(joined),
        "similar" if !joined.is_empty() => Command::Similar(joined),
        "export" => {
            let (format, query) = match words.split_first() {
                Some((f, q)) if f == "opml" => (ExportFormat::Opml, q.join(" ")),
                Some((f, q)) if f == "csv" => (ExportFormat::Csv, q.join(" ")),
                Some((f, q)) if f == "rss" => (ExportFormat::Rss, q.join(" ")),
                _ => return Err("Usage: blognerd export <opml|csv|rss> \"<query>\"".to_string()),
            };
            Command::Export { format, query }
        }
        "like" | "site" | "similar" => return Err(format!("Usage: blognerd {cmd} <value>")),
        other => return Err(format!("Unknown command: {other}\n{USAGE}")),
    };
    Ok(Args { command, options, limit, json, out })
}

fn flag_value(rest: &[String], i: &mut usize, name: &str) -> std::result::Result<String, String> {
    *i += 1;
    rest.get(*i).cloned().ok_or_else(|| format!("Error: {name} requires a value"))
}

/// Empty input runs the configured default query.
pub fn effective_query<'a>(input: &'a str, settings: &'a AppConfig) -> &'a str {
    let trimmed = input.trim();
    if trimmed.is_empty() { &settings.search.default_query } else { trimmed }
}

pub fn render_text(query: &str, outcome: &SearchOutcome) -> String {
    let mut out = format!(
        "🔍 Found {} results for: \"{}\" ({:.3}s)\n",
        outcome.total_results, query, outcome.elapsed_seconds
    );
    for (i, r) in outcome.results.iter().enumerate() {
        out.push_str(&render_result(i + 1, r));
    }
    out
}

fn render_result(rank: usize, r: &SearchResult) -> String {
    let mut s = format!("\n  {rank}. score={:.3}  {}\n", r.score, r.title);
    s.push_str(&format!("     🔗 {}", r.url));
    if !r.date.is_empty() {
        s.push_str(&format!("  📅 {}", r.date));
    }
    if !r.basedomain.is_empty() && r.rss_url.is_none() {
        s.push_str(&format!("  🌐 {}", r.basedomain));
    }
    s.push('\n');
    if !r.subtitle.is_empty() {
        s.push_str(&format!("     📝 {}\n", r.subtitle));
    }
    if let Some(rss) = &r.rss_url {
        s.push_str(&format!("     📡 {rss}\n"));
    }
    if let Some(post) = &r.latest_post {
        s.push_str(&format!("     🆕 {} ({}) {}\n", post.title, post.date, post.url));
    }
    s
}
