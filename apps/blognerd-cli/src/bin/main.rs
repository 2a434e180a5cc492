use std::env;
use std::io::{self, BufRead, Write};

use blognerd_cli::{
    build_orchestrator, effective_query, init_tracing, parse_args, render_text, Args, Command,
    ExportFormat,
};
use blognerd_core::config::{AppConfig, Config};
use blognerd_core::types::{Scope, SearchOutcome};
use blognerd_query::{more_from_site, more_like_this};
use blognerd_search::{to_csv, to_opml, to_rss, SearchOrchestrator};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let argv: Vec<String> = env::args().skip(1).collect();
    let args = parse_args(&argv).unwrap_or_else(|msg| {
        eprintln!("{msg}");
        std::process::exit(1)
    });
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings();
    let orchestrator = build_orchestrator(settings)?;

    match &args.command {
        Command::Query(q) => {
            let query = args.options.compose(effective_query(q, settings));
            run_and_print(&orchestrator, settings, &args, &query, args.options.default_scope())?;
        }
        Command::Like(url) => {
            run_and_print(&orchestrator, settings, &args, &more_like_this(url), Scope::Pages)?
        }
        Command::Site(domain) => {
            run_and_print(&orchestrator, settings, &args, &more_from_site(domain), Scope::Pages)?
        }
        Command::Similar(domain) => {
            let limit = settings.clamp_limit(args.limit);
            let mut outcome = orchestrator.similar_sites(domain, limit)?;
            let max_feeds = settings.search.latest_posts_max_feeds;
            orchestrator.attach_latest_posts(&mut outcome.results, max_feeds);
            print_outcome(&args, &format!("sites like {domain}"), &outcome)?;
        }
        Command::Shell => shell(&orchestrator, settings, &args)?,
        Command::Export { format, query } => {
            export(&orchestrator, settings, &args, *format, query)?
        }
    }
    Ok(())
}

fn search(
    orchestrator: &SearchOrchestrator,
    settings: &AppConfig,
    args: &Args,
    query: &str,
    scope: Scope,
) -> anyhow::Result<SearchOutcome> {
    let limit = settings.clamp_limit(args.limit);
    let mut outcome = orchestrator.search(query, scope, limit)?;
    if outcome.results.iter().any(|r| r.rss_url.is_some()) {
        let max_feeds = settings.search.latest_posts_max_feeds;
        orchestrator.attach_latest_posts(&mut outcome.results, max_feeds);
    }
    Ok(outcome)
}

/// OPML and CSV list matching feeds; RSS lists matching posts under the
/// usual search options.
fn export(
    orchestrator: &SearchOrchestrator,
    settings: &AppConfig,
    args: &Args,
    format: ExportFormat,
    query: &str,
) -> anyhow::Result<()> {
    let query = effective_query(query, settings);
    let now = chrono::Utc::now();
    let (body, count) = match format {
        ExportFormat::Opml => {
            let outcome = search(orchestrator, settings, args, query, Scope::Feeds)?;
            (to_opml(&outcome.results, query, now), outcome.results.len())
        }
        ExportFormat::Csv => {
            let outcome = search(orchestrator, settings, args, query, Scope::Feeds)?;
            (to_csv(&outcome.results), outcome.results.len())
        }
        ExportFormat::Rss => {
            let scope = args.options.default_scope();
            let composed = args.options.compose(query);
            let outcome = search(orchestrator, settings, args, &composed, scope)?;
            (to_rss(&outcome.results, query, scope, now), outcome.results.len())
        }
    };
    match &args.out {
        Some(path) => {
            std::fs::write(path, body)?;
            println!("✅ Exported {count} results to {path}");
        }
        None => print!("{body}"),
    }
    Ok(())
}

fn run_and_print(
    orchestrator: &SearchOrchestrator,
    settings: &AppConfig,
    args: &Args,
    query: &str,
    scope: Scope,
) -> anyhow::Result<()> {
    let outcome = search(orchestrator, settings, args, query, scope)?;
    print_outcome(args, query, &outcome)
}

fn print_outcome(args: &Args, label: &str, outcome: &SearchOutcome) -> anyhow::Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        print!("{}", render_text(label, outcome));
    }
    Ok(())
}

/// One query per line. Bad queries are reported and the loop continues.
fn shell(
    orchestrator: &SearchOrchestrator,
    settings: &AppConfig,
    args: &Args,
) -> anyhow::Result<()> {
    println!("🔍 blognerd shell\n================");
    println!("💡 Empty line runs the default query; 'quit' exits.");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if matches!(line, "quit" | "exit") {
            break;
        }
        let query = args.options.compose(effective_query(line, settings));
        let scope = args.options.default_scope();
        if let Err(e) = run_and_print(orchestrator, settings, args, &query, scope) {
            eprintln!("❌ {e:#}");
        }
    }
    Ok(())
}
