use std::env;

use blognerd_cli::{init_tracing, open_index};
use blognerd_core::config::{expand_path, Config};
use blognerd_core::types::Scope;
use blognerd_embed::get_default_embedder;
use blognerd_index::JsonlIngest;

fn usage() -> ! {
    eprintln!("Usage: blognerd-indexer <pages|feeds> <path> [--batch-size N] [--quiet]");
    eprintln!("Example: blognerd-indexer pages ../dev_data/pages");
    std::process::exit(1)
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings();

    let args: Vec<String> = env::args().skip(1).collect();
    let mut scope = None;
    let mut data_path = None;
    let mut batch_size = None;
    let mut quiet = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--batch-size" => match args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) {
                Some(n) => {
                    batch_size = Some(n);
                    i += 1;
                }
                None => {
                    eprintln!("Error: --batch-size requires a number");
                    std::process::exit(1);
                }
            },
            "--quiet" | "-q" => quiet = true,
            "pages" if scope.is_none() => scope = Some(Scope::Pages),
            "feeds" if scope.is_none() => scope = Some(Scope::Feeds),
            a if !a.starts_with('-') && scope.is_some() => data_path = Some(expand_path(a)),
            _ => usage(),
        }
        i += 1;
    }
    let (Some(scope), Some(data_path)) = (scope, data_path) else { usage() };

    let namespaces = settings.namespaces();
    let namespace = namespaces.for_scope(scope);
    println!("📥 blognerd indexer\n==================");
    println!("Source: {}", data_path.display());
    println!("Index: {} (namespace {})", settings.index.uri, namespace);

    let embedder = get_default_embedder(&settings.embedding, settings.index.dimension)?;
    let index = open_index(settings, embedder.clone())?;
    let mut ingest = JsonlIngest::new(&index).with_embedder(embedder).show_progress(!quiet);
    if let Some(n) = batch_size {
        ingest = ingest.batch_size(n);
    }
    let report = ingest.ingest_path(namespace, &data_path)?;

    println!("\n✅ Indexing completed successfully!");
    println!(
        "📊 {} files, {} records written ({} embedded, {} skipped)",
        report.files, report.written, report.embedded, report.skipped
    );
    println!("📊 {} rows now in {}", index.count(namespace)?, namespace);
    println!("\n💡 To search, use: cargo run --bin blognerd query '<query>'");
    Ok(())
}
