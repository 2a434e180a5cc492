//! JSON-lines ingest into a namespace.
//!
//! Each line is a flat object: `id`, an optional `vector`, and metadata
//! fields. Rows without a vector are embedded from their display text.
use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use blognerd_core::traits::Embedder;
use blognerd_core::types::{EmbedPurpose, Metadata, Scope};

use crate::records::IndexDocument;
use crate::search::LanceIndex;

const DEFAULT_BATCH_SIZE: usize = 256;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub files: usize,
    pub written: usize,
    pub embedded: usize,
    pub skipped: usize,
}

/// A parsed line before embedding.
#[derive(Debug, Clone, PartialEq)]
struct PendingRecord {
    id: String,
    metadata: Metadata,
    vector: Option<Vec<f32>>,
}

pub struct JsonlIngest<'a> {
    index: &'a LanceIndex,
    embedder: Option<Arc<dyn Embedder>>,
    batch_size: usize,
    show_progress: bool,
}

impl<'a> JsonlIngest<'a> {
    pub fn new(index: &'a LanceIndex) -> Self {
        Self { index, embedder: None, batch_size: DEFAULT_BATCH_SIZE, show_progress: false }
    }

    /// Needed only when some records carry no `vector`.
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.max(1);
        self
    }

    pub fn show_progress(mut self, on: bool) -> Self {
        self.show_progress = on;
        self
    }

    /// Ingest one `.jsonl` file, or every `.jsonl` file under a directory.
    pub fn ingest_path(&self, namespace: &str, path: &Path) -> Result<IngestReport> {
        let scope = self
            .index
            .namespaces()
            .scope_of(namespace)
            .ok_or_else(|| anyhow!("unknown namespace '{}'", namespace))?;
        let files = collect_files(path)?;
        let mut report = IngestReport { files: files.len(), ..IngestReport::default() };

        let mut pending = Vec::new();
        for file in &files {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("reading {}", file.display()))?;
            for (lineno, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match parse_record(line) {
                    Ok(rec) => pending.push(rec),
                    Err(e) => {
                        tracing::warn!("{}:{}: skipping record: {}", file.display(), lineno + 1, e);
                        report.skipped += 1;
                    }
                }
            }
        }

        let pb = if self.show_progress {
            ProgressBar::new(pending.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] \
                     {pos}/{len} records ({percent}%) {msg}",
                )?
                .progress_chars("#>-"),
        );
        for chunk in pending.chunks(self.batch_size) {
            let (docs, embedded) = self.materialize(scope, chunk)?;
            report.embedded += embedded;
            report.written += self.index.upsert(namespace, &docs)?;
            pb.inc(chunk.len() as u64);
        }
        pb.finish_with_message(format!("✅ {} records into {}", report.written, namespace));
        tracing::info!(
            namespace,
            files = report.files,
            written = report.written,
            embedded = report.embedded,
            skipped = report.skipped,
            "ingest finished"
        );
        Ok(report)
    }

    fn materialize(
        &self,
        scope: Scope,
        records: &[PendingRecord],
    ) -> Result<(Vec<IndexDocument>, usize)> {
        let missing: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.vector.is_none())
            .map(|(i, _)| i)
            .collect();
        let mut fresh = Vec::new();
        if !missing.is_empty() {
            let embedder = self.embedder.as_ref().ok_or_else(|| {
                anyhow!("{} records have no vector and no embedder is configured", missing.len())
            })?;
            let texts: Vec<String> =
                missing.iter().map(|&i| display_text(scope, &records[i].metadata)).collect();
            fresh = embedder.embed_batch(&texts, EmbedPurpose::Document)?;
            if fresh.len() != texts.len() {
                return Err(anyhow!(
                    "embedder returned {} vectors for {} texts",
                    fresh.len(),
                    texts.len()
                ));
            }
        }
        let mut fresh = fresh.into_iter();
        let docs = records
            .iter()
            .map(|r| IndexDocument {
                id: r.id.clone(),
                metadata: r.metadata.clone(),
                vector: match &r.vector {
                    Some(v) => v.clone(),
                    None => fresh.next().unwrap_or_default(),
                },
            })
            .collect();
        Ok((docs, missing.len()))
    }
}

fn collect_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(anyhow!("{} does not exist", path.display()));
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.path().extension().is_some_and(|x| x == "jsonl"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    Ok(files)
}

fn parse_record(line: &str) -> Result<PendingRecord> {
    let mut metadata: Metadata = serde_json::from_str(line)?;
    let id = match metadata.remove("id") {
        Some(Value::String(s)) if !s.is_empty() => s,
        _ => return Err(anyhow!("missing string 'id'")),
    };
    let vector = match metadata.remove("vector") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            serde_json::from_value::<Vec<f32>>(v)
                .context("'vector' must be an array of numbers")?,
        ),
    };
    Ok(PendingRecord { id, metadata, vector })
}

/// Text a record is embedded from when it has no stored vector.
fn display_text(scope: Scope, metadata: &Metadata) -> String {
    let keys = match scope {
        Scope::Pages => ["title", "subtitle"],
        Scope::Feeds => ["owner_name", "short_summary"],
    };
    keys.iter()
        .filter_map(|k| metadata.get(*k).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
