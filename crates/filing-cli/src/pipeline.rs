//! Batch processing of filing documents.
//!
//! Filings are independent: each one runs through its own transform pass on
//! the rayon pool and is written on its own. Results come back in input
//! order regardless of scheduling.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use filing_model::TableRows;
use filing_output::{FilingLabel, OutputOptions, TableWriter, WrittenTable, merge_tables};
use filing_schema::{SchemaRegistry, SchemaSummary};
use filing_transform::{EngineOptions, FilingGraph, FsBlobStore, TransformEngine};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use tracing::{error, info, info_span};

use crate::config::BlobConfig;

/// Directory name used for merged output.
pub const MERGED_DIR: &str = "merged";

/// Everything a batch run needs.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub inputs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub engine: EngineOptions,
    pub output: OutputOptions,
    pub blob: BlobConfig,
    pub schema: Option<PathBuf>,
    /// Also write one combined table set under `<output_dir>/merged`.
    pub merge: bool,
    /// Worker threads; rayon's default when unset.
    pub jobs: Option<usize>,
    /// Transform without writing anything.
    pub dry_run: bool,
    pub progress: bool,
}

impl RunSettings {
    pub fn new(inputs: Vec<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            inputs,
            output_dir: output_dir.into(),
            engine: EngineOptions::default(),
            output: OutputOptions::default(),
            blob: BlobConfig::default(),
            schema: None,
            merge: false,
            jobs: None,
            dry_run: false,
            progress: false,
        }
    }
}

/// Outcome for one input document.
#[derive(Debug, Clone)]
pub struct FilingSummary {
    pub input: PathBuf,
    pub accession: String,
    pub cik: Option<String>,
    /// The transform pass failed; only a Report marker was produced.
    pub failed: bool,
    pub failure_reason: Option<String>,
    /// Writing the tables failed.
    pub write_error: Option<String>,
    pub facts: usize,
    pub nodes: usize,
    pub edges: usize,
    pub externalized: usize,
    pub duplicate_facts: usize,
    pub output_dir: Option<PathBuf>,
    pub written: Vec<WrittenTable>,
    pub duration_ms: u64,
}

impl FilingSummary {
    pub fn is_ok(&self) -> bool {
        !self.failed && self.write_error.is_none()
    }

    fn from_graph(input: &Path, graph: &FilingGraph) -> Self {
        Self {
            input: input.to_path_buf(),
            accession: graph.accession.clone(),
            cik: graph.cik.clone(),
            failed: graph.failed,
            failure_reason: graph.report().and_then(|r| r.failure_reason.clone()),
            write_error: None,
            facts: graph.stats.facts_emitted,
            nodes: graph.tables.total_nodes(),
            edges: graph.tables.total_edges(),
            externalized: graph.stats.externalized,
            duplicate_facts: graph.stats.duplicate_facts,
            output_dir: None,
            written: Vec::new(),
            duration_ms: graph.stats.duration_ms,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub output_dir: PathBuf,
    pub schema: SchemaSummary,
    pub filings: Vec<FilingSummary>,
    pub merged: Vec<WrittenTable>,
    pub dry_run: bool,
    pub duration_ms: u64,
}

impl RunResult {
    pub fn has_failures(&self) -> bool {
        self.filings.iter().any(|filing| !filing.is_ok())
    }

    pub fn failed_count(&self) -> usize {
        self.filings.iter().filter(|filing| !filing.is_ok()).count()
    }
}

/// Turns an accession number into a portable directory name.
pub fn filing_dir_name(accession: &str) -> String {
    let name: String = accession
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() || name.chars().all(|c| c == '.') {
        "unknown-filing".to_string()
    } else {
        name
    }
}

/// Output directory of one filing's tables.
pub fn filing_output_dir(output_dir: &Path, options: &OutputOptions, accession: &str) -> PathBuf {
    if options.naming.is_filing_scoped() {
        output_dir.to_path_buf()
    } else {
        output_dir.join(filing_dir_name(accession))
    }
}

fn build_engine(settings: &RunSettings) -> TransformEngine {
    let engine = TransformEngine::new(settings.engine.clone());
    match &settings.blob.dir {
        Some(dir) => {
            let mut store = FsBlobStore::new(dir);
            if let Some(base_url) = &settings.blob.base_url {
                store = store.with_base_url(base_url.clone());
            }
            engine.with_blob_store(Arc::new(store))
        }
        None => engine,
    }
}

fn progress_bar(settings: &RunSettings) -> Option<ProgressBar> {
    if !settings.progress {
        return None;
    }
    let bar = ProgressBar::new(u64::try_from(settings.inputs.len()).unwrap_or(u64::MAX));
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("#>-"));
    }
    Some(bar)
}

struct FilingOutcome {
    summary: FilingSummary,
    tables: Option<Vec<TableRows>>,
}

fn process_one(
    path: &Path,
    engine: &TransformEngine,
    writer: &TableWriter<'_>,
    settings: &RunSettings,
) -> FilingOutcome {
    let graph = engine.process_path(path);
    let mut summary = FilingSummary::from_graph(path, &graph);
    let tables = graph.to_table_rows();
    if !settings.dry_run {
        let dir = filing_output_dir(&settings.output_dir, &settings.output, &graph.accession);
        let label = FilingLabel::new(graph.cik.clone(), graph.accession.clone());
        match writer.write_tables(&dir, &tables, &label) {
            Ok(written) => {
                summary.written = written;
                summary.output_dir = Some(dir);
            }
            Err(write_error) => {
                error!(accession = %graph.accession, error = %write_error, "failed to write tables");
                summary.write_error = Some(write_error.to_string());
            }
        }
    }
    FilingOutcome {
        summary,
        tables: settings.merge.then_some(tables),
    }
}

/// Processes every input and writes its tables.
///
/// Per-filing failures are recorded in the result; only setup problems
/// (schema, thread pool, merged output) return an error.
pub fn run_filings(settings: &RunSettings) -> Result<RunResult> {
    let span = info_span!("run", inputs = settings.inputs.len());
    let _guard = span.enter();
    let start = Instant::now();

    let registry = SchemaRegistry::resolve(settings.schema.as_deref())
        .context("load graph schema")?;
    let schema = registry.summary();
    info!(
        source = %schema.source,
        fingerprint = %schema.fingerprint,
        tables = schema.table_count,
        "graph schema loaded"
    );

    let engine = build_engine(settings);
    let writer = TableWriter::new(&registry, &settings.output);
    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = settings.jobs {
        pool = pool.num_threads(jobs);
    }
    let pool = pool.build().context("build worker pool")?;

    let bar = progress_bar(settings);
    let outcomes: Vec<FilingOutcome> = pool.install(|| {
        settings
            .inputs
            .par_iter()
            .map(|path| {
                let outcome = process_one(path, &engine, &writer, settings);
                if let Some(bar) = &bar {
                    bar.set_message(outcome.summary.accession.clone());
                    bar.inc(1);
                }
                outcome
            })
            .collect()
    });
    if let Some(bar) = &bar {
        bar.finish_with_message("done");
    }

    let mut filings = Vec::with_capacity(outcomes.len());
    let mut graphs = Vec::new();
    for outcome in outcomes {
        filings.push(outcome.summary);
        if let Some(tables) = outcome.tables {
            graphs.push(tables);
        }
    }

    let mut merged = Vec::new();
    if settings.merge && !settings.dry_run {
        let dir = settings.output_dir.join(MERGED_DIR);
        let label = FilingLabel::new(None, MERGED_DIR);
        merged = writer
            .write_tables(&dir, &merge_tables(graphs), &label)
            .with_context(|| format!("write merged tables to {}", dir.display()))?;
    }

    let result = RunResult {
        output_dir: settings.output_dir.clone(),
        schema,
        filings,
        merged,
        dry_run: settings.dry_run,
        duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    };
    info!(
        filings = result.filings.len(),
        failed = result.failed_count(),
        duration_ms = result.duration_ms,
        "run complete"
    );
    Ok(result)
}
