//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "filing-graph",
    version,
    about = "Turn parsed financial filings into graph node and relationship tables",
    long_about = "Turn parsed financial filings into graph node and relationship tables.\n\n\
                  Each input is a JSON document model of one filing, optionally with a\n\
                  `<name>.meta.json` sidecar carrying filing metadata. Output is one CSV\n\
                  file per node kind and relationship kind."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for humans, json for machines).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow fact values in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Transform filing documents into graph tables.
    Process(ProcessArgs),

    /// List the graph tables and their columns.
    Tables(TablesArgs),
}

#[derive(Parser)]
pub struct ProcessArgs {
    /// Filing documents (JSON) to transform.
    #[arg(value_name = "FILING", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory receiving the tables.
    #[arg(long = "output-dir", short = 'o', value_name = "DIR", default_value = "graph-output")]
    pub output_dir: PathBuf,

    /// TOML configuration file.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Graph schema CSV replacing the embedded schema.
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: Option<PathBuf>,

    /// File naming convention for tables.
    #[arg(long = "naming", value_enum)]
    pub naming: Option<NamingArg>,

    /// Write tables that have no rows.
    #[arg(long = "include-empty")]
    pub include_empty: bool,

    /// Store large and markup values below this directory.
    #[arg(long = "blob-dir", value_name = "DIR")]
    pub blob_dir: Option<PathBuf>,

    /// URL prefix recorded for externalized values.
    #[arg(long = "blob-base-url", value_name = "URL")]
    pub blob_base_url: Option<String>,

    /// Values longer than this many bytes are externalized.
    #[arg(long = "externalize-threshold", value_name = "BYTES")]
    pub externalize_threshold: Option<usize>,

    /// Keep every value inline.
    #[arg(long = "no-externalize")]
    pub no_externalize: bool,

    /// Only materialize labels in this language.
    #[arg(long = "label-lang", value_name = "LANG")]
    pub label_language: Option<String>,

    /// Also write one combined table set under `<DIR>/merged`.
    #[arg(long = "merge")]
    pub merge: bool,

    /// Number of filings processed in parallel.
    #[arg(long = "jobs", short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// Transform and report without writing files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Hide the progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

#[derive(Parser)]
pub struct TablesArgs {
    /// Show the columns of one table (e.g. `Fact` or `FACT_HAS_UNIT`).
    #[arg(long = "kind", value_name = "KIND")]
    pub kind: Option<String>,

    /// Graph schema CSV replacing the embedded schema.
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NamingArg {
    /// `Fact.csv`
    Bare,
    /// `node_Fact.csv`
    TypePrefixed,
    /// `Fact_<cik>_<accession>.csv`, all filings in one directory
    FilingSuffixed,
}
