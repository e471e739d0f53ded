use std::io::{self, IsTerminal};

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, Table};
use filing_cli::config::FileConfig;
use filing_cli::pipeline::{RunResult, RunSettings, run_filings};
use filing_model::TableKind;
use filing_output::NamingConvention;
use filing_schema::SchemaRegistry;

use crate::cli::{NamingArg, ProcessArgs, TablesArgs};
use crate::summary::{apply_table_style, dim_cell, header_cell};

fn naming_convention(arg: NamingArg) -> NamingConvention {
    match arg {
        NamingArg::Bare => NamingConvention::Bare,
        NamingArg::TypePrefixed => NamingConvention::TypePrefixed,
        NamingArg::FilingSuffixed => NamingConvention::FilingSuffixed,
    }
}

/// Layers command-line flags over the configuration file.
fn settings_from_args(args: &ProcessArgs, config: FileConfig) -> RunSettings {
    let mut settings = RunSettings::new(args.inputs.clone(), args.output_dir.clone());
    settings.engine = config.engine;
    settings.output = config.output;
    settings.blob = config.blob;
    settings.schema = args.schema.clone().or(config.schema);

    if let Some(naming) = args.naming {
        settings.output.naming = naming_convention(naming);
    }
    if args.include_empty {
        settings.output.include_empty_tables = true;
    }
    if let Some(dir) = &args.blob_dir {
        settings.blob.dir = Some(dir.clone());
    }
    if let Some(url) = &args.blob_base_url {
        settings.blob.base_url = Some(url.clone());
    }
    if let Some(bytes) = args.externalize_threshold {
        settings.engine.externalize_threshold_bytes = bytes;
    }
    if args.no_externalize {
        settings.engine.externalization_enabled = false;
    }
    if let Some(lang) = &args.label_language {
        settings.engine.label_language = Some(lang.clone());
    }
    settings.merge = args.merge;
    settings.jobs = args.jobs;
    settings.dry_run = args.dry_run;
    settings.progress = !args.no_progress && io::stderr().is_terminal();
    settings
}

pub fn run_process(args: &ProcessArgs) -> Result<RunResult> {
    if args.jobs == Some(0) {
        bail!("--jobs must be at least 1");
    }
    let config = FileConfig::load_optional(args.config.as_deref())?;
    let settings = settings_from_args(args, config);
    run_filings(&settings)
}

pub fn run_tables(args: &TablesArgs) -> Result<()> {
    let registry =
        SchemaRegistry::resolve(args.schema.as_deref()).context("load graph schema")?;
    match &args.kind {
        Some(name) => {
            let kind: TableKind = name
                .parse()
                .with_context(|| format!("unknown table {name}"))?;
            let Some(schema) = registry.get(kind) else {
                println!("{kind}: no schema, written as produced");
                return Ok(());
            };
            let mut table = Table::new();
            table.set_header(vec![
                header_cell("Column"),
                header_cell("Type"),
                header_cell("Required"),
            ]);
            apply_table_style(&mut table);
            for property in &schema.properties {
                table.add_row(vec![
                    Cell::new(&property.name),
                    Cell::new(property.property_type.as_str()),
                    if property.required {
                        Cell::new("yes")
                    } else {
                        dim_cell("no")
                    },
                ]);
            }
            println!("{kind} ({})", kind.partition());
            println!("{table}");
        }
        None => {
            let mut table = Table::new();
            table.set_header(vec![
                header_cell("Table"),
                header_cell("Partition"),
                header_cell("Columns"),
            ]);
            apply_table_style(&mut table);
            for kind in TableKind::all() {
                let columns = registry
                    .get(kind)
                    .map_or_else(|| dim_cell("-"), |schema| Cell::new(schema.len()));
                table.add_row(vec![
                    Cell::new(kind.as_str()),
                    Cell::new(kind.partition()),
                    columns,
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use filing_cli::config::BlobConfig;

    use super::*;
    use crate::cli::{Cli, Command};

    fn process_args(argv: &[&str]) -> ProcessArgs {
        let mut full = vec!["filing-graph", "process"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Command::Process(args) => args,
            Command::Tables(_) => panic!("expected process"),
        }
    }

    #[test]
    fn flags_override_the_config_file() {
        let config = FileConfig::from_toml_str(
            r#"
            schema = "from-config.csv"
            [engine]
            externalize_threshold_bytes = 100
            [output]
            naming = "type-prefixed"
            [blob]
            dir = "config-blobs"
            base_url = "https://cdn.example.com"
            "#,
        )
        .unwrap();
        let args = process_args(&[
            "f.json",
            "--naming",
            "bare",
            "--externalize-threshold",
            "50",
            "--blob-dir",
            "cli-blobs",
        ]);
        let settings = settings_from_args(&args, config);
        assert_eq!(settings.output.naming, NamingConvention::Bare);
        assert_eq!(settings.engine.externalize_threshold_bytes, 50);
        assert_eq!(
            settings.blob,
            BlobConfig {
                dir: Some(PathBuf::from("cli-blobs")),
                base_url: Some("https://cdn.example.com".to_string()),
            }
        );
        assert_eq!(settings.schema, Some(PathBuf::from("from-config.csv")));
    }

    #[test]
    fn config_values_survive_without_flags() {
        let config = FileConfig::from_toml_str("[engine]\nexternalization_enabled = false\n").unwrap();
        let settings = settings_from_args(&process_args(&["f.json", "--dry-run"]), config);
        assert!(!settings.engine.externalization_enabled);
        assert!(settings.dry_run);
        assert_eq!(settings.output.naming, NamingConvention::Bare);
        assert_eq!(settings.output_dir, PathBuf::from("graph-output"));
    }

    #[test]
    fn no_externalize_wins() {
        let settings =
            settings_from_args(&process_args(&["f.json", "--no-externalize"]), FileConfig::default());
        assert!(!settings.engine.externalization_enabled);
    }

    #[test]
    fn zero_jobs_is_rejected() {
        let error = run_process(&process_args(&["f.json", "-j", "0"])).unwrap_err();
        assert!(error.to_string().contains("--jobs"));
    }
}
