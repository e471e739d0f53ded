//! CSV output of completed tables.

use std::fs::File;
use std::path::{Path, PathBuf};

use filing_model::{TableKind, TableRows};
use filing_schema::SchemaRegistry;
use polars::prelude::{CsvReadOptions, CsvWriter, DataFrame, SerReader, SerWriter};
use tracing::{debug, info};

use crate::complete::complete_frame;
use crate::dedupe::dedupe_by_identifier;
use crate::error::{OutputError, Result};
use crate::frame::{TableFrame, rows_to_frame};
use crate::naming::FilingLabel;
use crate::options::OutputOptions;

/// One file written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenTable {
    pub kind: TableKind,
    pub path: PathBuf,
    pub rows: usize,
    pub duplicates_removed: usize,
}

pub struct TableWriter<'a> {
    registry: &'a SchemaRegistry,
    options: &'a OutputOptions,
}

impl<'a> TableWriter<'a> {
    pub fn new(registry: &'a SchemaRegistry, options: &'a OutputOptions) -> Self {
        Self { registry, options }
    }

    /// Frame, complete and (for node tables) dedupe one table.
    pub fn prepare(&self, rows: &TableRows) -> Result<(TableFrame, usize)> {
        let schema = self.registry.get(rows.kind);
        let frame = rows_to_frame(rows, schema)?;
        let mut frame = complete_frame(frame, schema)?;
        let removed = if rows.kind.is_relationship() {
            0
        } else {
            dedupe_by_identifier(&mut frame)?
        };
        Ok((frame, removed))
    }

    /// Writes every table under `<out_dir>/nodes` and `<out_dir>/relationships`.
    pub fn write_tables(
        &self,
        out_dir: &Path,
        tables: &[TableRows],
        filing: &FilingLabel,
    ) -> Result<Vec<WrittenTable>> {
        let mut written = Vec::new();
        for rows in tables {
            if rows.is_empty() && !self.options.include_empty_tables {
                continue;
            }
            let (mut frame, duplicates_removed) = self.prepare(rows)?;
            let dir = out_dir.join(rows.kind.partition());
            std::fs::create_dir_all(&dir).map_err(|e| OutputError::io(&dir, e))?;
            let path = dir.join(self.options.naming.file_name(rows.kind, filing));
            write_csv(&path, &mut frame.data)?;
            debug!(table = %rows.kind, rows = frame.height(), path = %path.display(), "wrote table");
            written.push(WrittenTable {
                kind: rows.kind,
                path,
                rows: frame.height(),
                duplicates_removed,
            });
        }
        info!(
            dir = %out_dir.display(),
            tables = written.len(),
            rows = written.iter().map(|t| t.rows).sum::<usize>(),
            "tables written"
        );
        Ok(written)
    }
}

pub fn write_csv(path: &Path, data: &mut DataFrame) -> Result<()> {
    let mut file = File::create(path).map_err(|e| OutputError::io(path, e))?;
    CsvWriter::new(&mut file).include_header(true).finish(data)?;
    Ok(())
}

/// Reads a written table back with every column as text.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}
