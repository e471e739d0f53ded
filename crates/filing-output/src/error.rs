use std::path::PathBuf;

use filing_model::TableKind;
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error("{table} table is missing column '{column}'")]
    MissingColumn { table: TableKind, column: String },

    #[error("unknown naming convention '{0}' (expected bare, type-prefixed or filing-suffixed)")]
    UnknownNaming(String),
}

impl OutputError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OutputError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, OutputError>;
