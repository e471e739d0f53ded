#![deny(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to read schema file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema CSV {origin}: {message}")]
    Csv { origin: String, message: String },

    #[error("schema CSV {origin} is missing required column '{column}'")]
    MissingColumn { origin: String, column: String },

    #[error("schema CSV {origin} line {line}: unknown table kind '{table}'")]
    UnknownTable {
        origin: String,
        line: u64,
        table: String,
    },

    #[error("schema CSV {origin} line {line}: invalid {field} '{value}'")]
    InvalidValue {
        origin: String,
        line: u64,
        field: &'static str,
        value: String,
    },

    #[error("schema CSV {origin}: property '{property}' declared twice for {table}")]
    DuplicateProperty {
        origin: String,
        table: String,
        property: String,
    },
}

impl SchemaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
