use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid identifier '{0}': expected 32 lowercase hex characters")]
    InvalidIdentifier(String),

    #[error("unknown table kind: {0}")]
    UnknownTableKind(String),

    #[error("failed to read filing document {path}: {source}")]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse filing document {path}: {source}")]
    DocumentParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
