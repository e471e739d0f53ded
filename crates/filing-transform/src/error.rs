use std::path::PathBuf;

use filing_model::ModelError;
use thiserror::Error;

/// Failure to hand a value to blob storage.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("invalid blob key '{key}': {message}")]
    InvalidKey { key: String, message: String },

    #[error("failed to write blob {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("blob store rejected '{key}': {message}")]
    Rejected { key: String, message: String },

    #[error("blob store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("source document unavailable: {0}")]
    SourceUnavailable(#[from] ModelError),

    #[error(transparent)]
    Blob(#[from] BlobError),
}

pub type Result<T> = std::result::Result<T, TransformError>;
