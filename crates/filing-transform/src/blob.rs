//! Blob storage for externalized fact values.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::BlobError;

/// One value queued for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobItem {
    pub key: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Destination for externalized values. Implementations must be shareable
/// across filing workers.
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `key` and returns the URL facts should reference.
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, BlobError>;

    /// Stores a batch; one result per item, in input order.
    fn put_batch(&self, items: &[BlobItem]) -> Vec<Result<String, BlobError>> {
        items
            .iter()
            .map(|item| self.put(&item.key, &item.bytes, &item.content_type))
            .collect()
    }
}

/// Rejects absolute keys and `..` segments.
fn validate_key(key: &str) -> Result<(), BlobError> {
    let path = Path::new(key);
    if key.is_empty()
        || path.is_absolute()
        || path.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        })
    {
        return Err(BlobError::InvalidKey {
            key: key.to_string(),
            message: "must be a relative path without '..'".to_string(),
        });
    }
    Ok(())
}

fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-process store, handy for tests and dry runs.
#[derive(Debug, Clone)]
pub struct MemoryBlobStore {
    base_url: String,
    data: Arc<RwLock<HashMap<String, StoredBlob>>>,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("memory://blobs")
    }
}

impl MemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn get(&self, key: &str) -> Option<StoredBlob> {
        self.data.read().ok()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.data.read().map(|data| data.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .data
            .read()
            .map(|data| data.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, BlobError> {
        validate_key(key)?;
        self.data.write().map_err(|_| BlobError::Poisoned)?.insert(
            key.to_string(),
            StoredBlob {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(join_url(&self.base_url, key))
    }
}

/// Writes blobs below a root directory.
///
/// URLs are `<base_url>/<key>` when a base URL is configured, else
/// `file://` URLs of the written paths.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    base_url: Option<String>,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base_url: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<String, BlobError> {
        validate_key(key)?;
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| BlobError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        // Keys are content-derived, so overwriting is idempotent.
        std::fs::write(&path, bytes).map_err(|source| BlobError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(match &self.base_url {
            Some(base) => join_url(base, key),
            None => format!("file://{}", path.display()),
        })
    }
}
