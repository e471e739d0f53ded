//! Value externalization.
//!
//! Markup-bearing or oversized fact values are queued during the fact loop and
//! uploaded in a single batch once the loop ends. Anything that cannot be
//! queued or uploaded stays inline; externalization never fails a pass.

use std::sync::{Arc, LazyLock};

use filing_model::Identifier;
use regex::Regex;
use tracing::{debug, warn};

use crate::blob::{BlobItem, BlobStore};
use crate::error::BlobError;
use crate::options::EngineOptions;

static MARKUP: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)</?[a-z][a-z0-9:_-]*(\s[^<>]*)?/?>|<!").ok()
});

/// True when the value contains tag-like content.
pub fn contains_markup(value: &str) -> bool {
    MARKUP.as_ref().is_some_and(|re| re.is_match(value))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Text,
}

impl ContentKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ContentKind::Html => "html",
            ContentKind::Text => "txt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ContentKind::Html => "text/html",
            ContentKind::Text => "text/plain",
        }
    }
}

/// One path segment of a storage key. Anything outside `[A-Za-z0-9._-]`
/// becomes `_` so keys stay usable as URL paths.
pub fn key_segment(part: &str) -> String {
    let segment: String = part
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if segment.chars().all(|c| c == '.') {
        segment.replace('.', "_") + "_"
    } else {
        segment
    }
}

/// `<fiscal_year>/<entity>/<accession>/<first 8 hex of fact id>.<ext>`
pub fn storage_key(
    fiscal_year: i32,
    entity: &str,
    accession: &str,
    fact_id: Identifier,
    kind: ContentKind,
) -> String {
    format!(
        "{fiscal_year}/{}/{}/{}.{}",
        key_segment(entity),
        key_segment(accession),
        fact_id.short_hex(8),
        kind.extension()
    )
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnqueueError {
    #[error("no fiscal year available for the storage key")]
    MissingFiscalYear,
}

/// Outcome of one queued value after the flush.
#[derive(Debug)]
pub struct FlushOutcome {
    pub fact_id: Identifier,
    pub result: Result<ExternalValue, BlobError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalValue {
    pub url: String,
    pub content_type: String,
}

#[derive(Debug)]
struct Pending {
    fact_id: Identifier,
    item: BlobItem,
}

pub struct ValueExternalizer {
    store: Option<Arc<dyn BlobStore>>,
    threshold_bytes: usize,
    enabled: bool,
    queue: Vec<Pending>,
}

impl ValueExternalizer {
    pub fn new(store: Option<Arc<dyn BlobStore>>, options: &EngineOptions) -> Self {
        Self {
            enabled: options.externalization_enabled && store.is_some(),
            store,
            threshold_bytes: options.externalize_threshold_bytes,
            queue: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the content kind to store under when the value should leave
    /// the fact row.
    pub fn decide(&self, value: &str) -> Option<ContentKind> {
        if !self.enabled || value.is_empty() {
            return None;
        }
        if contains_markup(value) {
            Some(ContentKind::Html)
        } else if value.len() > self.threshold_bytes {
            Some(ContentKind::Text)
        } else {
            None
        }
    }

    pub fn enqueue(
        &mut self,
        fact_id: Identifier,
        value: &str,
        kind: ContentKind,
        fiscal_year: Option<i32>,
        entity: &str,
        accession: &str,
    ) -> Result<(), EnqueueError> {
        let fiscal_year = fiscal_year.ok_or(EnqueueError::MissingFiscalYear)?;
        self.queue.push(Pending {
            fact_id,
            item: BlobItem {
                key: storage_key(fiscal_year, entity, accession, fact_id, kind),
                bytes: value.as_bytes().to_vec(),
                content_type: kind.content_type().to_string(),
            },
        });
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Uploads everything queued in one batch and drains the queue.
    pub fn flush(&mut self) -> Vec<FlushOutcome> {
        let pending = std::mem::take(&mut self.queue);
        let Some(store) = &self.store else {
            return Vec::new();
        };
        if pending.is_empty() {
            return Vec::new();
        }

        let items: Vec<BlobItem> = pending.iter().map(|p| p.item.clone()).collect();
        let mut results = store.put_batch(&items);
        // A short result list means the store lost track of items.
        while results.len() < pending.len() {
            results.push(Err(BlobError::Rejected {
                key: pending[results.len()].item.key.clone(),
                message: "no result returned for item".to_string(),
            }));
        }

        debug!(count = pending.len(), "flushed externalized values");
        pending
            .into_iter()
            .zip(results)
            .map(|(p, result)| {
                if let Err(error) = &result {
                    warn!(key = %p.item.key, %error, "blob upload failed; keeping value inline");
                }
                FlushOutcome {
                    fact_id: p.fact_id,
                    result: result.map(|url| ExternalValue {
                        url,
                        content_type: p.item.content_type,
                    }),
                }
            })
            .collect()
    }
}
