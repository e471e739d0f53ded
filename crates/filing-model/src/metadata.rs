//! Optional registry and filing metadata supplied alongside a document.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Registrant and filing details used to seed Entity and Report fields.
///
/// Every field is optional: a filing with no metadata still processes, with
/// identities derived from the document itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilingMetadata {
    pub cik: Option<String>,
    pub entity_name: Option<String>,
    pub ticker: Option<String>,
    pub exchange: Option<String>,
    pub sic: Option<String>,
    pub state_of_incorporation: Option<String>,
    pub fiscal_year_end: Option<String>,
    /// CIK of the parent registrant, when the filer is a subsidiary.
    pub parent_cik: Option<String>,
    pub accession_number: Option<String>,
    pub form_type: Option<String>,
    pub filing_date: Option<NaiveDate>,
    pub report_date: Option<NaiveDate>,
    pub document_url: Option<String>,
}

impl FilingMetadata {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ModelError::DocumentRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ModelError::DocumentParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// CIK with leading zeros stripped, the stable registrant key.
    pub fn normalized_cik(&self) -> Option<String> {
        self.cik.as_deref().and_then(normalize_cik)
    }
}

pub fn normalize_cik(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('0');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
