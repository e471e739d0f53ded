//! Output file naming.

use std::fmt;
use std::str::FromStr;

use filing_model::TableKind;
use serde::{Deserialize, Serialize};

use crate::error::OutputError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingConvention {
    /// `Fact.csv`, `FACT_HAS_UNIT.csv`
    #[default]
    Bare,
    /// `node_Fact.csv`, `rel_FACT_HAS_UNIT.csv`
    TypePrefixed,
    /// `Fact_<cik>_<accession>.csv`
    FilingSuffixed,
}

impl NamingConvention {
    pub const ALL: [NamingConvention; 3] = [
        NamingConvention::Bare,
        NamingConvention::TypePrefixed,
        NamingConvention::FilingSuffixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NamingConvention::Bare => "bare",
            NamingConvention::TypePrefixed => "type-prefixed",
            NamingConvention::FilingSuffixed => "filing-suffixed",
        }
    }

    /// Filing-suffixed names are unique per filing, so every filing can share
    /// one output directory.
    pub fn is_filing_scoped(&self) -> bool {
        matches!(self, NamingConvention::FilingSuffixed)
    }

    pub fn file_name(&self, kind: TableKind, filing: &FilingLabel) -> String {
        match self {
            NamingConvention::Bare => format!("{kind}.csv"),
            NamingConvention::TypePrefixed => {
                let prefix = if kind.is_relationship() { "rel" } else { "node" };
                format!("{prefix}_{kind}.csv")
            }
            NamingConvention::FilingSuffixed => {
                format!(
                    "{kind}_{}_{}.csv",
                    sanitize(filing.cik.as_deref().unwrap_or("unknown")),
                    sanitize(&filing.accession)
                )
            }
        }
    }
}

impl fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamingConvention {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        NamingConvention::ALL
            .into_iter()
            .find(|n| n.as_str() == normalized)
            .ok_or_else(|| OutputError::UnknownNaming(s.to_string()))
    }
}

/// Filing identity used in filing-suffixed names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilingLabel {
    pub cik: Option<String>,
    pub accession: String,
}

impl FilingLabel {
    pub fn new(cik: Option<String>, accession: impl Into<String>) -> Self {
        Self {
            cik,
            accession: accession.into(),
        }
    }
}

/// Keeps file names portable.
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
