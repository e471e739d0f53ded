//! TOML run configuration.
//!
//! ```toml
//! [engine]
//! externalize_threshold_bytes = 8192
//! role_denylist = ["http://www.xbrl.org/2003/role/link"]
//!
//! [output]
//! naming = "filing-suffixed"
//!
//! [blob]
//! dir = "blobs"
//! base_url = "https://blobs.example.com"
//! ```
//!
//! Command-line flags override values read from the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use filing_output::OutputOptions;
use filing_transform::EngineOptions;
use serde::Deserialize;

/// Where externalized values are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlobConfig {
    /// Root directory of the filesystem blob store. Externalization is off
    /// when unset.
    pub dir: Option<PathBuf>,
    /// Public URL prefix recorded in place of externalized values.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub engine: EngineOptions,
    pub output: OutputOptions,
    pub blob: BlobConfig,
    /// Graph schema CSV replacing the embedded one.
    pub schema: Option<PathBuf>,
}

impl FileConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("parse config {}", path.display()))
    }

    /// Loads `path` when given, otherwise the defaults.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}
