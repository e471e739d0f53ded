//! Engine configuration.

use serde::Deserialize;

/// Generic link role carried by most filings; it groups nothing useful.
pub const DEFAULT_DENIED_ROLE: &str = "http://www.xbrl.org/2003/role/link";

pub const DEFAULT_EXTERNALIZE_THRESHOLD_BYTES: usize = 4096;

/// Tunables for one filing pass.
///
/// Deserializes from the `[engine]` table of a config file; absent keys keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Values longer than this many bytes are offloaded to blob storage.
    pub externalize_threshold_bytes: usize,
    /// Has no effect unless a blob store is supplied to the engine.
    pub externalization_enabled: bool,
    /// Link roles skipped when building structures.
    pub role_denylist: Vec<String>,
    /// Only labels in this language are materialized; all languages when unset.
    pub label_language: Option<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            externalize_threshold_bytes: DEFAULT_EXTERNALIZE_THRESHOLD_BYTES,
            externalization_enabled: true,
            role_denylist: vec![DEFAULT_DENIED_ROLE.to_string()],
            label_language: None,
        }
    }
}

impl EngineOptions {
    #[must_use]
    pub fn with_externalize_threshold(mut self, bytes: usize) -> Self {
        self.externalize_threshold_bytes = bytes;
        self
    }

    #[must_use]
    pub fn with_externalization(mut self, enabled: bool) -> Self {
        self.externalization_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_label_language(mut self, lang: impl Into<String>) -> Self {
        self.label_language = Some(lang.into());
        self
    }

    pub fn is_role_denied(&self, linkrole: &str) -> bool {
        self.role_denylist.iter().any(|role| role == linkrole)
    }

    /// Language filter match; a `en` filter accepts `en-US`.
    pub fn accepts_label_language(&self, lang: &str) -> bool {
        match self.label_language.as_deref() {
            None => true,
            Some(wanted) => {
                let lang = lang.to_ascii_lowercase();
                let wanted = wanted.to_ascii_lowercase();
                lang == wanted || lang.starts_with(&format!("{wanted}-"))
            }
        }
    }
}
