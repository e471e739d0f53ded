use serde::{Deserialize, Serialize};

use crate::naming::NamingConvention;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputOptions {
    pub naming: NamingConvention,
    /// Write header-only files for tables with no rows.
    pub include_empty_tables: bool,
}

impl OutputOptions {
    #[must_use]
    pub fn with_naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    #[must_use]
    pub fn with_empty_tables(mut self, include: bool) -> Self {
        self.include_empty_tables = include;
        self
    }
}
