//! Schema-driven table output.
//!
//! Each table is turned into a frame, completed against its schema
//! definition, deduplicated by identifier when it holds nodes, and written as
//! CSV under a `nodes` or `relationships` partition.

pub mod complete;
pub mod dedupe;
pub mod error;
pub mod frame;
pub mod merge;
pub mod naming;
pub mod options;
pub mod writer;

pub use complete::{complete_frame, ordered_columns};
pub use dedupe::dedupe_by_identifier;
pub use error::{OutputError, Result};
pub use frame::{TableFrame, rows_to_frame};
pub use merge::merge_tables;
pub use naming::{FilingLabel, NamingConvention};
pub use options::OutputOptions;
pub use writer::{TableWriter, WrittenTable, read_table, write_csv};
