//! Shared utilities for filing graph crates.
//!
//! Polars `AnyValue` helpers, tolerant numeric parsing, content hashing and the
//! value-redaction switch used by logging.

pub mod hash;
pub mod polars;
pub mod redact;

pub use hash::{sha256_hex, short_sha256_hex};
pub use polars::{
    any_to_bool, any_to_f64, any_to_i64, any_to_string, any_to_string_non_empty, format_numeric,
    parse_f64, parse_i64,
};
pub use redact::{REDACTED_VALUE, log_data_enabled, redact_value, set_log_data_enabled};
