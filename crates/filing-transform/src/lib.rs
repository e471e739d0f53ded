//! Transformation of parsed filings into node and relationship tables.
//!
//! A pass is single-threaded: later lookups depend on records created earlier
//! in the same pass. Independent filings share nothing at runtime and converge
//! on shared nodes through content-addressed identifiers alone.

pub mod arena;
pub mod blob;
pub mod concept;
pub mod dimension;
pub mod engine;
pub mod error;
pub mod externalize;
pub mod fact;
pub mod identity;
pub mod options;
pub mod period;
pub mod structure;
pub mod unit;

pub use arena::{GraphTables, Inserted, NodeArena};
pub use blob::{BlobItem, BlobStore, FsBlobStore, MemoryBlobStore};
pub use concept::{CLASSIFICATION_RULES, ClassificationRule, ConceptResolver, classify_element};
pub use engine::{FilingGraph, PassStats, TransformEngine, load_source, resolve_accession};
pub use error::{BlobError, Result, TransformError};
pub use externalize::{ContentKind, ValueExternalizer, contains_markup, storage_key};
pub use fact::{NumericValue, numeric_value, parse_decimals};
pub use options::{DEFAULT_DENIED_ROLE, DEFAULT_EXTERNALIZE_THRESHOLD_BYTES, EngineOptions};
pub use period::{PeriodDescriptor, classify_duration, describe_period};
pub use unit::{UnitDescriptor, describe_unit};
