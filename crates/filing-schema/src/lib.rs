#![deny(unsafe_code)]

pub mod csv;
pub mod error;
pub mod registry;
pub mod types;

pub use crate::error::{Result, SchemaError};
pub use crate::registry::{SCHEMA_ENV_VAR, SchemaRegistry, SchemaSource, SchemaSummary};
pub use crate::types::{PropertySchema, PropertyType, TableSchema};
