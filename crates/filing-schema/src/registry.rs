#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use filing_common::sha256_hex;
use filing_model::{FROM_COLUMN, TO_COLUMN, TableKind};

use crate::csv::{SchemaRow, parse_schema_csv};
use crate::error::{Result, SchemaError};
use crate::types::{PropertySchema, PropertyType, TableSchema};

/// Environment variable naming a schema CSV to use instead of the embedded one.
pub const SCHEMA_ENV_VAR: &str = "FILING_GRAPH_SCHEMA";

const EMBEDDED_SCHEMA: &str = include_str!("../data/graph_schema.csv");

/// Where a registry's definitions came from.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum SchemaSource {
    Embedded,
    File(PathBuf),
    Inline,
}

impl std::fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaSource::Embedded => f.write_str("embedded"),
            SchemaSource::File(path) => write!(f, "{}", path.display()),
            SchemaSource::Inline => f.write_str("inline"),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaSummary {
    pub source: String,
    pub fingerprint: String,
    pub table_count: usize,
    pub property_count: usize,
}

/// Table kind to column schema mapping.
///
/// A kind with no entry is legal: the table manager passes such tables through
/// unchanged.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    pub source: SchemaSource,
    /// SHA-256 of the schema CSV bytes.
    pub fingerprint: String,
    tables: BTreeMap<TableKind, TableSchema>,
}

impl SchemaRegistry {
    pub fn embedded() -> Result<Self> {
        Self::from_csv_bytes(EMBEDDED_SCHEMA.as_bytes(), SchemaSource::Embedded)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| SchemaError::io(path, e))?;
        Self::from_csv_bytes(&bytes, SchemaSource::File(path.to_path_buf()))
    }

    pub fn from_csv_str(contents: &str) -> Result<Self> {
        Self::from_csv_bytes(contents.as_bytes(), SchemaSource::Inline)
    }

    /// Explicit path first, then the environment variable, then the embedded schema.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match std::env::var_os(SCHEMA_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Self::embedded(),
        }
    }

    fn from_csv_bytes(bytes: &[u8], source: SchemaSource) -> Result<Self> {
        let origin = source.to_string();
        let rows = parse_schema_csv(bytes, &origin)?;
        let tables = build_tables(rows, &origin)?;
        Ok(Self {
            source,
            fingerprint: sha256_hex(bytes),
            tables,
        })
    }

    pub fn get(&self, kind: TableKind) -> Option<&TableSchema> {
        self.tables.get(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = TableKind> + '_ {
        self.tables.keys().copied()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    pub fn summary(&self) -> SchemaSummary {
        SchemaSummary {
            source: self.source.to_string(),
            fingerprint: self.fingerprint.clone(),
            table_count: self.tables.len(),
            property_count: self.tables.values().map(TableSchema::len).sum(),
        }
    }
}

fn foreign_key(name: &str) -> PropertySchema {
    PropertySchema {
        name: name.to_string(),
        property_type: PropertyType::String,
        required: true,
    }
}

fn build_tables(rows: Vec<SchemaRow>, origin: &str) -> Result<BTreeMap<TableKind, TableSchema>> {
    let mut grouped: BTreeMap<TableKind, Vec<SchemaRow>> = BTreeMap::new();
    for row in rows {
        let entry = grouped.entry(row.kind).or_default();
        if entry.iter().any(|r| r.property.name == row.property.name) {
            return Err(SchemaError::DuplicateProperty {
                origin: origin.to_string(),
                table: row.kind.to_string(),
                property: row.property.name,
            });
        }
        entry.push(row);
    }

    let mut tables = BTreeMap::new();
    for (kind, mut rows) in grouped {
        // Stable: unordered rows keep file order behind the ordered ones.
        rows.sort_by_key(|row| (row.order.is_none(), row.order.unwrap_or(0)));

        let mut schema = TableSchema::new(kind);
        if kind.is_relationship() {
            // Endpoints are always required string keys, leading the column set.
            schema.properties.push(foreign_key(FROM_COLUMN));
            schema.properties.push(foreign_key(TO_COLUMN));
        }
        for row in rows {
            if kind.is_relationship()
                && (row.property.name == FROM_COLUMN || row.property.name == TO_COLUMN)
            {
                continue;
            }
            schema.properties.push(row.property);
        }
        tables.insert(kind, schema);
    }
    Ok(tables)
}
