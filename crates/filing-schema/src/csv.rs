#![deny(unsafe_code)]

//! Schema CSV parsing.
//!
//! One row per property: `Table,Property,Type,Required,Order`. `Order` is
//! optional; rows without it keep file order after the ordered ones.

use filing_model::TableKind;

use crate::error::{Result, SchemaError};
use crate::types::{PropertySchema, PropertyType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRow {
    pub kind: TableKind,
    pub property: PropertySchema,
    pub order: Option<u32>,
    pub line: u64,
}

fn header_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim_matches('\u{feff}').trim().eq_ignore_ascii_case(name))
}

fn get_string(row: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| row.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_required(value: Option<&str>) -> Option<bool> {
    match value.map(str::to_ascii_lowercase).as_deref() {
        None | Some("n" | "no" | "false" | "0") => Some(false),
        Some("y" | "yes" | "true" | "1") => Some(true),
        _ => None,
    }
}

pub fn parse_schema_csv(contents: &[u8], origin: &str) -> Result<Vec<SchemaRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(contents);
    let headers = reader
        .headers()
        .map_err(|e| SchemaError::Csv {
            origin: origin.to_string(),
            message: e.to_string(),
        })?
        .clone();

    let require = |column: &str| {
        header_index(&headers, column).ok_or_else(|| SchemaError::MissingColumn {
            origin: origin.to_string(),
            column: column.to_string(),
        })
    };
    let idx_table = require("Table")?;
    let idx_property = require("Property")?;
    let idx_type = header_index(&headers, "Type");
    let idx_required = header_index(&headers, "Required");
    let idx_order = header_index(&headers, "Order");

    let mut results = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SchemaError::Csv {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        let line = record.position().map_or(0, csv::Position::line);

        let Some(table) = get_string(&record, Some(idx_table)) else {
            continue;
        };
        let Some(name) = get_string(&record, Some(idx_property)) else {
            continue;
        };
        let kind: TableKind = table.parse().map_err(|_| SchemaError::UnknownTable {
            origin: origin.to_string(),
            line,
            table: table.clone(),
        })?;

        let property_type = get_string(&record, idx_type)
            .map_or(PropertyType::String, |t| PropertyType::parse(&t));
        let required_raw = get_string(&record, idx_required);
        let required = parse_required(required_raw.as_deref()).ok_or_else(|| {
            SchemaError::InvalidValue {
                origin: origin.to_string(),
                line,
                field: "Required",
                value: required_raw.clone().unwrap_or_default(),
            }
        })?;
        let order = match get_string(&record, idx_order) {
            Some(raw) => Some(raw.parse::<u32>().map_err(|_| SchemaError::InvalidValue {
                origin: origin.to_string(),
                line,
                field: "Order",
                value: raw.clone(),
            })?),
            None => None,
        };

        results.push(SchemaRow {
            kind,
            property: PropertySchema {
                name,
                property_type,
                required,
            },
            order,
            line,
        });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use filing_model::{NodeKind, RelationshipKind};

    use super::*;

    #[test]
    fn parses_rows_with_optional_columns() {
        let csv = b"Table,Property,Type,Required\nFact,identifier,String,Y\nFact,numeric_value,Float,\nFACT_HAS_UNIT,from,,yes\n";
        let rows = parse_schema_csv(csv, "inline").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].kind, TableKind::Node(NodeKind::Fact));
        assert!(rows[0].property.required);
        assert_eq!(rows[1].property.property_type, PropertyType::Float);
        assert!(!rows[1].property.required);
        assert_eq!(
            rows[2].kind,
            TableKind::Relationship(RelationshipKind::FactHasUnit)
        );
        assert_eq!(rows[2].property.property_type, PropertyType::String);
        assert_eq!(rows[2].order, None);
    }

    #[test]
    fn rejects_unknown_table() {
        let csv = b"Table,Property\nWidget,identifier\n";
        let err = parse_schema_csv(csv, "inline").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownTable { line: 2, .. }));
    }

    #[test]
    fn rejects_missing_property_column() {
        let csv = b"Table,Type\nFact,String\n";
        let err = parse_schema_csv(csv, "inline").unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn { .. }));
    }

    #[test]
    fn rejects_bad_required_flag() {
        let csv = b"Table,Property,Required\nFact,identifier,maybe\n";
        let err = parse_schema_csv(csv, "inline").unwrap_err();
        assert!(err.to_string().contains("invalid Required 'maybe'"));
    }

    #[test]
    fn skips_blank_lines_and_handles_bom() {
        let csv = "\u{feff}Table,Property\nUnit,uri\n,\n".as_bytes();
        let rows = parse_schema_csv(csv, "inline").unwrap();
        assert_eq!(rows.len(), 1);
    }
}
