//! Row tables to Polars frames.

use std::collections::BTreeSet;

use filing_model::{CellValue, FROM_COLUMN, TO_COLUMN, TableKind, TableRows};
use filing_schema::{PropertyType, TableSchema};
use polars::prelude::{Column, DataFrame, NamedFrom, Series};

use crate::error::Result;

/// One output table as a frame.
#[derive(Debug, Clone)]
pub struct TableFrame {
    pub kind: TableKind,
    pub data: DataFrame,
}

impl TableFrame {
    pub fn new(kind: TableKind, data: DataFrame) -> Self {
        Self { kind, data }
    }

    pub fn height(&self) -> usize {
        self.data.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }
}

/// Storage type of a frame column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Text,
    Integer,
    Float,
    Boolean,
}

impl ColumnType {
    fn for_property(property_type: &PropertyType) -> Self {
        match property_type {
            PropertyType::Integer => ColumnType::Integer,
            PropertyType::Float => ColumnType::Float,
            PropertyType::Boolean => ColumnType::Boolean,
            PropertyType::String
            | PropertyType::Date
            | PropertyType::DateTime
            | PropertyType::Other(_) => ColumnType::Text,
        }
    }

    fn infer<'a>(cells: impl Iterator<Item = &'a CellValue>) -> Self {
        for cell in cells {
            match cell {
                CellValue::Null => continue,
                CellValue::Integer(_) => return ColumnType::Integer,
                CellValue::Float(_) => return ColumnType::Float,
                CellValue::Boolean(_) => return ColumnType::Boolean,
                CellValue::Text(_) => return ColumnType::Text,
            }
        }
        ColumnType::Text
    }
}

static NULL: CellValue = CellValue::Null;

fn cell_text(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Null => None,
        CellValue::Text(v) => Some(v.clone()),
        CellValue::Integer(v) => Some(v.to_string()),
        CellValue::Float(v) => Some(filing_common::format_numeric(*v)),
        CellValue::Boolean(v) => Some(v.to_string()),
    }
}

#[allow(clippy::cast_precision_loss)]
fn cell_float(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Float(v) => Some(*v),
        CellValue::Integer(v) => Some(*v as f64),
        CellValue::Text(v) => filing_common::parse_f64(v),
        CellValue::Boolean(_) | CellValue::Null => None,
    }
}

fn cell_integer(cell: &CellValue) -> Option<i64> {
    match cell {
        CellValue::Integer(v) => Some(*v),
        CellValue::Text(v) => filing_common::parse_i64(v),
        CellValue::Boolean(v) => Some(i64::from(*v)),
        CellValue::Float(_) | CellValue::Null => None,
    }
}

fn cell_bool(cell: &CellValue) -> Option<bool> {
    match cell {
        CellValue::Boolean(v) => Some(*v),
        CellValue::Text(v) => match v.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "y" | "yes" => Some(true),
            "false" | "0" | "n" | "no" => Some(false),
            _ => None,
        },
        CellValue::Integer(v) => Some(*v != 0),
        CellValue::Float(_) | CellValue::Null => None,
    }
}

/// Columns present in at least one row: `from`/`to` first, then the rest
/// in name order.
fn present_columns(rows: &TableRows) -> Vec<String> {
    let names: BTreeSet<&str> = rows.rows.iter().flat_map(|row| row.columns()).collect();
    let mut ordered: Vec<String> = [FROM_COLUMN, TO_COLUMN]
        .into_iter()
        .filter(|name| names.contains(name))
        .map(str::to_string)
        .collect();
    ordered.extend(
        names
            .into_iter()
            .filter(|name| *name != FROM_COLUMN && *name != TO_COLUMN)
            .map(str::to_string),
    );
    ordered
}

/// Builds a frame holding every column that appears in `rows`. Declared
/// schema types win over the types of the cells; cells that do not convert
/// become nulls.
pub fn rows_to_frame(rows: &TableRows, schema: Option<&TableSchema>) -> Result<TableFrame> {
    let mut columns: Vec<Column> = Vec::new();
    for name in present_columns(rows) {
        let key = name.as_str();
        let cells = move || rows.rows.iter().map(move |row| row.get(key).unwrap_or(&NULL));
        let column_type = schema
            .and_then(|s| s.property(&name))
            .map(|p| ColumnType::for_property(&p.property_type))
            .unwrap_or_else(|| ColumnType::infer(cells()));
        let series = match column_type {
            ColumnType::Text => {
                Series::new(name.as_str().into(), cells().map(cell_text).collect::<Vec<_>>())
            }
            ColumnType::Integer => Series::new(
                name.as_str().into(),
                cells().map(cell_integer).collect::<Vec<_>>(),
            ),
            ColumnType::Float => {
                Series::new(name.as_str().into(), cells().map(cell_float).collect::<Vec<_>>())
            }
            ColumnType::Boolean => {
                Series::new(name.as_str().into(), cells().map(cell_bool).collect::<Vec<_>>())
            }
        };
        columns.push(series.into());
    }
    let data = DataFrame::new(columns)?;
    Ok(TableFrame::new(rows.kind, data))
}

#[cfg(test)]
mod tests {
    use filing_model::{NodeKind, Row};
    use filing_schema::SchemaRegistry;
    use polars::prelude::DataType;

    use super::*;

    #[test]
    fn schema_types_drive_column_types() {
        let registry = SchemaRegistry::embedded().unwrap();
        let kind = TableKind::Node(NodeKind::Fact);
        let rows = TableRows::new(
            kind,
            vec![
                Row::new()
                    .with("identifier", "a")
                    .with("numeric_value", 1.5)
                    .with("is_nil", false),
                Row::new().with("identifier", "b").with("numeric_value", CellValue::Null),
            ],
        );
        let frame = rows_to_frame(&rows, registry.get(kind)).unwrap();
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.column_names(), vec!["identifier", "is_nil", "numeric_value"]);
        assert_eq!(
            frame.data.column("numeric_value").unwrap().dtype(),
            &DataType::Float64
        );
        assert_eq!(frame.data.column("is_nil").unwrap().dtype(), &DataType::Boolean);
        assert_eq!(frame.data.column("numeric_value").unwrap().null_count(), 1);
    }

    #[test]
    fn undeclared_columns_are_inferred() {
        let kind = TableKind::Node(NodeKind::Unit);
        let rows = TableRows::new(
            kind,
            vec![
                Row::new().with("extra", CellValue::Null),
                Row::new().with("extra", 7i64),
            ],
        );
        let frame = rows_to_frame(&rows, None).unwrap();
        assert_eq!(frame.data.column("extra").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn empty_rows_make_an_empty_frame() {
        let kind = TableKind::Node(NodeKind::Label);
        let frame = rows_to_frame(&TableRows::new(kind, Vec::new()), None).unwrap();
        assert_eq!(frame.height(), 0);
        assert!(frame.column_names().is_empty());
    }
}
