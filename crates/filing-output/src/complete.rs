//! Schema completion and column ordering.

use filing_model::{FROM_COLUMN, TO_COLUMN};
use filing_schema::{PropertyType, TableSchema};
use polars::prelude::{DataFrame, DataType, NamedFrom, Series};
use tracing::warn;

use crate::error::Result;
use crate::frame::TableFrame;

/// A column of `height` copies of the type's default value.
fn default_series(name: &str, property_type: &PropertyType, height: usize) -> Series {
    match property_type {
        PropertyType::String => Series::new(name.into(), vec![""; height]),
        PropertyType::Integer => Series::new(name.into(), vec![0i64; height]),
        PropertyType::Float => Series::new(name.into(), vec![0f64; height]),
        PropertyType::Boolean => Series::new(name.into(), vec![false; height]),
        PropertyType::Date | PropertyType::DateTime | PropertyType::Other(_) => {
            Series::full_null(name.into(), height, &DataType::String)
        }
    }
}

/// `[from, to]` for relationships, then declared properties, then extras.
pub fn ordered_columns(schema: &TableSchema, present: &[String]) -> Vec<String> {
    let mut ordered: Vec<String> = Vec::with_capacity(present.len().max(schema.len()));
    if schema.kind.is_relationship() {
        ordered.push(FROM_COLUMN.to_string());
        ordered.push(TO_COLUMN.to_string());
    }
    for name in schema.column_names() {
        if !ordered.iter().any(|c| c == name) {
            ordered.push(name.to_string());
        }
    }
    for name in present {
        if !ordered.contains(name) {
            ordered.push(name.clone());
        }
    }
    ordered
}

/// Adds every declared column the frame lacks and orders the columns.
///
/// Without a schema the frame passes through unchanged.
pub fn complete_frame(frame: TableFrame, schema: Option<&TableSchema>) -> Result<TableFrame> {
    let Some(schema) = schema else {
        warn!(table = %frame.kind, "no schema definition; writing table as-is");
        return Ok(frame);
    };

    let TableFrame { kind, mut data } = frame;
    let height = data.height();
    let present = frame_columns(&data);
    for property in &schema.properties {
        if !present.contains(&property.name) {
            data.with_column(default_series(&property.name, &property.property_type, height))?;
        }
    }

    let ordered = ordered_columns(schema, &present);
    let data = data.select(ordered.iter().map(String::as_str))?;
    Ok(TableFrame::new(kind, data))
}

fn frame_columns(data: &DataFrame) -> Vec<String> {
    data.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}
