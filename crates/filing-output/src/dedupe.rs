use std::collections::HashSet;

use filing_common::any_to_string;
use filing_model::IDENTIFIER_COLUMN;
use polars::prelude::{AnyValue, BooleanChunked, DataFrame, NewChunkedArray};

use crate::error::Result;
use crate::frame::TableFrame;

fn column_value_string(df: &DataFrame, name: &str, idx: usize) -> String {
    match df.column(name) {
        Ok(column) => any_to_string(column.get(idx).unwrap_or(AnyValue::Null)),
        Err(_) => String::new(),
    }
}

/// Keeps the first row per identifier. Rows with a blank identifier are kept.
///
/// Returns the number of rows removed.
pub fn dedupe_by_identifier(frame: &mut TableFrame) -> Result<usize> {
    let df = &mut frame.data;
    if df.height() == 0 || df.column(IDENTIFIER_COLUMN).is_err() {
        return Ok(0);
    }
    let mut seen = HashSet::with_capacity(df.height());
    let mut keep = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let key = column_value_string(df, IDENTIFIER_COLUMN, idx);
        let key = key.trim();
        if key.is_empty() {
            keep.push(true);
            continue;
        }
        keep.push(seen.insert(key.to_string()));
    }
    let before = df.height();
    let mask = BooleanChunked::from_slice("dedupe".into(), &keep);
    *df = df.filter(&mask)?;
    Ok(before - df.height())
}
