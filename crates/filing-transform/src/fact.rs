//! Numeric interpretation of fact values.

use filing_common::parse_f64;

/// Parsed `decimals` attribute. `INF` and anything unparsable count as absent.
pub fn parse_decimals(decimals: Option<&str>) -> Option<i32> {
    let raw = decimals?.trim();
    if raw.eq_ignore_ascii_case("INF") {
        return None;
    }
    raw.parse::<i32>().ok()
}

/// Numeric value of a fact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericValue {
    /// The fact has no unit; it is not numeric at all.
    NotNumeric,
    Parsed(f64),
    /// A unit is present but the value does not parse.
    Unparsable,
}

impl NumericValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            NumericValue::Parsed(v) => Some(*v),
            NumericValue::NotNumeric | NumericValue::Unparsable => None,
        }
    }
}

/// `raw × 10^decimals` when decimals are present, the plain parse otherwise.
///
/// `"1000000"` with decimals `-6` is `1.0`; `"42.5"` without decimals is `42.5`.
pub fn numeric_value(raw: &str, decimals: Option<&str>, has_unit: bool) -> NumericValue {
    if !has_unit {
        return NumericValue::NotNumeric;
    }
    let Some(parsed) = parse_f64(raw) else {
        return NumericValue::Unparsable;
    };
    let scaled = match parse_decimals(decimals) {
        Some(decimals) if decimals >= 0 => parsed * 10f64.powi(decimals),
        // Dividing by an exact power of ten keeps `1000000 / 1e6` exact.
        Some(decimals) => parsed / 10f64.powi(decimals.saturating_neg()),
        None => parsed,
    };
    if scaled.is_finite() {
        NumericValue::Parsed(scaled)
    } else {
        NumericValue::Unparsable
    }
}
