//! Unit normalization.

use filing_model::{Identifier, UnitInput, UnitNode};

use crate::arena::NodeArena;
use crate::identity::unit_key;

/// Canonical description of a unit, before identity is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDescriptor {
    pub measure: String,
    pub value: String,
    /// Dedup key.
    pub uri: String,
    pub numerator_uri: Option<String>,
    pub denominator_uri: Option<String>,
}

impl UnitDescriptor {
    pub fn is_divide(&self) -> bool {
        self.numerator_uri.is_some()
    }
}

/// Single measures resolve to `(prefix:local, local, namespace#local)`.
/// Divides combine both sides as `num/den`, with the two URIs concatenated
/// into the synthetic URI.
pub fn describe_unit(unit: &UnitInput) -> UnitDescriptor {
    match unit {
        UnitInput::Measure(measure) => UnitDescriptor {
            measure: measure.prefixed(),
            value: measure.local_name.clone(),
            uri: measure.uri(),
            numerator_uri: None,
            denominator_uri: None,
        },
        UnitInput::Divide {
            numerator,
            denominator,
        } => {
            let numerator_uri = numerator.uri();
            let denominator_uri = denominator.uri();
            UnitDescriptor {
                measure: format!("{}/{}", numerator.prefixed(), denominator.prefixed()),
                value: format!("{}/{}", numerator.local_name, denominator.local_name),
                uri: format!("{numerator_uri}{denominator_uri}"),
                numerator_uri: Some(numerator_uri),
                denominator_uri: Some(denominator_uri),
            }
        }
    }
}

/// Returns the unit's identifier, creating the record on first sight.
pub fn materialize_unit(units: &mut NodeArena<UnitNode>, unit: &UnitInput) -> Identifier {
    let descriptor = describe_unit(unit);
    let key = unit_key(&descriptor.uri);
    units
        .insert_with(&key, |identifier| UnitNode {
            identifier,
            is_divide: descriptor.is_divide(),
            uri: descriptor.uri,
            measure: descriptor.measure,
            value: descriptor.value,
            numerator_uri: descriptor.numerator_uri,
            denominator_uri: descriptor.denominator_uri,
        })
        .id
}
