//! Semantic keys.
//!
//! Every node identifier is `Identifier::from_semantic_key` of one of the keys
//! built here. Keys for global kinds (unit, period, element, label, reference,
//! taxonomy, dimension) never mention the filing, so independent passes over
//! different filings converge on the same identifiers. Keys for per-filing
//! kinds carry the accession number.

use filing_common::sha256_hex;
use filing_model::{
    DimensionInput, DimensionMember, EntityIdentifier, Identifier, NetworkRole, normalize_cik,
};

pub fn report_key(accession: &str) -> String {
    format!("report:{accession}")
}

pub fn fact_set_key(accession: &str) -> String {
    format!("factset:{accession}")
}

pub fn cik_entity_key(cik: &str) -> String {
    format!("entity:cik:{cik}")
}

/// Normalized CIK when the identifier uses an SEC CIK scheme.
pub fn identifier_cik(entity: &EntityIdentifier) -> Option<String> {
    let scheme = entity.scheme.trim_end_matches('/');
    if scheme.to_ascii_lowercase().ends_with("/cik") {
        normalize_cik(&entity.value)
    } else {
        None
    }
}

/// SEC CIK schemes collapse onto the CIK key so context identifiers and
/// metadata agree on the filer.
pub fn entity_key(entity: &EntityIdentifier) -> String {
    match identifier_cik(entity) {
        Some(cik) => cik_entity_key(&cik),
        None => format!("entity:{}#{}", entity.scheme, entity.value.trim()),
    }
}

/// Units carry a kind prefix; their URIs share the `namespace#local` form
/// with element keys.
pub fn unit_key(unit_uri: &str) -> String {
    format!("unit:{unit_uri}")
}

pub fn element_key(concept_uri: &str) -> String {
    concept_uri.to_string()
}

pub fn label_key(element_uri: &str, role: &str, lang: &str) -> String {
    format!("label:{element_uri}:{role}:{lang}")
}

pub fn reference_key(element_uri: &str, role: &str, parts_json: &str) -> String {
    format!(
        "reference:{element_uri}:{role}:{}",
        sha256_hex(parts_json.as_bytes())
    )
}

pub fn taxonomy_key(namespace: &str) -> String {
    format!("taxonomy:{namespace}")
}

/// Typed members key on their string form only, so two typed values that
/// print identically share a Dimension regardless of declared type.
pub fn dimension_key(dimension: &DimensionInput) -> String {
    let context = dimension.container.as_str();
    let axis = dimension.axis.uri();
    match &dimension.member {
        DimensionMember::Explicit(member) => {
            format!("dimension:{axis}:explicit:{}:{context}", member.uri())
        }
        DimensionMember::Typed(value) => format!("dimension:{axis}:typed:{value}:{context}"),
    }
}

pub fn structure_key(accession: &str, role: &NetworkRole) -> String {
    format!("structure:{accession}:{}:{}", role.arcrole, role.linkrole)
}

pub fn association_key(
    accession: &str,
    role: &NetworkRole,
    parent_uri: &str,
    child_uri: &str,
) -> String {
    format!(
        "association:{accession}:{}:{}:{parent_uri}:{child_uri}",
        role.arcrole, role.linkrole
    )
}

pub fn fact_key(
    accession: &str,
    concept_uri: &str,
    context_ref: &str,
    unit_ref: Option<&str>,
    value: &str,
) -> String {
    format!(
        "fact:{accession}:{concept_uri}:{context_ref}:{}:{}",
        unit_ref.unwrap_or(""),
        sha256_hex(value.as_bytes())
    )
}

pub fn id(key: &str) -> Identifier {
    Identifier::from_semantic_key(key)
}

#[cfg(test)]
mod tests {
    use filing_model::{ContextElement, QName};

    use super::*;

    fn axis() -> QName {
        QName::new("http://fasb.org/us-gaap/2023", "us-gaap", "StatementGeographicalAxis")
    }

    #[test]
    fn cik_schemes_collapse_to_cik_key() {
        let sec = EntityIdentifier {
            scheme: "http://www.sec.gov/CIK".to_string(),
            value: "0000320193".to_string(),
        };
        assert_eq!(entity_key(&sec), "entity:cik:320193");
        assert_eq!(entity_key(&sec), cik_entity_key("320193"));

        let lei = EntityIdentifier {
            scheme: "http://standards.iso.org/iso/17442".to_string(),
            value: "HWUPKR0MPOU8FGXBT394".to_string(),
        };
        assert_eq!(
            entity_key(&lei),
            "entity:http://standards.iso.org/iso/17442#HWUPKR0MPOU8FGXBT394"
        );
    }

    #[test]
    fn dimension_key_distinguishes_context_element() {
        let segment = DimensionInput {
            axis: axis(),
            member: DimensionMember::Typed("US".to_string()),
            container: ContextElement::Segment,
        };
        let scenario = DimensionInput {
            container: ContextElement::Scenario,
            ..segment.clone()
        };
        assert_ne!(dimension_key(&segment), dimension_key(&scenario));
    }

    #[test]
    fn typed_and_explicit_members_never_collide() {
        let member = QName::new("http://acme.com/2023", "acme", "US");
        let explicit = DimensionInput {
            axis: axis(),
            member: DimensionMember::Explicit(member.clone()),
            container: ContextElement::Segment,
        };
        let typed = DimensionInput {
            axis: axis(),
            member: DimensionMember::Typed(member.uri()),
            container: ContextElement::Segment,
        };
        assert_ne!(dimension_key(&explicit), dimension_key(&typed));
    }

    #[test]
    fn units_and_elements_with_the_same_uri_stay_distinct() {
        let shares = QName::new("http://www.xbrl.org/2003/instance", "xbrli", "shares");
        assert_ne!(id(&unit_key(&shares.uri())), id(&element_key(&shares.uri())));
        assert_eq!(element_key(&shares.uri()), "http://www.xbrl.org/2003/instance#shares");
    }

    #[test]
    fn fact_key_hashes_value() {
        let a = fact_key("acc", "ns#C", "c1", Some("usd"), "100");
        let b = fact_key("acc", "ns#C", "c1", Some("usd"), "200");
        assert_ne!(a, b);
        assert!(a.starts_with("fact:acc:ns#C:c1:usd:"));
        assert_eq!(fact_key("acc", "ns#C", "c1", None, "x").split(':').nth(4), Some(""));
    }
}
