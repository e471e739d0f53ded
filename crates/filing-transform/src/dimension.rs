//! Dimension decomposition.

use filing_model::{
    DimensionInput, DimensionMember, DimensionNode, DimensionType, Identifier, ParsedFiling,
    RelationshipKind,
};

use crate::arena::GraphTables;
use crate::concept::ConceptResolver;
use crate::identity::dimension_key;

/// Returns the dimension's identifier. On first occurrence the axis element
/// (and, for explicit members, the member element) are materialized and
/// linked; repeats only reuse the identifier.
pub fn materialize_dimension<F: ParsedFiling + ?Sized>(
    tables: &mut GraphTables,
    concepts: &ConceptResolver<'_, F>,
    dimension: &DimensionInput,
) -> Identifier {
    let key = dimension_key(dimension);
    if let Some(id) = tables.dimensions.lookup(&key) {
        return id;
    }

    let axis_id = concepts.element(tables, &dimension.axis);
    let member_id = match &dimension.member {
        DimensionMember::Explicit(member) => Some(concepts.element(tables, member)),
        DimensionMember::Typed(_) => None,
    };

    let dimension_id = tables
        .dimensions
        .insert_with(&key, |identifier| {
            let (member_uri, member, typed_value, dimension_type) = match &dimension.member {
                DimensionMember::Explicit(member) => (
                    Some(member.uri()),
                    Some(member.prefixed()),
                    None,
                    DimensionType::Explicit,
                ),
                DimensionMember::Typed(value) => {
                    (None, None, Some(value.clone()), DimensionType::Typed)
                }
            };
            DimensionNode {
                identifier,
                axis_uri: dimension.axis.uri(),
                axis: dimension.axis.prefixed(),
                member_uri,
                member,
                typed_value,
                dimension_type,
                context_element: dimension.container,
            }
        })
        .id;

    tables.link(RelationshipKind::FactDimensionAxisElement, dimension_id, axis_id);
    if let Some(member_id) = member_id {
        tables.link(
            RelationshipKind::FactDimensionMemberElement,
            dimension_id,
            member_id,
        );
    }
    dimension_id
}

#[cfg(test)]
mod tests {
    use filing_model::{ContextElement, FilingDocument, QName};

    use super::*;
    use crate::options::EngineOptions;

    fn axis() -> QName {
        QName::new(
            "http://fasb.org/us-gaap/2023",
            "us-gaap",
            "StatementBusinessSegmentsAxis",
        )
    }

    #[test]
    fn explicit_dimension_links_axis_and_member() {
        let doc = FilingDocument::default();
        let options = EngineOptions::default();
        let resolver = ConceptResolver::new(&doc, &options);
        let mut tables = GraphTables::new();
        let dim = DimensionInput {
            axis: axis(),
            member: DimensionMember::Explicit(QName::new(
                "http://acme.com/2023",
                "acme",
                "WidgetsMember",
            )),
            container: ContextElement::Segment,
        };

        let a = materialize_dimension(&mut tables, &resolver, &dim);
        let b = materialize_dimension(&mut tables, &resolver, &dim);
        assert_eq!(a, b);
        assert_eq!(tables.dimensions.len(), 1);
        assert_eq!(tables.elements.len(), 2);
        assert_eq!(tables.edge_count(RelationshipKind::FactDimensionAxisElement), 1);
        assert_eq!(tables.edge_count(RelationshipKind::FactDimensionMemberElement), 1);

        let node = tables.dimensions.get(a).unwrap();
        assert_eq!(node.member.as_deref(), Some("acme:WidgetsMember"));
        assert_eq!(node.dimension_type, DimensionType::Explicit);
    }

    #[test]
    fn typed_dimension_has_no_member_element() {
        let doc = FilingDocument::default();
        let options = EngineOptions::default();
        let resolver = ConceptResolver::new(&doc, &options);
        let mut tables = GraphTables::new();
        let dim = DimensionInput {
            axis: axis(),
            member: DimensionMember::Typed("2023-01-01".to_string()),
            container: ContextElement::Scenario,
        };
        let id = materialize_dimension(&mut tables, &resolver, &dim);
        assert_eq!(tables.elements.len(), 1);
        assert_eq!(tables.edge_count(RelationshipKind::FactDimensionMemberElement), 0);
        let node = tables.dimensions.get(id).unwrap();
        assert_eq!(node.typed_value.as_deref(), Some("2023-01-01"));
        assert_eq!(node.context_element, ContextElement::Scenario);
    }

    #[test]
    fn shared_axis_element_is_reused_across_members() {
        let doc = FilingDocument::default();
        let options = EngineOptions::default();
        let resolver = ConceptResolver::new(&doc, &options);
        let mut tables = GraphTables::new();
        for member in ["WidgetsMember", "GadgetsMember"] {
            let dim = DimensionInput {
                axis: axis(),
                member: DimensionMember::Explicit(QName::new("http://acme.com/2023", "acme", member)),
                container: ContextElement::Segment,
            };
            materialize_dimension(&mut tables, &resolver, &dim);
        }
        assert_eq!(tables.dimensions.len(), 2);
        assert_eq!(tables.elements.len(), 3);
        assert_eq!(tables.edge_count(RelationshipKind::FactDimensionAxisElement), 2);
    }
}
