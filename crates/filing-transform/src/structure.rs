//! Taxonomy structures and their associations.

use std::collections::HashSet;

use filing_model::{
    AssociationNode, AssociationType, Edge, Identifier, NetworkRelationship, NetworkRole,
    ParsedFiling, QName, RelationshipKind, StructureNode, TaxonomyNode,
};
use tracing::debug;

use crate::arena::GraphTables;
use crate::concept::ConceptResolver;
use crate::identity::{association_key, structure_key};
use crate::options::EngineOptions;

/// Host part of a URI, e.g. `fasb.org` for `http://fasb.org/us-gaap/role/x`.
pub fn uri_authority(uri: &str) -> Option<&str> {
    let rest = uri.split_once("://").map(|(_, rest)| rest)?;
    let authority = rest.split(['/', '#', '?']).next()?;
    let host = authority.rsplit('@').next()?;
    let host = host.split(':').next()?;
    (!host.is_empty()).then_some(host)
}

/// Parents that never appear as a child, in first-seen order.
pub fn root_concepts(relationships: &[NetworkRelationship]) -> Vec<QName> {
    let children: HashSet<&QName> = relationships.iter().map(|r| &r.to).collect();
    let mut seen = HashSet::new();
    relationships
        .iter()
        .map(|r| &r.from)
        .filter(|parent| !children.contains(parent))
        .filter(|parent| seen.insert(*parent))
        .cloned()
        .collect()
}

/// The taxonomy sharing the role URI's authority, else the first one listed.
pub fn taxonomy_for_role<'t>(role_uri: &str, taxonomies: &'t [TaxonomyNode]) -> Option<&'t TaxonomyNode> {
    let authority = uri_authority(role_uri);
    authority
        .and_then(|host| {
            taxonomies.iter().find(|taxonomy| {
                uri_authority(&taxonomy.namespace) == Some(host)
                    || taxonomy
                        .schema_location
                        .as_deref()
                        .and_then(uri_authority)
                        == Some(host)
            })
        })
        .or_else(|| taxonomies.first())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructureStats {
    pub structures: usize,
    pub associations: usize,
    pub skipped_roles: usize,
}

/// Builds one structure per non-denied network role of the filing.
pub fn build_structures<F: ParsedFiling + ?Sized>(
    tables: &mut GraphTables,
    filing: &F,
    concepts: &ConceptResolver<'_, F>,
    options: &EngineOptions,
    accession: &str,
) -> StructureStats {
    let mut stats = StructureStats::default();
    let taxonomies: Vec<TaxonomyNode> = tables.taxonomies.iter().cloned().collect();

    for role in filing.network_roles() {
        if options.is_role_denied(&role.linkrole) {
            stats.skipped_roles += 1;
            continue;
        }
        let relationships = filing.network_relationships(&role);
        if relationships.is_empty() {
            continue;
        }

        let structure_id = build_structure(tables, filing, concepts, &role, &relationships, accession);
        stats.structures += 1;

        if let Some(taxonomy) = taxonomy_for_role(&role.linkrole, &taxonomies) {
            tables.link(
                RelationshipKind::StructureHasTaxonomy,
                structure_id,
                taxonomy.identifier,
            );
        }
        let count = tables
            .structures
            .get(structure_id)
            .map_or(0, |s| s.association_count);
        stats.associations += usize::try_from(count).unwrap_or(0);
        debug!(role = %role.linkrole, arcrole = %role.arcrole, associations = count, "built structure");
    }
    stats
}

fn build_structure<F: ParsedFiling + ?Sized>(
    tables: &mut GraphTables,
    filing: &F,
    concepts: &ConceptResolver<'_, F>,
    role: &NetworkRole,
    relationships: &[NetworkRelationship],
    accession: &str,
) -> Identifier {
    let roots = root_concepts(relationships);
    let network_type = AssociationType::from_arcrole(&role.arcrole);
    let structure = tables
        .structures
        .insert_with(&structure_key(accession, role), |identifier| StructureNode {
            identifier,
            role_uri: role.linkrole.clone(),
            arcrole: role.arcrole.clone(),
            definition: filing.role_definition(&role.linkrole),
            network_type,
            root_concepts: roots.iter().map(QName::prefixed).collect(),
            accession_number: accession.to_string(),
            association_count: 0,
        });
    if !structure.is_new {
        return structure.id;
    }

    let root_set: HashSet<&QName> = roots.iter().collect();
    let mut created = 0i64;
    for relationship in relationships {
        let parent_uri = relationship.from.uri();
        let child_uri = relationship.to.uri();
        let key = association_key(accession, role, &parent_uri, &child_uri);
        if tables.associations.contains_key(&key) {
            continue;
        }

        let parent_id = concepts.element(tables, &relationship.from);
        let child_id = concepts.element(tables, &relationship.to);
        let association_id = tables
            .associations
            .insert_with(&key, |identifier| AssociationNode {
                identifier,
                structure_id: structure.id,
                arcrole: role.arcrole.clone(),
                role_uri: role.linkrole.clone(),
                parent_uri,
                child_uri,
                order: relationship.order,
                association_type: network_type,
                weight: match network_type {
                    AssociationType::Calculation => relationship.weight,
                    _ => None,
                },
                root: root_set.contains(&relationship.from),
                preferred_label: relationship.preferred_label.clone(),
            })
            .id;
        created += 1;

        tables.push_edge(
            Edge::new(
                RelationshipKind::StructureHasAssociation,
                structure.id,
                association_id,
            )
            .with_property("order", relationship.order),
        );
        tables.link(
            RelationshipKind::AssociationHasFromElement,
            association_id,
            parent_id,
        );
        tables.link(
            RelationshipKind::AssociationHasToElement,
            association_id,
            child_id,
        );
    }

    if let Some(node) = tables.structures.get_mut(structure.id) {
        node.association_count = created;
    }
    structure.id
}
