//! Closed set of output table kinds.
//!
//! Every node and relationship table the engine can emit is a variant here; the
//! schema registry and the table manager key their lookups on these variants
//! instead of on free-form table names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Node table kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Entity,
    Report,
    FactSet,
    Fact,
    Unit,
    Period,
    Element,
    Dimension,
    Structure,
    Association,
    Label,
    Reference,
    Taxonomy,
}

impl NodeKind {
    pub const ALL: [NodeKind; 13] = [
        NodeKind::Entity,
        NodeKind::Report,
        NodeKind::FactSet,
        NodeKind::Fact,
        NodeKind::Unit,
        NodeKind::Period,
        NodeKind::Element,
        NodeKind::Dimension,
        NodeKind::Structure,
        NodeKind::Association,
        NodeKind::Label,
        NodeKind::Reference,
        NodeKind::Taxonomy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Entity => "Entity",
            NodeKind::Report => "Report",
            NodeKind::FactSet => "FactSet",
            NodeKind::Fact => "Fact",
            NodeKind::Unit => "Unit",
            NodeKind::Period => "Period",
            NodeKind::Element => "Element",
            NodeKind::Dimension => "Dimension",
            NodeKind::Structure => "Structure",
            NodeKind::Association => "Association",
            NodeKind::Label => "Label",
            NodeKind::Reference => "Reference",
            NodeKind::Taxonomy => "Taxonomy",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        NodeKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ModelError::UnknownTableKind(s.to_string()))
    }
}

/// Relationship table kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipKind {
    EntityHasReport,
    ReportHasFact,
    ReportHasFactSet,
    FactSetHasFact,
    FactHasUnit,
    FactHasPeriod,
    FactHasElement,
    FactHasEntity,
    FactHasDimension,
    FactDimensionAxisElement,
    FactDimensionMemberElement,
    ElementHasLabel,
    ElementHasReference,
    StructureHasAssociation,
    AssociationHasFromElement,
    AssociationHasToElement,
    StructureHasTaxonomy,
    ReportUsesTaxonomy,
}

impl RelationshipKind {
    pub const ALL: [RelationshipKind; 18] = [
        RelationshipKind::EntityHasReport,
        RelationshipKind::ReportHasFact,
        RelationshipKind::ReportHasFactSet,
        RelationshipKind::FactSetHasFact,
        RelationshipKind::FactHasUnit,
        RelationshipKind::FactHasPeriod,
        RelationshipKind::FactHasElement,
        RelationshipKind::FactHasEntity,
        RelationshipKind::FactHasDimension,
        RelationshipKind::FactDimensionAxisElement,
        RelationshipKind::FactDimensionMemberElement,
        RelationshipKind::ElementHasLabel,
        RelationshipKind::ElementHasReference,
        RelationshipKind::StructureHasAssociation,
        RelationshipKind::AssociationHasFromElement,
        RelationshipKind::AssociationHasToElement,
        RelationshipKind::StructureHasTaxonomy,
        RelationshipKind::ReportUsesTaxonomy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::EntityHasReport => "ENTITY_HAS_REPORT",
            RelationshipKind::ReportHasFact => "REPORT_HAS_FACT",
            RelationshipKind::ReportHasFactSet => "REPORT_HAS_FACT_SET",
            RelationshipKind::FactSetHasFact => "FACT_SET_HAS_FACT",
            RelationshipKind::FactHasUnit => "FACT_HAS_UNIT",
            RelationshipKind::FactHasPeriod => "FACT_HAS_PERIOD",
            RelationshipKind::FactHasElement => "FACT_HAS_ELEMENT",
            RelationshipKind::FactHasEntity => "FACT_HAS_ENTITY",
            RelationshipKind::FactHasDimension => "FACT_HAS_DIMENSION",
            RelationshipKind::FactDimensionAxisElement => "FACT_DIMENSION_AXIS_ELEMENT",
            RelationshipKind::FactDimensionMemberElement => "FACT_DIMENSION_MEMBER_ELEMENT",
            RelationshipKind::ElementHasLabel => "ELEMENT_HAS_LABEL",
            RelationshipKind::ElementHasReference => "ELEMENT_HAS_REFERENCE",
            RelationshipKind::StructureHasAssociation => "STRUCTURE_HAS_ASSOCIATION",
            RelationshipKind::AssociationHasFromElement => "ASSOCIATION_HAS_FROM_ELEMENT",
            RelationshipKind::AssociationHasToElement => "ASSOCIATION_HAS_TO_ELEMENT",
            RelationshipKind::StructureHasTaxonomy => "STRUCTURE_HAS_TAXONOMY",
            RelationshipKind::ReportUsesTaxonomy => "REPORT_USES_TAXONOMY",
        }
    }

    /// Node kinds at the `from` and `to` ends of this relationship.
    pub fn endpoints(&self) -> (NodeKind, NodeKind) {
        match self {
            RelationshipKind::EntityHasReport => (NodeKind::Entity, NodeKind::Report),
            RelationshipKind::ReportHasFact => (NodeKind::Report, NodeKind::Fact),
            RelationshipKind::ReportHasFactSet => (NodeKind::Report, NodeKind::FactSet),
            RelationshipKind::FactSetHasFact => (NodeKind::FactSet, NodeKind::Fact),
            RelationshipKind::FactHasUnit => (NodeKind::Fact, NodeKind::Unit),
            RelationshipKind::FactHasPeriod => (NodeKind::Fact, NodeKind::Period),
            RelationshipKind::FactHasElement => (NodeKind::Fact, NodeKind::Element),
            RelationshipKind::FactHasEntity => (NodeKind::Fact, NodeKind::Entity),
            RelationshipKind::FactHasDimension => (NodeKind::Fact, NodeKind::Dimension),
            RelationshipKind::FactDimensionAxisElement => (NodeKind::Dimension, NodeKind::Element),
            RelationshipKind::FactDimensionMemberElement => {
                (NodeKind::Dimension, NodeKind::Element)
            }
            RelationshipKind::ElementHasLabel => (NodeKind::Element, NodeKind::Label),
            RelationshipKind::ElementHasReference => (NodeKind::Element, NodeKind::Reference),
            RelationshipKind::StructureHasAssociation => {
                (NodeKind::Structure, NodeKind::Association)
            }
            RelationshipKind::AssociationHasFromElement => {
                (NodeKind::Association, NodeKind::Element)
            }
            RelationshipKind::AssociationHasToElement => (NodeKind::Association, NodeKind::Element),
            RelationshipKind::StructureHasTaxonomy => (NodeKind::Structure, NodeKind::Taxonomy),
            RelationshipKind::ReportUsesTaxonomy => (NodeKind::Report, NodeKind::Taxonomy),
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        RelationshipKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ModelError::UnknownTableKind(s.to_string()))
    }
}

/// Either side of the output: a node table or a relationship table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TableKind {
    Node(NodeKind),
    Relationship(RelationshipKind),
}

impl TableKind {
    pub fn all() -> impl Iterator<Item = TableKind> {
        NodeKind::ALL
            .into_iter()
            .map(TableKind::Node)
            .chain(RelationshipKind::ALL.into_iter().map(TableKind::Relationship))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Node(kind) => kind.as_str(),
            TableKind::Relationship(kind) => kind.as_str(),
        }
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self, TableKind::Relationship(_))
    }

    /// Output partition directory name.
    pub fn partition(&self) -> &'static str {
        match self {
            TableKind::Node(_) => "nodes",
            TableKind::Relationship(_) => "relationships",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableKind {
    type Err = ModelError;

    /// Node kinds are CamelCase and relationship kinds SCREAMING_SNAKE_CASE, so
    /// the two namespaces never collide.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(kind) = s.parse::<RelationshipKind>() {
            return Ok(TableKind::Relationship(kind));
        }
        s.parse::<NodeKind>().map(TableKind::Node)
    }
}
