pub mod document;
pub mod error;
pub mod filing;
pub mod ids;
pub mod kinds;
pub mod metadata;
pub mod records;
pub mod table;

pub use document::{
    ContextDefinition, FilingDocument, NetworkArc, RoleDefinition, UnitDefinition,
};
pub use error::{ModelError, Result};
pub use filing::{
    ConceptInfo, ContextElement, DimensionInput, DimensionMember, EntityIdentifier, FactInput,
    LabelInput, NetworkRelationship, NetworkRole, ParsedFiling, PeriodInput, PeriodType, QName,
    ReferenceInput, SubstitutionGroup, TaxonomyRef, UnitInput,
};
pub use ids::Identifier;
pub use kinds::{NodeKind, RelationshipKind, TableKind};
pub use metadata::{FilingMetadata, normalize_cik};
pub use records::{
    AssociationNode, AssociationType, DimensionNode, DimensionType, Edge, ElementClassification,
    ElementNode, EntityNode, FactNode, FactSetNode, FactType, LabelNode, NodeRecord, PeriodClass,
    PeriodKind, PeriodNode, ReferenceNode, ReportNode, StructureNode, TaxonomyNode, UnitNode,
    ValueType,
};
pub use table::{CellValue, FROM_COLUMN, IDENTIFIER_COLUMN, Row, TO_COLUMN, TableRows};
