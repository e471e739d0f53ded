//! A serialized, already-parsed filing.
//!
//! This is the JSON hand-off format between the parsing collaborator and the
//! engine, and the in-memory fixture used throughout the tests.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::filing::{
    ConceptInfo, DimensionInput, EntityIdentifier, FactInput, NetworkRelationship, NetworkRole,
    ParsedFiling, PeriodInput, QName, TaxonomyRef, UnitInput,
};
use crate::metadata::FilingMetadata;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDefinition {
    pub id: String,
    pub entity: EntityIdentifier,
    #[serde(default)]
    pub period: Option<PeriodInput>,
    #[serde(default)]
    pub dimensions: Vec<DimensionInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDefinition {
    pub id: String,
    #[serde(default)]
    pub measure: Option<QName>,
    #[serde(default)]
    pub numerator: Option<QName>,
    #[serde(default)]
    pub denominator: Option<QName>,
}

impl UnitDefinition {
    pub fn to_input(&self) -> Option<UnitInput> {
        match (&self.numerator, &self.denominator, &self.measure) {
            (Some(numerator), Some(denominator), _) => Some(UnitInput::Divide {
                numerator: numerator.clone(),
                denominator: denominator.clone(),
            }),
            (_, _, Some(measure)) => Some(UnitInput::Measure(measure.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub uri: String,
    #[serde(default)]
    pub definition: Option<String>,
}

/// One arc of a relationship network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkArc {
    pub arcrole: String,
    pub linkrole: String,
    #[serde(flatten)]
    pub relationship: NetworkRelationship,
}

#[derive(Debug, Default)]
struct Indexes {
    concepts: HashMap<QName, usize>,
    contexts: HashMap<String, usize>,
    units: HashMap<String, usize>,
}

/// A parsed filing held fully in memory.
///
/// Lookups are indexed lazily on first use; mutate the public vectors only
/// before handing the document to the engine.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FilingDocument {
    #[serde(default)]
    pub document_uri: Option<String>,
    #[serde(default)]
    pub metadata: Option<FilingMetadata>,
    #[serde(default)]
    pub taxonomies: Vec<TaxonomyRef>,
    #[serde(default)]
    pub concepts: Vec<ConceptInfo>,
    #[serde(default)]
    pub contexts: Vec<ContextDefinition>,
    #[serde(default)]
    pub units: Vec<UnitDefinition>,
    #[serde(default)]
    pub facts: Vec<FactInput>,
    #[serde(default)]
    pub roles: Vec<RoleDefinition>,
    #[serde(default)]
    pub arcs: Vec<NetworkArc>,
    #[serde(skip)]
    indexes: OnceLock<Indexes>,
}

impl FilingDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ModelError::DocumentRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents).map_err(|source| ModelError::DocumentParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(contents: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    fn indexes(&self) -> &Indexes {
        self.indexes.get_or_init(|| {
            let mut indexes = Indexes::default();
            for (idx, concept) in self.concepts.iter().enumerate() {
                indexes.concepts.entry(concept.qname.clone()).or_insert(idx);
            }
            for (idx, context) in self.contexts.iter().enumerate() {
                indexes.contexts.entry(context.id.clone()).or_insert(idx);
            }
            for (idx, unit) in self.units.iter().enumerate() {
                indexes.units.entry(unit.id.clone()).or_insert(idx);
            }
            indexes
        })
    }

    fn context(&self, id: &str) -> Option<&ContextDefinition> {
        self.indexes()
            .contexts
            .get(id)
            .and_then(|idx| self.contexts.get(*idx))
    }
}

impl ParsedFiling for FilingDocument {
    fn document_uri(&self) -> Option<&str> {
        self.document_uri.as_deref()
    }

    fn facts(&self) -> Box<dyn Iterator<Item = &FactInput> + '_> {
        Box::new(self.facts.iter())
    }

    fn unit(&self, fact: &FactInput) -> Option<UnitInput> {
        let unit_ref = fact.unit_ref.as_deref()?;
        self.indexes()
            .units
            .get(unit_ref)
            .and_then(|idx| self.units.get(*idx))
            .and_then(UnitDefinition::to_input)
    }

    fn period(&self, fact: &FactInput) -> Option<PeriodInput> {
        self.context(&fact.context_ref).and_then(|ctx| ctx.period)
    }

    fn dimensions(&self, fact: &FactInput) -> Vec<DimensionInput> {
        self.context(&fact.context_ref)
            .map(|ctx| ctx.dimensions.clone())
            .unwrap_or_default()
    }

    fn entity(&self, fact: &FactInput) -> Option<EntityIdentifier> {
        self.context(&fact.context_ref).map(|ctx| ctx.entity.clone())
    }

    fn concept(&self, qname: &QName) -> Option<&ConceptInfo> {
        self.indexes()
            .concepts
            .get(qname)
            .and_then(|idx| self.concepts.get(*idx))
    }

    fn network_roles(&self) -> Vec<NetworkRole> {
        let roles: BTreeSet<NetworkRole> = self
            .arcs
            .iter()
            .map(|arc| NetworkRole {
                arcrole: arc.arcrole.clone(),
                linkrole: arc.linkrole.clone(),
            })
            .collect();
        roles.into_iter().collect()
    }

    fn role_definition(&self, linkrole: &str) -> Option<String> {
        self.roles
            .iter()
            .find(|role| role.uri == linkrole)
            .and_then(|role| role.definition.clone())
    }

    fn network_relationships(&self, role: &NetworkRole) -> Vec<NetworkRelationship> {
        self.arcs
            .iter()
            .filter(|arc| arc.arcrole == role.arcrole && arc.linkrole == role.linkrole)
            .map(|arc| arc.relationship.clone())
            .collect()
    }

    fn taxonomies(&self) -> Vec<TaxonomyRef> {
        self.taxonomies.clone()
    }
}
