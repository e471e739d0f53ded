//! The parsed-filing capability interface.
//!
//! The engine never touches a parsing library directly. Anything that can hand
//! out facts, resolve their contexts and units, describe concepts and walk the
//! relationship networks can be transformed into a graph.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A namespace-qualified name.
///
/// Equality, ordering and hashing look at `namespace` and `local_name` only.
/// The prefix is a document-local alias and two references to the same
/// concept may spell it differently or leave it out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QName {
    pub namespace: String,
    #[serde(default)]
    pub prefix: String,
    pub local_name: String,
}

impl QName {
    pub fn new(
        namespace: impl Into<String>,
        prefix: impl Into<String>,
        local_name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            prefix: prefix.into(),
            local_name: local_name.into(),
        }
    }

    /// `namespace#localname`, the global semantic key of a concept or measure.
    pub fn uri(&self) -> String {
        format!("{}#{}", self.namespace, self.local_name)
    }

    /// `prefix:localname`, or the bare local name when no prefix is known.
    pub fn prefixed(&self) -> String {
        if self.prefix.is_empty() {
            self.local_name.clone()
        } else {
            format!("{}:{}", self.prefix, self.local_name)
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.local_name == other.local_name
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.local_name.hash(state);
    }
}

impl PartialOrd for QName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.namespace
            .cmp(&other.namespace)
            .then_with(|| self.local_name.cmp(&other.local_name))
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefixed())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubstitutionGroup {
    #[default]
    Item,
    HypercubeItem,
    DimensionItem,
    Tuple,
    Other(String),
}

impl SubstitutionGroup {
    pub fn as_str(&self) -> &str {
        match self {
            SubstitutionGroup::Item => "item",
            SubstitutionGroup::HypercubeItem => "hypercubeItem",
            SubstitutionGroup::DimensionItem => "dimensionItem",
            SubstitutionGroup::Tuple => "tuple",
            SubstitutionGroup::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Instant,
    Duration,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Instant => "instant",
            PeriodType::Duration => "duration",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelInput {
    pub role: String,
    #[serde(default)]
    pub lang: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceInput {
    pub role: String,
    #[serde(default)]
    pub parts: BTreeMap<String, String>,
}

/// Concept metadata as declared by the taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptInfo {
    pub qname: QName,
    #[serde(default)]
    pub substitution_group: SubstitutionGroup,
    #[serde(default)]
    pub period_type: Option<PeriodType>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub nillable: bool,
    /// Local name of the declared item type, e.g. `monetaryItemType`.
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub balance: Option<String>,
    #[serde(default)]
    pub labels: Vec<LabelInput>,
    #[serde(default)]
    pub references: Vec<ReferenceInput>,
}

impl ConceptInfo {
    /// Minimal metadata for a concept the filing references but never declares.
    pub fn undeclared(qname: QName) -> Self {
        Self {
            qname,
            substitution_group: SubstitutionGroup::Item,
            period_type: None,
            is_abstract: false,
            nillable: false,
            type_name: None,
            balance: None,
            labels: Vec::new(),
            references: Vec::new(),
        }
    }
}

/// One reported fact, as handed out by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactInput {
    /// Source document id attribute, when present.
    #[serde(default)]
    pub id: Option<String>,
    pub concept: QName,
    pub context_ref: String,
    #[serde(default)]
    pub unit_ref: Option<String>,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub decimals: Option<String>,
    #[serde(default)]
    pub is_nil: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitInput {
    Measure(QName),
    Divide {
        numerator: QName,
        denominator: QName,
    },
}

/// A context period exactly as reported: end dates are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeriodInput {
    Instant { date: NaiveDate },
    StartEnd { start: NaiveDate, end: NaiveDate },
    Forever,
}

/// Which part of the context carried a dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextElement {
    Segment,
    Scenario,
    #[default]
    Unknown,
}

impl ContextElement {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextElement::Segment => "segment",
            ContextElement::Scenario => "scenario",
            ContextElement::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionMember {
    Explicit(QName),
    Typed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionInput {
    pub axis: QName,
    pub member: DimensionMember,
    #[serde(default)]
    pub container: ContextElement,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityIdentifier {
    pub scheme: String,
    pub value: String,
}

/// A distinct (arcrole, linkrole) network.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NetworkRole {
    pub arcrole: String,
    pub linkrole: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRelationship {
    pub from: QName,
    pub to: QName,
    #[serde(default = "default_order")]
    pub order: f64,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub preferred_label: Option<String>,
}

fn default_order() -> f64 {
    1.0
}

/// A taxonomy schema the filing references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyRef {
    pub namespace: String,
    #[serde(default)]
    pub schema_location: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Capabilities the engine needs from a parsed, validated filing.
pub trait ParsedFiling {
    /// URI of the source document, if known.
    fn document_uri(&self) -> Option<&str>;

    fn facts(&self) -> Box<dyn Iterator<Item = &FactInput> + '_>;

    fn unit(&self, fact: &FactInput) -> Option<UnitInput>;

    fn period(&self, fact: &FactInput) -> Option<PeriodInput>;

    fn dimensions(&self, fact: &FactInput) -> Vec<DimensionInput>;

    /// Entity identifier of the fact's context.
    fn entity(&self, fact: &FactInput) -> Option<EntityIdentifier>;

    fn concept(&self, qname: &QName) -> Option<&ConceptInfo>;

    /// Every distinct (arcrole, linkrole) pair in the relationship index.
    fn network_roles(&self) -> Vec<NetworkRole>;

    /// Human-readable definition of a link role.
    fn role_definition(&self, linkrole: &str) -> Option<String>;

    fn network_relationships(&self, role: &NetworkRole) -> Vec<NetworkRelationship>;

    fn taxonomies(&self) -> Vec<TaxonomyRef>;
}
