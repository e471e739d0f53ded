//! Typed node and relationship records.
//!
//! Records are created once during a filing pass and never mutated after the
//! pass finalizes. Each record knows its table kind and how to flatten itself
//! into an output [`Row`].

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::filing::ContextElement;
use crate::table::{CellValue, FROM_COLUMN, IDENTIFIER_COLUMN, Row, TO_COLUMN};
use crate::{Identifier, NodeKind, RelationshipKind};

/// A record that becomes one row of a node table.
pub trait NodeRecord {
    const KIND: NodeKind;

    fn identifier(&self) -> Identifier;

    fn to_row(&self) -> Row;
}

fn date_cell(date: Option<NaiveDate>) -> CellValue {
    date.map_or(CellValue::Null, |d| {
        CellValue::Text(d.format("%Y-%m-%d").to_string())
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityNode {
    pub identifier: Identifier,
    pub cik: Option<String>,
    pub name: Option<String>,
    pub ticker: Option<String>,
    pub exchange: Option<String>,
    pub sic: Option<String>,
    pub state_of_incorporation: Option<String>,
    pub fiscal_year_end: Option<String>,
    pub scheme: Option<String>,
    pub scheme_value: Option<String>,
    pub is_parent: bool,
    pub parent_entity_id: Option<Identifier>,
}

impl NodeRecord for EntityNode {
    const KIND: NodeKind = NodeKind::Entity;

    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with(IDENTIFIER_COLUMN, self.identifier)
            .with("cik", self.cik.clone())
            .with("name", self.name.clone())
            .with("ticker", self.ticker.clone())
            .with("exchange", self.exchange.clone())
            .with("sic", self.sic.clone())
            .with("state_of_incorporation", self.state_of_incorporation.clone())
            .with("fiscal_year_end", self.fiscal_year_end.clone())
            .with("scheme", self.scheme.clone())
            .with("scheme_value", self.scheme_value.clone())
            .with("is_parent", self.is_parent)
            .with("parent_entity_id", self.parent_entity_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportNode {
    pub identifier: Identifier,
    pub accession_number: String,
    pub form_type: Option<String>,
    pub filing_date: Option<NaiveDate>,
    pub report_date: Option<NaiveDate>,
    pub document_url: Option<String>,
    pub fact_count: i64,
    pub failed: bool,
    pub processed: bool,
    pub failure_reason: Option<String>,
}

impl NodeRecord for ReportNode {
    const KIND: NodeKind = NodeKind::Report;

    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with(IDENTIFIER_COLUMN, self.identifier)
            .with("accession_number", self.accession_number.as_str())
            .with("form_type", self.form_type.clone())
            .with("filing_date", date_cell(self.filing_date))
            .with("report_date", date_cell(self.report_date))
            .with("document_url", self.document_url.clone())
            .with("fact_count", self.fact_count)
            .with("failed", self.failed)
            .with("processed", self.processed)
            .with("failure_reason", self.failure_reason.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactSetNode {
    pub identifier: Identifier,
    pub accession_number: String,
    pub fact_count: i64,
}

impl NodeRecord for FactSetNode {
    const KIND: NodeKind = NodeKind::FactSet;

    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with(IDENTIFIER_COLUMN, self.identifier)
            .with("accession_number", self.accession_number.as_str())
            .with("fact_count", self.fact_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactType {
    Numeric,
    Nonnumeric,
}

impl FactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactType::Numeric => "Numeric",
            FactType::Nonnumeric => "Nonnumeric",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Inline,
    External,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Inline => "inline",
            ValueType::External => "external",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactNode {
    pub identifier: Identifier,
    pub concept: String,
    pub concept_uri: String,
    pub source_id: Option<String>,
    pub context_ref: String,
    pub unit_ref: Option<String>,
    /// Inline value, or the blob URL once externalized.
    pub value: String,
    pub numeric_value: Option<f64>,
    pub decimals: Option<String>,
    pub fact_type: FactType,
    pub value_type: ValueType,
    pub content_type: Option<String>,
    pub is_nil: bool,
}

impl NodeRecord for FactNode {
    const KIND: NodeKind = NodeKind::Fact;

    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with(IDENTIFIER_COLUMN, self.identifier)
            .with("concept", self.concept.as_str())
            .with("concept_uri", self.concept_uri.as_str())
            .with("source_id", self.source_id.clone())
            .with("context_ref", self.context_ref.as_str())
            .with("unit_ref", self.unit_ref.clone())
            .with("value", self.value.as_str())
            .with("numeric_value", self.numeric_value)
            .with("decimals", self.decimals.clone())
            .with("fact_type", self.fact_type.as_str())
            .with("value_type", self.value_type.as_str())
            .with("content_type", self.content_type.clone())
            .with("is_nil", self.is_nil)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitNode {
    pub identifier: Identifier,
    pub uri: String,
    pub measure: String,
    pub value: String,
    pub is_divide: bool,
    pub numerator_uri: Option<String>,
    pub denominator_uri: Option<String>,
}

impl NodeRecord for UnitNode {
    const KIND: NodeKind = NodeKind::Unit;

    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with(IDENTIFIER_COLUMN, self.identifier)
            .with("uri", self.uri.as_str())
            .with("measure", self.measure.as_str())
            .with("value", self.value.as_str())
            .with("is_divide", self.is_divide)
            .with("numerator_uri", self.numerator_uri.clone())
            .with("denominator_uri", self.denominator_uri.clone())
    }
}

/// Period kind after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    Instant,
    Duration,
    Forever,
    Unknown,
}

impl PeriodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodKind::Instant => "instant",
            PeriodKind::Duration => "duration",
            PeriodKind::Forever => "forever",
            PeriodKind::Unknown => "unknown",
        }
    }
}

/// Aggregation class of a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodClass {
    Instant,
    Quarterly,
    SemiAnnual,
    NineMonths,
    Annual,
    Other,
    Forever,
    Unknown,
}

impl PeriodClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodClass::Instant => "instant",
            PeriodClass::Quarterly => "quarterly",
            PeriodClass::SemiAnnual => "semi_annual",
            PeriodClass::NineMonths => "nine_months",
            PeriodClass::Annual => "annual",
            PeriodClass::Other => "other",
            PeriodClass::Forever => "forever",
            PeriodClass::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodNode {
    pub identifier: Identifier,
    pub uri: String,
    pub period_type: PeriodKind,
    pub period_class: PeriodClass,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub forever_date: bool,
    pub fiscal_year: Option<i32>,
    pub fiscal_quarter: Option<String>,
    pub is_annual: bool,
    pub is_quarterly: bool,
    pub is_ytd: bool,
    pub days_in_period: Option<i64>,
}

impl NodeRecord for PeriodNode {
    const KIND: NodeKind = NodeKind::Period;

    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with(IDENTIFIER_COLUMN, self.identifier)
            .with("uri", self.uri.as_str())
            .with("period_type", self.period_type.as_str())
            .with("period_class", self.period_class.as_str())
            .with("start_date", date_cell(self.start_date))
            .with("end_date", date_cell(self.end_date))
            .with("forever_date", self.forever_date)
            .with("fiscal_year", self.fiscal_year.map(i64::from))
            .with("fiscal_quarter", self.fiscal_quarter.clone())
            .with("is_annual", self.is_annual)
            .with("is_quarterly", self.is_quarterly)
            .with("is_ytd", self.is_ytd)
            .with("days_in_period", self.days_in_period)
    }
}

/// Structural role of a concept inferred from its declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementClassification {
    HypercubeElement,
    DimensionElement,
    DomainElement,
    MemberElement,
    LineItemsElement,
    ListItemsElement,
}

impl ElementClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementClassification::HypercubeElement => "hypercubeElement",
            ElementClassification::DimensionElement => "dimensionElement",
            ElementClassification::DomainElement => "domainElement",
            ElementClassification::MemberElement => "memberElement",
            ElementClassification::LineItemsElement => "lineItemsElement",
            ElementClassification::ListItemsElement => "listItemsElement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub identifier: Identifier,
    pub uri: String,
    pub qname: String,
    pub namespace: String,
    pub name: String,
    pub classification: Option<ElementClassification>,
    pub substitution_group: String,
    pub period_type: Option<String>,
    pub balance: Option<String>,
    pub item_type: Option<String>,
    pub is_abstract: bool,
    pub is_nillable: bool,
    pub is_numeric: bool,
    pub is_textblock: bool,
}

impl NodeRecord for ElementNode {
    const KIND: NodeKind = NodeKind::Element;

    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with(IDENTIFIER_COLUMN, self.identifier)
            .with("uri", self.uri.as_str())
            .with("qname", self.qname.as_str())
            .with("namespace", self.namespace.as_str())
            .with("name", self.name.as_str())
            .with(
                "classification",
                self.classification.map(|c| c.as_str().to_string()),
            )
            .with("substitution_group", self.substitution_group.as_str())
            .with("period_type", self.period_type.clone())
            .with("balance", self.balance.clone())
            .with("item_type", self.item_type.clone())
            .with("is_abstract", self.is_abstract)
            .with("is_nillable", self.is_nillable)
            .with("is_numeric", self.is_numeric)
            .with("is_textblock", self.is_textblock)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionType {
    Explicit,
    Typed,
}

impl DimensionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionType::Explicit => "explicit",
            DimensionType::Typed => "typed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionNode {
    pub identifier: Identifier,
    pub axis_uri: String,
    pub axis: String,
    pub member_uri: Option<String>,
    pub member: Option<String>,
    pub typed_value: Option<String>,
    pub dimension_type: DimensionType,
    pub context_element: ContextElement,
}

impl NodeRecord for DimensionNode {
    const KIND: NodeKind = NodeKind::Dimension;

    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with(IDENTIFIER_COLUMN, self.identifier)
            .with("axis_uri", self.axis_uri.as_str())
            .with("axis", self.axis.as_str())
            .with("member_uri", self.member_uri.clone())
            .with("member", self.member.clone())
            .with("typed_value", self.typed_value.clone())
            .with("dimension_type", self.dimension_type.as_str())
            .with("context_element", self.context_element.as_str())
    }
}

/// Network flavour, derived from the arcrole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssociationType {
    Presentation,
    Calculation,
    Other,
}

impl AssociationType {
    pub fn from_arcrole(arcrole: &str) -> Self {
        if arcrole.ends_with("/parent-child") {
            AssociationType::Presentation
        } else if arcrole.ends_with("/summation-item") {
            AssociationType::Calculation
        } else {
            AssociationType::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssociationType::Presentation => "Presentation",
            AssociationType::Calculation => "Calculation",
            AssociationType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureNode {
    pub identifier: Identifier,
    pub role_uri: String,
    pub arcrole: String,
    pub definition: Option<String>,
    pub network_type: AssociationType,
    pub root_concepts: Vec<String>,
    pub accession_number: String,
    pub association_count: i64,
}

impl NodeRecord for StructureNode {
    const KIND: NodeKind = NodeKind::Structure;

    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with(IDENTIFIER_COLUMN, self.identifier)
            .with("role_uri", self.role_uri.as_str())
            .with("arcrole", self.arcrole.as_str())
            .with("definition", self.definition.clone())
            .with("network_type", self.network_type.as_str())
            .with("root_concepts", self.root_concepts.join("|"))
            .with("accession_number", self.accession_number.as_str())
            .with("association_count", self.association_count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationNode {
    pub identifier: Identifier,
    pub structure_id: Identifier,
    pub arcrole: String,
    pub role_uri: String,
    pub parent_uri: String,
    pub child_uri: String,
    pub order: f64,
    pub association_type: AssociationType,
    pub weight: Option<f64>,
    pub root: bool,
    pub preferred_label: Option<String>,
}

impl NodeRecord for AssociationNode {
    const KIND: NodeKind = NodeKind::Association;

    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with(IDENTIFIER_COLUMN, self.identifier)
            .with("structure_id", self.structure_id)
            .with("arcrole", self.arcrole.as_str())
            .with("role_uri", self.role_uri.as_str())
            .with("parent_uri", self.parent_uri.as_str())
            .with("child_uri", self.child_uri.as_str())
            .with("order", self.order)
            .with("association_type", self.association_type.as_str())
            .with("weight", self.weight)
            .with("root", self.root)
            .with("preferred_label", self.preferred_label.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelNode {
    pub identifier: Identifier,
    pub element_uri: String,
    pub role: String,
    pub lang: String,
    pub text: String,
}

impl NodeRecord for LabelNode {
    const KIND: NodeKind = NodeKind::Label;

    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with(IDENTIFIER_COLUMN, self.identifier)
            .with("element_uri", self.element_uri.as_str())
            .with("role", self.role.as_str())
            .with("lang", self.lang.as_str())
            .with("text", self.text.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceNode {
    pub identifier: Identifier,
    pub element_uri: String,
    pub role: String,
    pub parts: BTreeMap<String, String>,
}

impl ReferenceNode {
    /// `Name` -> `ref_name`, `SubTopic` -> `ref_sub_topic`, `URI` -> `ref_uri`.
    pub fn part_column(part: &str) -> String {
        let chars: Vec<char> = part.chars().collect();
        let mut column = String::from("ref_");
        for (idx, ch) in chars.iter().copied().enumerate() {
            if ch.is_ascii_uppercase() {
                let prev = idx.checked_sub(1).map(|i| chars[i]);
                let next = chars.get(idx + 1).copied();
                let word_start = match prev {
                    Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                    Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                    _ => false,
                };
                if word_start && !column.ends_with('_') {
                    column.push('_');
                }
                column.push(ch.to_ascii_lowercase());
            } else if ch.is_ascii_alphanumeric() {
                column.push(ch);
            } else if !column.ends_with('_') {
                column.push('_');
            }
        }
        column
    }
}

impl NodeRecord for ReferenceNode {
    const KIND: NodeKind = NodeKind::Reference;

    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn to_row(&self) -> Row {
        let parts_json = serde_json::to_string(&self.parts).unwrap_or_default();
        let mut row = Row::new()
            .with(IDENTIFIER_COLUMN, self.identifier)
            .with("element_uri", self.element_uri.as_str())
            .with("role", self.role.as_str())
            .with("parts_json", parts_json);
        for (part, value) in &self.parts {
            row.insert(&Self::part_column(part), value.as_str());
        }
        row
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyNode {
    pub identifier: Identifier,
    pub namespace: String,
    pub schema_location: Option<String>,
    pub prefix: Option<String>,
    pub name: String,
    pub version: Option<String>,
}

impl NodeRecord for TaxonomyNode {
    const KIND: NodeKind = NodeKind::Taxonomy;

    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with(IDENTIFIER_COLUMN, self.identifier)
            .with("namespace", self.namespace.as_str())
            .with("schema_location", self.schema_location.clone())
            .with("prefix", self.prefix.clone())
            .with("name", self.name.as_str())
            .with("version", self.version.clone())
    }
}

/// One relationship row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub kind: RelationshipKind,
    pub from: Identifier,
    pub to: Identifier,
    #[serde(default)]
    pub properties: BTreeMap<String, CellValue>,
}

impl Edge {
    pub fn new(kind: RelationshipKind, from: Identifier, to: Identifier) -> Self {
        Self {
            kind,
            from,
            to,
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, name: &str, value: impl Into<CellValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn to_row(&self) -> Row {
        let mut row = Row::new()
            .with(FROM_COLUMN, self.from)
            .with(TO_COLUMN, self.to);
        for (name, value) in &self.properties {
            row.insert(name, value.clone());
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn association_type_from_arcrole() {
        assert_eq!(
            AssociationType::from_arcrole("http://www.xbrl.org/2003/arcrole/parent-child"),
            AssociationType::Presentation
        );
        assert_eq!(
            AssociationType::from_arcrole("https://xbrl.org/2023/arcrole/summation-item"),
            AssociationType::Calculation
        );
        assert_eq!(
            AssociationType::from_arcrole("http://xbrl.org/int/dim/arcrole/domain-member"),
            AssociationType::Other
        );
    }

    #[test]
    fn reference_part_columns() {
        assert_eq!(ReferenceNode::part_column("Name"), "ref_name");
        assert_eq!(ReferenceNode::part_column("SubTopic"), "ref_sub_topic");
        assert_eq!(ReferenceNode::part_column("URI"), "ref_uri");
        assert_eq!(ReferenceNode::part_column("URIDate"), "ref_uri_date");
        assert_eq!(ReferenceNode::part_column("Sub-Paragraph"), "ref_sub_paragraph");
    }

    #[test]
    fn edge_row_leads_with_endpoints() {
        let from = Identifier::from_semantic_key("a");
        let to = Identifier::from_semantic_key("b");
        let row = Edge::new(RelationshipKind::FactHasUnit, from, to)
            .with_property("weight", 1.0)
            .to_row();
        assert_eq!(row.get(FROM_COLUMN), Some(&CellValue::Text(from.to_hex())));
        assert_eq!(row.get(TO_COLUMN), Some(&CellValue::Text(to.to_hex())));
        assert_eq!(row.get("weight"), Some(&CellValue::Float(1.0)));
    }

    #[test]
    fn unset_options_become_null_cells() {
        let node = UnitNode {
            identifier: Identifier::from_semantic_key("u"),
            uri: "http://www.xbrl.org/2003/iso4217#USD".to_string(),
            measure: "iso4217:USD".to_string(),
            value: "USD".to_string(),
            is_divide: false,
            numerator_uri: None,
            denominator_uri: None,
        };
        let row = node.to_row();
        assert_eq!(row.get("numerator_uri"), Some(&CellValue::Null));
        assert_eq!(row.get("is_divide"), Some(&CellValue::Boolean(false)));
    }
}
