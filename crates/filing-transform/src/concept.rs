//! Element, label and reference materialization.

use filing_model::{
    ConceptInfo, ElementClassification, ElementNode, Identifier, LabelNode, ParsedFiling,
    PeriodType, QName, ReferenceNode, RelationshipKind, SubstitutionGroup,
};

use crate::arena::GraphTables;
use crate::identity::{element_key, label_key, reference_key};
use crate::options::EngineOptions;

const DOMAIN_ITEM_TYPE: &str = "domainItemType";
const TEXT_BLOCK_ITEM_TYPE: &str = "textBlockItemType";

const NUMERIC_ITEM_TYPES: &[&str] = &[
    "monetaryItemType",
    "decimalItemType",
    "floatItemType",
    "doubleItemType",
    "integerItemType",
    "intItemType",
    "longItemType",
    "shortItemType",
    "nonNegativeIntegerItemType",
    "nonPositiveIntegerItemType",
    "positiveIntegerItemType",
    "negativeIntegerItemType",
    "unsignedIntItemType",
    "unsignedLongItemType",
    "sharesItemType",
    "pureItemType",
    "fractionItemType",
    "perShareItemType",
    "percentItemType",
    "areaItemType",
    "volumeItemType",
    "massItemType",
    "energyItemType",
    "powerItemType",
    "lengthItemType",
    "flowItemType",
    "durationItemType",
];

/// Local part of a possibly prefixed type name.
fn type_local_name(type_name: &str) -> &str {
    type_name.rsplit(':').next().unwrap_or(type_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMatch {
    HypercubeItem,
    Item,
}

/// One row of the classification decision table. `None` matches anything.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub group: GroupMatch,
    pub period_type: PeriodType,
    pub is_abstract: bool,
    pub domain_item_type: Option<bool>,
    pub nillable: Option<bool>,
    pub name_suffix: Option<&'static str>,
    pub classification: ElementClassification,
}

impl ClassificationRule {
    pub fn matches(&self, concept: &ConceptInfo) -> bool {
        let group = match concept.substitution_group {
            SubstitutionGroup::HypercubeItem => Some(GroupMatch::HypercubeItem),
            SubstitutionGroup::Item => Some(GroupMatch::Item),
            _ => None,
        };
        if group != Some(self.group)
            || concept.period_type != Some(self.period_type)
            || concept.is_abstract != self.is_abstract
        {
            return false;
        }
        if let Some(wanted) = self.domain_item_type {
            let is_domain = concept
                .type_name
                .as_deref()
                .is_some_and(|t| type_local_name(t) == DOMAIN_ITEM_TYPE);
            if is_domain != wanted {
                return false;
            }
        }
        if self.nillable.is_some_and(|wanted| wanted != concept.nillable) {
            return false;
        }
        if let Some(suffix) = self.name_suffix {
            return concept.qname.local_name.ends_with(suffix);
        }
        true
    }
}

/// Ordered; the first matching rule wins. The third rule repeats the first
/// rule's premise and can never fire; it is kept so the table mirrors the
/// established classification order.
pub const CLASSIFICATION_RULES: [ClassificationRule; 7] = [
    ClassificationRule {
        group: GroupMatch::HypercubeItem,
        period_type: PeriodType::Duration,
        is_abstract: true,
        domain_item_type: None,
        nillable: None,
        name_suffix: None,
        classification: ElementClassification::HypercubeElement,
    },
    ClassificationRule {
        group: GroupMatch::HypercubeItem,
        period_type: PeriodType::Instant,
        is_abstract: true,
        domain_item_type: None,
        nillable: None,
        name_suffix: None,
        classification: ElementClassification::DimensionElement,
    },
    ClassificationRule {
        group: GroupMatch::HypercubeItem,
        period_type: PeriodType::Duration,
        is_abstract: true,
        domain_item_type: None,
        nillable: None,
        name_suffix: None,
        classification: ElementClassification::DimensionElement,
    },
    ClassificationRule {
        group: GroupMatch::Item,
        period_type: PeriodType::Duration,
        is_abstract: true,
        domain_item_type: Some(true),
        nillable: Some(true),
        name_suffix: None,
        classification: ElementClassification::DomainElement,
    },
    ClassificationRule {
        group: GroupMatch::Item,
        period_type: PeriodType::Duration,
        is_abstract: true,
        domain_item_type: Some(true),
        nillable: Some(false),
        name_suffix: None,
        classification: ElementClassification::MemberElement,
    },
    ClassificationRule {
        group: GroupMatch::Item,
        period_type: PeriodType::Duration,
        is_abstract: true,
        domain_item_type: None,
        nillable: None,
        name_suffix: Some("LineItems"),
        classification: ElementClassification::LineItemsElement,
    },
    ClassificationRule {
        group: GroupMatch::Item,
        period_type: PeriodType::Duration,
        is_abstract: true,
        domain_item_type: None,
        nillable: None,
        name_suffix: None,
        classification: ElementClassification::ListItemsElement,
    },
];

pub fn classify_element(concept: &ConceptInfo) -> Option<ElementClassification> {
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| rule.matches(concept))
        .map(|rule| rule.classification)
}

pub fn is_numeric_type(type_name: Option<&str>) -> bool {
    type_name.is_some_and(|t| NUMERIC_ITEM_TYPES.contains(&type_local_name(t)))
}

pub fn is_textblock(concept: &ConceptInfo) -> bool {
    concept
        .type_name
        .as_deref()
        .is_some_and(|t| type_local_name(t) == TEXT_BLOCK_ITEM_TYPE)
        || concept.qname.local_name.ends_with("TextBlock")
}

fn element_node(identifier: Identifier, concept: &ConceptInfo) -> ElementNode {
    ElementNode {
        identifier,
        uri: concept.qname.uri(),
        qname: concept.qname.prefixed(),
        namespace: concept.qname.namespace.clone(),
        name: concept.qname.local_name.clone(),
        classification: classify_element(concept),
        substitution_group: concept.substitution_group.as_str().to_string(),
        period_type: concept.period_type.map(|p| p.as_str().to_string()),
        balance: concept.balance.clone(),
        item_type: concept.type_name.clone(),
        is_abstract: concept.is_abstract,
        is_nillable: concept.nillable,
        is_numeric: is_numeric_type(concept.type_name.as_deref()),
        is_textblock: is_textblock(concept),
    }
}

/// Resolves concepts against one filing and materializes their elements.
pub struct ConceptResolver<'a, F: ?Sized> {
    filing: &'a F,
    options: &'a EngineOptions,
}

impl<'a, F: ParsedFiling + ?Sized> ConceptResolver<'a, F> {
    pub fn new(filing: &'a F, options: &'a EngineOptions) -> Self {
        Self { filing, options }
    }

    /// Returns the element's identifier. Labels and references are created
    /// only together with the element, so they appear once per pass however
    /// many facts or arcs reference the concept.
    pub fn element(&self, tables: &mut GraphTables, qname: &QName) -> Identifier {
        let key = element_key(&qname.uri());
        if let Some(id) = tables.elements.lookup(&key) {
            return id;
        }

        let undeclared;
        let concept = match self.filing.concept(qname) {
            Some(concept) => concept,
            None => {
                undeclared = ConceptInfo::undeclared(qname.clone());
                &undeclared
            }
        };
        let element_id = tables
            .elements
            .insert_with(&key, |identifier| element_node(identifier, concept))
            .id;
        self.labels(tables, element_id, concept);
        self.references(tables, element_id, concept);
        element_id
    }

    fn labels(&self, tables: &mut GraphTables, element_id: Identifier, concept: &ConceptInfo) {
        let element_uri = concept.qname.uri();
        for label in &concept.labels {
            if !self.options.accepts_label_language(&label.lang) {
                continue;
            }
            let key = label_key(&element_uri, &label.role, &label.lang);
            let inserted = tables.labels.insert_with(&key, |identifier| LabelNode {
                identifier,
                element_uri: element_uri.clone(),
                role: label.role.clone(),
                lang: label.lang.clone(),
                text: label.text.clone(),
            });
            if inserted.is_new {
                tables.link(RelationshipKind::ElementHasLabel, element_id, inserted.id);
            }
        }
    }

    fn references(&self, tables: &mut GraphTables, element_id: Identifier, concept: &ConceptInfo) {
        let element_uri = concept.qname.uri();
        for reference in &concept.references {
            let canonical_parts = reference
                .parts
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("\u{1f}");
            let key = reference_key(&element_uri, &reference.role, &canonical_parts);
            let inserted = tables
                .references
                .insert_with(&key, |identifier| ReferenceNode {
                    identifier,
                    element_uri: element_uri.clone(),
                    role: reference.role.clone(),
                    parts: reference.parts.clone(),
                });
            if inserted.is_new {
                tables.link(RelationshipKind::ElementHasReference, element_id, inserted.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use filing_model::{FilingDocument, LabelInput, ReferenceInput};

    use super::*;

    fn concept(
        group: SubstitutionGroup,
        period: PeriodType,
        is_abstract: bool,
        type_name: &str,
        nillable: bool,
        name: &str,
    ) -> ConceptInfo {
        ConceptInfo {
            substitution_group: group,
            period_type: Some(period),
            is_abstract,
            nillable,
            type_name: Some(type_name.to_string()),
            ..ConceptInfo::undeclared(QName::new("http://acme.com/2023", "acme", name))
        }
    }

    #[test]
    fn decision_table() {
        use ElementClassification::{
            DimensionElement, DomainElement, HypercubeElement, LineItemsElement,
            ListItemsElement, MemberElement,
        };
        use SubstitutionGroup::{HypercubeItem, Item};

        let cases = [
            (
                concept(HypercubeItem, PeriodType::Duration, true, "stringItemType", true, "SegmentTable"),
                Some(HypercubeElement),
            ),
            (
                concept(HypercubeItem, PeriodType::Instant, true, "stringItemType", true, "SegmentTable"),
                Some(DimensionElement),
            ),
            (
                concept(Item, PeriodType::Duration, true, "dtr-types:domainItemType", true, "SegmentDomain"),
                Some(DomainElement),
            ),
            (
                concept(Item, PeriodType::Duration, true, "domainItemType", false, "WidgetsMember"),
                Some(MemberElement),
            ),
            (
                concept(Item, PeriodType::Duration, true, "stringItemType", true, "StatementLineItems"),
                Some(LineItemsElement),
            ),
            (
                concept(Item, PeriodType::Duration, true, "stringItemType", true, "StatementAbstract"),
                Some(ListItemsElement),
            ),
            (
                concept(Item, PeriodType::Duration, false, "monetaryItemType", true, "Revenues"),
                None,
            ),
            (
                concept(Item, PeriodType::Instant, true, "stringItemType", true, "BalanceAbstract"),
                None,
            ),
        ];
        for (concept, expected) in cases {
            assert_eq!(
                classify_element(&concept),
                expected,
                "{}",
                concept.qname.local_name
            );
        }
    }

    #[test]
    fn third_rule_is_shadowed_by_first() {
        let hypercube = concept(
            SubstitutionGroup::HypercubeItem,
            PeriodType::Duration,
            true,
            "stringItemType",
            true,
            "Table",
        );
        assert!(CLASSIFICATION_RULES[0].matches(&hypercube));
        assert!(CLASSIFICATION_RULES[2].matches(&hypercube));
        assert_eq!(
            classify_element(&hypercube),
            Some(ElementClassification::HypercubeElement)
        );
    }

    #[test]
    fn numeric_and_textblock_flags() {
        assert!(is_numeric_type(Some("xbrli:monetaryItemType")));
        assert!(is_numeric_type(Some("num:perShareItemType")));
        assert!(!is_numeric_type(Some("xbrli:stringItemType")));
        assert!(!is_numeric_type(None));

        let policy = concept(
            SubstitutionGroup::Item,
            PeriodType::Duration,
            false,
            "dtr-types:textBlockItemType",
            true,
            "AccountingPolicies",
        );
        assert!(is_textblock(&policy));
    }

    fn revenues_document() -> FilingDocument {
        let qname = QName::new("http://fasb.org/us-gaap/2023", "us-gaap", "Revenues");
        let mut parts = std::collections::BTreeMap::new();
        parts.insert("Topic".to_string(), "606".to_string());
        let mut doc = FilingDocument::default();
        doc.concepts = vec![ConceptInfo {
            labels: vec![
                LabelInput {
                    role: "http://www.xbrl.org/2003/role/label".to_string(),
                    lang: "en-US".to_string(),
                    text: "Revenues".to_string(),
                },
                LabelInput {
                    role: "http://www.xbrl.org/2003/role/label".to_string(),
                    lang: "de".to_string(),
                    text: "Umsatz".to_string(),
                },
            ],
            references: vec![ReferenceInput {
                role: "http://www.xbrl.org/2003/role/disclosureRef".to_string(),
                parts,
            }],
            ..ConceptInfo::undeclared(qname)
        }];
        doc
    }

    #[test]
    fn labels_and_references_created_once() {
        let doc = revenues_document();
        let options = EngineOptions::default();
        let resolver = ConceptResolver::new(&doc, &options);
        let mut tables = GraphTables::new();
        let qname = doc.concepts[0].qname.clone();

        let a = resolver.element(&mut tables, &qname);
        let b = resolver.element(&mut tables, &qname);
        assert_eq!(a, b);
        assert_eq!(tables.elements.len(), 1);
        assert_eq!(tables.labels.len(), 2);
        assert_eq!(tables.references.len(), 1);
        assert_eq!(tables.edge_count(RelationshipKind::ElementHasLabel), 2);
        assert_eq!(tables.edge_count(RelationshipKind::ElementHasReference), 1);
    }

    #[test]
    fn label_language_filter_applies() {
        let doc = revenues_document();
        let options = EngineOptions::default().with_label_language("en");
        let resolver = ConceptResolver::new(&doc, &options);
        let mut tables = GraphTables::new();
        resolver.element(&mut tables, &doc.concepts[0].qname);
        assert_eq!(tables.labels.len(), 1);
        assert_eq!(
            tables.labels.iter().next().map(|l| l.text.as_str()),
            Some("Revenues")
        );
    }

    #[test]
    fn undeclared_concept_still_materializes() {
        let doc = FilingDocument::default();
        let options = EngineOptions::default();
        let resolver = ConceptResolver::new(&doc, &options);
        let mut tables = GraphTables::new();
        let qname = QName::new("http://acme.com/2023", "acme", "Custom");
        let id = resolver.element(&mut tables, &qname);
        let element = tables.elements.get(id).unwrap();
        assert_eq!(element.uri, "http://acme.com/2023#Custom");
        assert_eq!(element.classification, None);
        assert!(tables.labels.is_empty());
    }
}
