use std::sync::Arc;

use filing_model::{
    CellValue, FactType, FilingDocument, FilingMetadata, Identifier, RelationshipKind, ValueType,
};
use filing_transform::{
    BlobError, BlobStore, EngineOptions, FilingGraph, MemoryBlobStore, TransformEngine,
};
use serde_json::{Value, json};

const GAAP: &str = "http://fasb.org/us-gaap/2023";
const CIK_SCHEME: &str = "http://www.sec.gov/CIK";

fn gaap(name: &str) -> Value {
    json!({"namespace": GAAP, "prefix": "us-gaap", "local_name": name})
}

fn usd() -> Value {
    json!({"id": "usd", "measure": {"namespace": "http://www.xbrl.org/2003/iso4217", "prefix": "iso4217", "local_name": "USD"}})
}

fn context(id: &str, cik: &str, period: Value) -> Value {
    json!({"id": id, "entity": {"scheme": CIK_SCHEME, "value": cik}, "period": period})
}

fn fact(concept: &str, context: &str, unit: Option<&str>, value: &str) -> Value {
    json!({"concept": gaap(concept), "context_ref": context, "unit_ref": unit, "value": value})
}

/// One instant and one duration numeric fact.
fn simple_filing() -> Value {
    json!({
        "document_uri": "https://www.sec.gov/Archives/acme-20231231.htm",
        "taxonomies": [{"namespace": GAAP, "prefix": "us-gaap"}],
        "concepts": [
            {"qname": gaap("Assets"), "period_type": "instant", "type_name": "monetaryItemType",
             "labels": [{"role": "http://www.xbrl.org/2003/role/label", "lang": "en-US", "text": "Assets"}]},
            {"qname": gaap("Revenues"), "period_type": "duration", "type_name": "monetaryItemType",
             "references": [{"role": "http://www.xbrl.org/2003/role/disclosureRef",
                             "parts": {"Publisher": "FASB", "Topic": "606"}}]}
        ],
        "contexts": [
            context("i2023", "0000000042", json!({"type": "instant", "date": "2024-01-01"})),
            context("fy2023", "0000000042", json!({"type": "start_end", "start": "2023-01-01", "end": "2024-01-01"}))
        ],
        "units": [usd()],
        "facts": [
            fact("Assets", "i2023", Some("usd"), "5000"),
            fact("Revenues", "fy2023", Some("usd"), "1000000")
        ]
    })
}

fn document(value: &Value) -> FilingDocument {
    FilingDocument::from_json(&value.to_string()).unwrap()
}

fn metadata(accession: &str) -> FilingMetadata {
    FilingMetadata {
        cik: Some("0000000042".to_string()),
        entity_name: Some("Acme Corp".to_string()),
        accession_number: Some(accession.to_string()),
        form_type: Some("10-K".to_string()),
        ..FilingMetadata::default()
    }
}

fn run(value: &Value, accession: &str) -> FilingGraph {
    TransformEngine::new(EngineOptions::default()).process(&document(value), &metadata(accession))
}

fn edges_from(graph: &FilingGraph, kind: RelationshipKind, from: Identifier) -> usize {
    graph
        .tables
        .edges(kind)
        .iter()
        .filter(|edge| edge.from == from)
        .count()
}

#[test]
fn round_trip_counts() {
    let graph = run(&simple_filing(), "0000000042-24-000001");

    assert!(!graph.failed);
    assert_eq!(graph.tables.entities.len(), 1);
    assert_eq!(graph.tables.reports.len(), 1);
    assert_eq!(graph.tables.facts.len(), 2);
    assert_eq!(graph.tables.periods.len(), 2);
    assert_eq!(graph.tables.units.len(), 1);
    for fact in graph.tables.facts.iter() {
        assert_eq!(edges_from(&graph, RelationshipKind::FactHasPeriod, fact.identifier), 1);
        assert_eq!(edges_from(&graph, RelationshipKind::FactHasElement, fact.identifier), 1);
        assert_eq!(edges_from(&graph, RelationshipKind::FactHasUnit, fact.identifier), 1);
        assert_eq!(fact.fact_type, FactType::Numeric);
    }

    let report = graph.report().unwrap();
    assert!(report.processed);
    assert!(!report.failed);
    assert_eq!(report.fact_count, 2);
    assert_eq!(graph.tables.fact_sets.iter().next().unwrap().fact_count, 2);
    assert_eq!(graph.tables.edge_count(RelationshipKind::ReportHasFact), 2);
    assert_eq!(graph.tables.edge_count(RelationshipKind::FactSetHasFact), 2);
    assert_eq!(graph.tables.edge_count(RelationshipKind::EntityHasReport), 1);
    assert_eq!(graph.tables.edge_count(RelationshipKind::ReportUsesTaxonomy), 1);
    assert_eq!(graph.tables.labels.len(), 1);
    assert_eq!(graph.tables.references.len(), 1);
    assert_eq!(graph.cik.as_deref(), Some("42"));

    let entity = graph.tables.entities.iter().next().unwrap();
    assert!(entity.is_parent);
    assert_eq!(entity.name.as_deref(), Some("Acme Corp"));
    assert_eq!(entity.scheme.as_deref(), Some(CIK_SCHEME));
}

#[test]
fn processing_is_deterministic() {
    let first = run(&simple_filing(), "acc-1");
    let second = run(&simple_filing(), "acc-1");
    assert_eq!(first.to_table_rows(), second.to_table_rows());
}

#[test]
fn global_kinds_converge_across_filings() {
    let first = run(&simple_filing(), "acc-1");
    let second = run(&simple_filing(), "acc-2");

    let ids = |graph: &FilingGraph| {
        let mut ids: Vec<Identifier> = graph.tables.units.iter().map(|u| u.identifier).collect();
        ids.extend(graph.tables.periods.iter().map(|p| p.identifier));
        ids.extend(graph.tables.elements.iter().map(|e| e.identifier));
        ids.extend(graph.tables.labels.iter().map(|l| l.identifier));
        ids.extend(graph.tables.references.iter().map(|r| r.identifier));
        ids.extend(graph.tables.entities.iter().map(|e| e.identifier));
        ids
    };
    assert_eq!(ids(&first), ids(&second));

    let facts = |graph: &FilingGraph| -> Vec<Identifier> {
        graph.tables.facts.iter().map(|f| f.identifier).collect()
    };
    assert!(facts(&first).iter().all(|id| !facts(&second).contains(id)));
    assert_ne!(
        first.report().unwrap().identifier,
        second.report().unwrap().identifier
    );
}

#[test]
fn decimals_scale_and_garbage_stays_null() {
    let mut filing = simple_filing();
    filing["facts"] = json!([
        {"concept": gaap("Revenues"), "context_ref": "fy2023", "unit_ref": "usd", "value": "1000000", "decimals": "-6"},
        {"concept": gaap("Assets"), "context_ref": "i2023", "unit_ref": "usd", "value": "42.5"},
        {"concept": gaap("Liabilities"), "context_ref": "i2023", "unit_ref": "usd", "value": "not-a-number"},
        {"concept": gaap("Description"), "context_ref": "i2023", "value": "plain text"}
    ]);
    let graph = run(&filing, "acc-1");
    let numeric: Vec<Option<f64>> = graph.tables.facts.iter().map(|f| f.numeric_value).collect();
    assert_eq!(numeric, vec![Some(1.0), Some(42.5), None, None]);
    assert_eq!(graph.stats.numeric_parse_failures, 1);

    let types: Vec<FactType> = graph.tables.facts.iter().map(|f| f.fact_type).collect();
    assert_eq!(
        types,
        vec![FactType::Numeric, FactType::Numeric, FactType::Numeric, FactType::Nonnumeric]
    );
    assert_eq!(graph.tables.edge_count(RelationshipKind::FactHasUnit), 3);
}

#[test]
fn duplicate_facts_are_skipped() {
    let mut filing = simple_filing();
    filing["facts"] = json!([
        fact("Assets", "i2023", Some("usd"), "5000"),
        fact("Assets", "i2023", Some("usd"), "5000"),
        fact("Assets", "i2023", Some("usd"), "6000")
    ]);
    let graph = run(&filing, "acc-1");
    assert_eq!(graph.tables.facts.len(), 2);
    assert_eq!(graph.stats.duplicate_facts, 1);
    assert_eq!(graph.stats.facts_seen, 3);
    assert_eq!(graph.tables.edge_count(RelationshipKind::FactHasPeriod), 2);
    assert_eq!(graph.tables.labels.len(), 1);
    assert_eq!(graph.tables.edge_count(RelationshipKind::ElementHasLabel), 1);
}

#[test]
fn instant_period_shifts_end_date() {
    let graph = run(&simple_filing(), "acc-1");
    let instant = graph
        .tables
        .periods
        .iter()
        .find(|p| p.uri == "period:instant:2024-01-01")
        .unwrap();
    assert_eq!(instant.end_date.unwrap().to_string(), "2023-12-31");
    assert_eq!(instant.fiscal_quarter.as_deref(), Some("Q4"));
    assert!(instant.is_annual);

    let annual = graph
        .tables
        .periods
        .iter()
        .find(|p| p.uri == "period:duration:2023-01-01/2024-01-01")
        .unwrap();
    assert_eq!(annual.days_in_period, Some(365));
    assert!(annual.is_annual);
    assert_eq!(annual.fiscal_year, Some(2023));
}

#[test]
fn missing_period_is_scoped_to_report() {
    let mut filing = simple_filing();
    filing["contexts"] = json!([{"id": "nop", "entity": {"scheme": CIK_SCHEME, "value": "42"}}]);
    filing["facts"] = json!([fact("Assets", "nop", Some("usd"), "1")]);

    let first = run(&filing, "acc-1");
    let second = run(&filing, "acc-2");
    let period = |graph: &FilingGraph| graph.tables.periods.iter().next().unwrap().clone();
    assert_eq!(first.stats.unknown_periods, 1);
    assert!(period(&first).uri.starts_with("period:unknown:"));
    assert_ne!(period(&first).identifier, period(&second).identifier);
}

#[test]
fn dimensions_link_axis_and_member_elements_once() {
    let mut filing = simple_filing();
    filing["contexts"] = json!([
        {"id": "seg", "entity": {"scheme": CIK_SCHEME, "value": "42"},
         "period": {"type": "instant", "date": "2024-01-01"},
         "dimensions": [
            {"axis": gaap("StatementBusinessSegmentsAxis"), "member": {"explicit": gaap("WidgetsMember")}, "container": "segment"},
            {"axis": gaap("LegalEntityAxis"), "member": {"typed": "Sub-1"}, "container": "scenario"}
         ]}
    ]);
    filing["facts"] = json!([
        fact("Assets", "seg", Some("usd"), "1"),
        fact("Liabilities", "seg", Some("usd"), "2")
    ]);
    let graph = run(&filing, "acc-1");

    assert_eq!(graph.tables.dimensions.len(), 2);
    assert_eq!(graph.tables.edge_count(RelationshipKind::FactHasDimension), 4);
    assert_eq!(graph.tables.edge_count(RelationshipKind::FactDimensionAxisElement), 2);
    assert_eq!(graph.tables.edge_count(RelationshipKind::FactDimensionMemberElement), 1);
    // Assets, Liabilities, two axes and one member.
    assert_eq!(graph.tables.elements.len(), 5);

    let containers: Vec<&CellValue> = graph
        .tables
        .edges(RelationshipKind::FactHasDimension)
        .iter()
        .filter_map(|edge| edge.properties.get("context_element"))
        .collect();
    assert_eq!(containers.len(), 4);
    assert!(containers.contains(&&CellValue::from("segment")));
    assert!(containers.contains(&&CellValue::from("scenario")));
}

#[test]
fn subsidiary_context_creates_child_entity() {
    let mut filing = simple_filing();
    filing["contexts"] = json!([
        context("parent", "0000000042", json!({"type": "instant", "date": "2024-01-01"})),
        {"id": "sub", "entity": {"scheme": "http://acme.com/entities", "value": "ACME-EU"},
         "period": {"type": "instant", "date": "2024-01-01"}}
    ]);
    filing["facts"] = json!([
        fact("Assets", "parent", Some("usd"), "1"),
        fact("Assets", "sub", Some("usd"), "2")
    ]);
    let graph = run(&filing, "acc-1");

    assert_eq!(graph.tables.entities.len(), 2);
    let filer = graph.tables.entities.iter().find(|e| e.is_parent).unwrap();
    let child = graph.tables.entities.iter().find(|e| !e.is_parent).unwrap();
    assert_eq!(child.parent_entity_id, Some(filer.identifier));
    assert_eq!(child.scheme_value.as_deref(), Some("ACME-EU"));

    let flags: Vec<&CellValue> = graph
        .tables
        .edges(RelationshipKind::FactHasEntity)
        .iter()
        .filter_map(|edge| edge.properties.get("is_filer"))
        .collect();
    assert_eq!(flags, vec![&CellValue::Boolean(true), &CellValue::Boolean(false)]);
}

#[test]
fn parent_registrant_in_metadata_marks_filer_as_subsidiary() {
    let mut meta = metadata("acc-1");
    meta.parent_cik = Some("0000000007".to_string());
    let graph =
        TransformEngine::new(EngineOptions::default()).process(&document(&simple_filing()), &meta);
    let filer = graph.tables.entities.iter().next().unwrap();
    assert!(!filer.is_parent);
    assert_eq!(
        filer.parent_entity_id,
        Some(Identifier::from_semantic_key("entity:cik:7"))
    );
}

fn html_filing() -> Value {
    let mut filing = simple_filing();
    filing["facts"] = json!([
        fact("Assets", "i2023", Some("usd"), "5000"),
        fact("PolicyTextBlock", "fy2023", None, "<div><p>Revenue is recognized when earned.</p></div>")
    ]);
    filing
}

#[test]
fn markup_values_are_externalized() {
    let store = Arc::new(MemoryBlobStore::new("https://blobs.example.com"));
    let engine = TransformEngine::new(EngineOptions::default()).with_blob_store(store.clone());
    let graph = engine.process(&document(&html_filing()), &metadata("acc-1"));

    assert_eq!(graph.stats.externalized, 1);
    let external = graph
        .tables
        .facts
        .iter()
        .find(|f| f.value_type == ValueType::External)
        .unwrap();
    assert!(external.value.starts_with("https://blobs.example.com/2023/42/acc-1/"));
    assert!(external.value.ends_with(".html"));
    assert_eq!(external.content_type.as_deref(), Some("text/html"));

    let key = external.value.trim_start_matches("https://blobs.example.com/");
    let stored = store.get(key).unwrap();
    assert_eq!(stored.content_type, "text/html");
    assert!(String::from_utf8(stored.bytes).unwrap().starts_with("<div>"));

    let inline = graph
        .tables
        .facts
        .iter()
        .find(|f| f.value_type == ValueType::Inline)
        .unwrap();
    assert_eq!(inline.value, "5000");
}

#[test]
fn blob_urls_for_non_cik_filers_resolve_to_the_stored_value() {
    let lei = json!({"scheme": "http://standards.iso.org/iso/17442", "value": "HWUPKR0MPOU8FGXBT394"});
    let mut filing = html_filing();
    filing["contexts"] = json!([
        {"id": "i2023", "entity": lei, "period": {"type": "instant", "date": "2024-01-01"}},
        {"id": "fy2023", "entity": lei, "period": {"type": "start_end", "start": "2023-01-01", "end": "2024-01-01"}}
    ]);
    let meta = FilingMetadata {
        accession_number: Some("LEI/2024 #1".to_string()),
        ..FilingMetadata::default()
    };
    let store = Arc::new(MemoryBlobStore::new("https://blobs.example.com"));
    let engine = TransformEngine::new(EngineOptions::default()).with_blob_store(store.clone());
    let graph = engine.process(&document(&filing), &meta);

    assert_eq!(graph.stats.externalized, 1);
    let external = graph
        .tables
        .facts
        .iter()
        .find(|f| f.value_type == ValueType::External)
        .unwrap();
    assert!(!external.value.contains('#'));
    let key = external
        .value
        .strip_prefix("https://blobs.example.com/")
        .unwrap();
    assert!(key.starts_with("2023/HWUPKR0MPOU8FGXBT394/LEI_2024__1/"));
    let stored = store.get(key).unwrap();
    assert!(String::from_utf8(stored.bytes).unwrap().starts_with("<div>"));
}

#[test]
fn oversized_plain_values_are_externalized_as_text() {
    let store = Arc::new(MemoryBlobStore::default());
    let options = EngineOptions::default().with_externalize_threshold(16);
    let engine = TransformEngine::new(options).with_blob_store(store.clone());
    let mut filing = simple_filing();
    filing["facts"] = json!([fact("Description", "fy2023", None, "a plain value longer than sixteen bytes")]);

    let graph = engine.process(&document(&filing), &metadata("acc-1"));
    let fact = graph.tables.facts.iter().next().unwrap();
    assert_eq!(fact.value_type, ValueType::External);
    assert!(fact.value.ends_with(".txt"));
    assert_eq!(fact.content_type.as_deref(), Some("text/plain"));
    assert_eq!(store.len(), 1);
}

struct OfflineStore;

impl BlobStore for OfflineStore {
    fn put(&self, key: &str, _bytes: &[u8], _content_type: &str) -> Result<String, BlobError> {
        Err(BlobError::Rejected {
            key: key.to_string(),
            message: "offline".to_string(),
        })
    }
}

#[test]
fn upload_failure_keeps_value_inline() {
    let engine =
        TransformEngine::new(EngineOptions::default()).with_blob_store(Arc::new(OfflineStore));
    let graph = engine.process(&document(&html_filing()), &metadata("acc-1"));

    assert!(!graph.failed);
    assert_eq!(graph.stats.externalized, 0);
    assert_eq!(graph.stats.externalization_fallbacks, 1);
    assert!(graph
        .tables
        .facts
        .iter()
        .all(|f| f.value_type == ValueType::Inline && f.content_type.is_none()));
    assert!(graph.tables.facts.iter().any(|f| f.value.starts_with("<div>")));
}

#[test]
fn disabled_externalization_keeps_values_inline() {
    let store = Arc::new(MemoryBlobStore::default());
    let engine = TransformEngine::new(EngineOptions::default().with_externalization(false))
        .with_blob_store(store.clone());
    let graph = engine.process(&document(&html_filing()), &metadata("acc-1"));
    assert_eq!(graph.stats.externalized, 0);
    assert!(store.is_empty());
}

#[test]
fn nil_facts_have_empty_values() {
    let mut filing = simple_filing();
    filing["facts"] = json!([
        {"concept": gaap("Assets"), "context_ref": "i2023", "unit_ref": "usd", "value": "ignored", "is_nil": true}
    ]);
    let graph = run(&filing, "acc-1");
    let fact = graph.tables.facts.iter().next().unwrap();
    assert!(fact.is_nil);
    assert_eq!(fact.value, "");
    assert_eq!(fact.numeric_value, None);
    assert_eq!(graph.stats.numeric_parse_failures, 0);
}

#[test]
fn structures_are_built_from_networks() {
    let mut filing = simple_filing();
    filing["roles"] = json!([{"uri": "http://fasb.org/us-gaap/role/BalanceSheet", "definition": "Balance Sheet"}]);
    filing["arcs"] = json!([
        {"arcrole": "http://www.xbrl.org/2003/arcrole/parent-child",
         "linkrole": "http://fasb.org/us-gaap/role/BalanceSheet",
         "from": gaap("BalanceSheetAbstract"), "to": gaap("Assets"), "order": 1.0}
    ]);
    let graph = run(&filing, "acc-1");

    assert_eq!(graph.stats.structures, 1);
    assert_eq!(graph.stats.associations, 1);
    assert_eq!(graph.tables.edge_count(RelationshipKind::StructureHasTaxonomy), 1);
    let structure = graph.tables.structures.iter().next().unwrap();
    assert_eq!(structure.accession_number, "acc-1");
    assert_eq!(structure.definition.as_deref(), Some("Balance Sheet"));
    // Assets is shared between the fact and the association.
    assert_eq!(
        graph
            .tables
            .elements
            .iter()
            .filter(|e| e.name == "Assets")
            .count(),
        1
    );
}

#[test]
fn missing_document_yields_failed_report_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0000000042-24-000009.json");
    let engine = TransformEngine::new(EngineOptions::default());

    let graph = engine.process_path(&path);
    assert!(graph.failed);
    assert_eq!(graph.accession, "0000000042-24-000009");
    let report = graph.report().unwrap();
    assert!(report.failed);
    assert!(report.failure_reason.is_some());

    let rows = graph.to_table_rows();
    let non_empty: Vec<String> = rows
        .iter()
        .filter(|table| !table.is_empty())
        .map(|table| table.kind.to_string())
        .collect();
    assert_eq!(non_empty, vec!["Report"]);
}

#[test]
fn unparsable_document_uses_sidecar_accession() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("acme.json");
    std::fs::write(&path, "{ not json").unwrap();
    std::fs::write(
        dir.path().join("acme.meta.json"),
        r#"{"accession_number": "acc-sidecar", "form_type": "10-Q"}"#,
    )
    .unwrap();

    let graph = TransformEngine::new(EngineOptions::default()).process_path(&path);
    assert!(graph.failed);
    assert_eq!(graph.accession, "acc-sidecar");
    assert_eq!(graph.report().unwrap().form_type.as_deref(), Some("10-Q"));
}

#[test]
fn sidecar_metadata_overrides_embedded_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let mut filing = simple_filing();
    filing["metadata"] = json!({"accession_number": "acc-embedded", "cik": "42"});
    let path = dir.path().join("acme.json");
    std::fs::write(&path, filing.to_string()).unwrap();

    let engine = TransformEngine::new(EngineOptions::default());
    assert_eq!(engine.process_path(&path).accession, "acc-embedded");

    std::fs::write(
        dir.path().join("acme.meta.json"),
        r#"{"accession_number": "acc-sidecar"}"#,
    )
    .unwrap();
    let graph = engine.process_path(&path);
    assert!(!graph.failed);
    assert_eq!(graph.accession, "acc-sidecar");
    assert_eq!(graph.tables.facts.len(), 2);
}

#[test]
fn unprefixed_concept_references_resolve_declared_concepts() {
    let mut filing = simple_filing();
    filing["facts"] = json!([
        {"concept": {"namespace": GAAP, "local_name": "Assets"}, "context_ref": "i2023", "unit_ref": "usd", "value": "5000"},
        {"concept": {"namespace": GAAP, "prefix": "gaap", "local_name": "Assets"}, "context_ref": "i2023", "unit_ref": "usd", "value": "6000"},
        fact("Assets", "i2023", Some("usd"), "7000")
    ]);
    let graph = run(&filing, "acc-1");

    assert_eq!(graph.tables.facts.len(), 3);
    assert_eq!(graph.tables.elements.len(), 1);
    let element = graph.tables.elements.iter().next().unwrap();
    assert_eq!(element.qname, "us-gaap:Assets");
    assert_eq!(element.period_type.as_deref(), Some("instant"));
    assert!(element.is_numeric);
    assert_eq!(graph.tables.labels.len(), 1);
    assert_eq!(graph.tables.edge_count(RelationshipKind::ElementHasLabel), 1);
    for fact in graph.tables.facts.iter() {
        assert_eq!(fact.concept, "us-gaap:Assets");
    }
}
