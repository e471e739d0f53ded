//! One synchronous transformation pass per filing.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Datelike;
use filing_common::redact_value;
use filing_model::{
    Edge, EntityIdentifier, EntityNode, FactInput, FactNode, FactSetNode, FactType,
    FilingDocument, FilingMetadata, Identifier, ParsedFiling, PeriodKind, RelationshipKind,
    ReportNode, TableRows, TaxonomyNode, TaxonomyRef, ValueType,
};
use tracing::{debug, info, info_span, warn};

use crate::arena::GraphTables;
use crate::blob::BlobStore;
use crate::concept::ConceptResolver;
use crate::dimension::materialize_dimension;
use crate::error::Result;
use crate::externalize::ValueExternalizer;
use crate::fact::{NumericValue, numeric_value};
use crate::identity::{
    cik_entity_key, entity_key, fact_key, fact_set_key, id, identifier_cik, report_key,
    taxonomy_key,
};
use crate::options::EngineOptions;
use crate::period::{describe_period, materialize_period};
use crate::structure::build_structures;
use crate::unit::materialize_unit;

/// Counters collected during one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub facts_seen: usize,
    pub facts_emitted: usize,
    pub duplicate_facts: usize,
    pub numeric_parse_failures: usize,
    pub unknown_periods: usize,
    pub externalized: usize,
    pub externalization_fallbacks: usize,
    pub structures: usize,
    pub associations: usize,
    pub duration_ms: u64,
}

/// Every table produced for one filing.
#[derive(Debug, Clone)]
pub struct FilingGraph {
    pub accession: String,
    pub cik: Option<String>,
    pub tables: GraphTables,
    pub stats: PassStats,
    pub failed: bool,
}

impl FilingGraph {
    /// A graph holding only the failed Report marker.
    pub fn failed(accession: &str, metadata: &FilingMetadata, reason: impl Into<String>) -> Self {
        let mut tables = GraphTables::new();
        tables
            .reports
            .insert_with(&report_key(accession), |identifier| ReportNode {
                failed: true,
                processed: false,
                failure_reason: Some(reason.into()),
                ..report_node(identifier, accession, metadata)
            });
        Self {
            accession: accession.to_string(),
            cik: metadata.normalized_cik(),
            tables,
            stats: PassStats::default(),
            failed: true,
        }
    }

    pub fn report(&self) -> Option<&ReportNode> {
        self.tables.reports.iter().next()
    }

    pub fn to_table_rows(&self) -> Vec<TableRows> {
        self.tables.to_table_rows()
    }
}

fn report_node(identifier: Identifier, accession: &str, metadata: &FilingMetadata) -> ReportNode {
    ReportNode {
        identifier,
        accession_number: accession.to_string(),
        form_type: metadata.form_type.clone(),
        filing_date: metadata.filing_date,
        report_date: metadata.report_date,
        document_url: metadata.document_url.clone(),
        fact_count: 0,
        failed: false,
        processed: false,
        failure_reason: None,
    }
}

/// Accession from metadata, else derived from the document URI.
pub fn resolve_accession(metadata: &FilingMetadata, document_uri: Option<&str>) -> String {
    if let Some(accession) = metadata
        .accession_number
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
    {
        return accession.to_string();
    }
    match document_uri {
        Some(uri) => format!("doc-{}", id(uri).short_hex(16)),
        None => "unknown-filing".to_string(),
    }
}

/// `<dir>/<stem>.meta.json` beside a filing document.
pub fn sidecar_metadata_path(document: &Path) -> Option<PathBuf> {
    let stem = document.file_stem()?.to_str()?;
    Some(document.with_file_name(format!("{stem}.meta.json")))
}

/// Sidecar metadata when present and readable. A malformed sidecar is
/// reported and ignored.
fn load_sidecar(document: &Path) -> Option<FilingMetadata> {
    let path = sidecar_metadata_path(document)?;
    if !path.is_file() {
        return None;
    }
    match FilingMetadata::load(&path) {
        Ok(metadata) => Some(metadata),
        Err(error) => {
            warn!(path = %path.display(), %error, "ignoring unreadable filing metadata");
            None
        }
    }
}

/// Loads a filing document and its metadata. The sidecar wins over
/// metadata embedded in the document.
pub fn load_source(path: &Path) -> Result<(FilingDocument, FilingMetadata)> {
    let mut document = FilingDocument::load(path)?;
    let metadata = load_sidecar(path)
        .or_else(|| document.metadata.take())
        .unwrap_or_default();
    Ok((document, metadata))
}

/// Turns parsed filings into graph tables.
pub struct TransformEngine {
    options: EngineOptions,
    blob_store: Option<Arc<dyn BlobStore>>,
}

impl TransformEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            blob_store: None,
        }
    }

    pub fn with_blob_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.blob_store = Some(store);
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Processes the filing stored at `path`. An unreadable document yields
    /// a failed graph rather than an error.
    pub fn process_path(&self, path: &Path) -> FilingGraph {
        match load_source(path) {
            Ok((document, metadata)) => self.process(&document, &metadata),
            Err(error) => {
                let metadata = load_sidecar(path).unwrap_or_default();
                let accession = metadata
                    .accession_number
                    .clone()
                    .or_else(|| {
                        path.file_stem()
                            .and_then(|s| s.to_str())
                            .map(str::to_string)
                    })
                    .unwrap_or_else(|| "unknown-filing".to_string());
                warn!(path = %path.display(), %accession, %error, "filing source unavailable");
                FilingGraph::failed(&accession, &metadata, error.to_string())
            }
        }
    }

    pub fn process<F: ParsedFiling + ?Sized>(
        &self,
        filing: &F,
        metadata: &FilingMetadata,
    ) -> FilingGraph {
        let started = Instant::now();
        let accession = resolve_accession(metadata, filing.document_uri());
        let span = info_span!("filing", accession = %accession);
        let _guard = span.enter();

        let mut pass = FilingPass::new(self, filing, metadata, accession);
        pass.seed();
        pass.taxonomies();
        pass.facts();
        pass.flush();
        pass.structures();
        let mut graph = pass.finish();
        graph.stats.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            facts = graph.stats.facts_emitted,
            duplicates = graph.stats.duplicate_facts,
            externalized = graph.stats.externalized,
            structures = graph.stats.structures,
            associations = graph.stats.associations,
            edges = graph.tables.total_edges(),
            duration_ms = graph.stats.duration_ms,
            "filing processed"
        );
        graph
    }
}

struct FilingPass<'a, F: ?Sized> {
    filing: &'a F,
    metadata: &'a FilingMetadata,
    options: &'a EngineOptions,
    concepts: ConceptResolver<'a, F>,
    externalizer: ValueExternalizer,
    tables: GraphTables,
    stats: PassStats,
    accession: String,
    filer_key: String,
    storage_entity: String,
    filer_id: Identifier,
    report_id: Identifier,
    fact_set_id: Identifier,
}

impl<'a, F: ParsedFiling + ?Sized> FilingPass<'a, F> {
    fn new(
        engine: &'a TransformEngine,
        filing: &'a F,
        metadata: &'a FilingMetadata,
        accession: String,
    ) -> Self {
        let filer_key = filer_key(filing, metadata, &accession);
        let storage_entity = storage_entity(filing, metadata);
        Self {
            filing,
            metadata,
            options: &engine.options,
            concepts: ConceptResolver::new(filing, &engine.options),
            externalizer: ValueExternalizer::new(engine.blob_store.clone(), &engine.options),
            tables: GraphTables::new(),
            stats: PassStats::default(),
            filer_id: id(&filer_key),
            report_id: id(&report_key(&accession)),
            fact_set_id: id(&fact_set_key(&accession)),
            filer_key,
            storage_entity,
            accession,
        }
    }

    fn seed(&mut self) {
        let metadata = self.metadata;
        let accession = self.accession.clone();
        self.tables
            .reports
            .insert_with(&report_key(&accession), |identifier| {
                report_node(identifier, &accession, metadata)
            });

        let context_entity = self
            .filing
            .facts()
            .next()
            .and_then(|fact| self.filing.entity(fact));
        let parent_entity_id = metadata
            .parent_cik
            .as_deref()
            .and_then(filing_model::normalize_cik)
            .map(|cik| id(&cik_entity_key(&cik)));
        self.tables
            .entities
            .insert_with(&self.filer_key, |identifier| EntityNode {
                identifier,
                cik: metadata
                    .normalized_cik()
                    .or_else(|| context_entity.as_ref().and_then(identifier_cik)),
                name: metadata.entity_name.clone(),
                ticker: metadata.ticker.clone(),
                exchange: metadata.exchange.clone(),
                sic: metadata.sic.clone(),
                state_of_incorporation: metadata.state_of_incorporation.clone(),
                fiscal_year_end: metadata.fiscal_year_end.clone(),
                scheme: context_entity.as_ref().map(|e| e.scheme.clone()),
                scheme_value: context_entity.as_ref().map(|e| e.value.clone()),
                is_parent: parent_entity_id.is_none(),
                parent_entity_id,
            });

        self.tables
            .fact_sets
            .insert_with(&fact_set_key(&accession), |identifier| FactSetNode {
                identifier,
                accession_number: accession.clone(),
                fact_count: 0,
            });

        self.tables
            .link(RelationshipKind::EntityHasReport, self.filer_id, self.report_id);
        self.tables
            .link(RelationshipKind::ReportHasFactSet, self.report_id, self.fact_set_id);
    }

    fn taxonomies(&mut self) {
        for taxonomy in self.filing.taxonomies() {
            if taxonomy.namespace.trim().is_empty() {
                continue;
            }
            let inserted = self
                .tables
                .taxonomies
                .insert_with(&taxonomy_key(&taxonomy.namespace), |identifier| {
                    taxonomy_node(identifier, &taxonomy)
                });
            self.tables
                .link(RelationshipKind::ReportUsesTaxonomy, self.report_id, inserted.id);
        }
    }

    fn facts(&mut self) {
        let filing = self.filing;
        for fact in filing.facts() {
            self.stats.facts_seen += 1;
            self.fact(fact);
        }
    }

    fn fact(&mut self, fact: &FactInput) {
        let concept_uri = fact.concept.uri();
        let value = if fact.is_nil { "" } else { fact.value.as_str() };
        let key = fact_key(
            &self.accession,
            &concept_uri,
            &fact.context_ref,
            fact.unit_ref.as_deref(),
            value,
        );
        if self.tables.facts.contains_key(&key) {
            self.stats.duplicate_facts += 1;
            debug!(concept = %concept_uri, context = %fact.context_ref, "skipping duplicate fact");
            return;
        }
        let fact_id = id(&key);

        let unit = self.filing.unit(fact);
        let numeric = if fact.is_nil {
            NumericValue::NotNumeric
        } else {
            numeric_value(value, fact.decimals.as_deref(), unit.is_some())
        };
        if numeric == NumericValue::Unparsable {
            self.stats.numeric_parse_failures += 1;
            warn!(
                concept = %concept_uri,
                value = redact_value(value),
                "numeric fact value does not parse; storing without numeric value"
            );
        }

        let period = describe_period(self.filing.period(fact).as_ref(), self.report_id);
        if period.period_type == PeriodKind::Unknown {
            self.stats.unknown_periods += 1;
            warn!(concept = %concept_uri, context = %fact.context_ref, "fact has no resolvable period");
        }
        let fiscal_year = period
            .fiscal_year
            .or_else(|| self.metadata.report_date.map(|d| d.year()));

        let queued = match self.externalizer.decide(value) {
            Some(kind) => match self.externalizer.enqueue(
                fact_id,
                value,
                kind,
                fiscal_year,
                &self.storage_entity,
                &self.accession,
            ) {
                Ok(()) => true,
                Err(error) => {
                    self.stats.externalization_fallbacks += 1;
                    warn!(concept = %concept_uri, %error, "keeping value inline");
                    false
                }
            },
            None => false,
        };
        if queued {
            debug!(concept = %concept_uri, "queued value for externalization");
        }

        let element_id = self.concepts.element(&mut self.tables, &fact.concept);
        let concept = self
            .filing
            .concept(&fact.concept)
            .map_or_else(|| fact.concept.prefixed(), |declared| declared.qname.prefixed());
        self.tables.facts.insert_with(&key, |identifier| FactNode {
            identifier,
            concept,
            concept_uri,
            source_id: fact.id.clone(),
            context_ref: fact.context_ref.clone(),
            unit_ref: fact.unit_ref.clone(),
            value: value.to_string(),
            numeric_value: numeric.value(),
            decimals: fact.decimals.clone(),
            fact_type: if unit.is_some() {
                FactType::Numeric
            } else {
                FactType::Nonnumeric
            },
            value_type: ValueType::Inline,
            content_type: None,
            is_nil: fact.is_nil,
        });
        self.stats.facts_emitted += 1;

        let tables = &mut self.tables;
        tables.link(RelationshipKind::ReportHasFact, self.report_id, fact_id);
        tables.link(RelationshipKind::FactSetHasFact, self.fact_set_id, fact_id);
        if let Some(unit) = &unit {
            let unit_id = materialize_unit(&mut tables.units, unit);
            tables.link(RelationshipKind::FactHasUnit, fact_id, unit_id);
        }
        let period_id = materialize_period(&mut tables.periods, period);
        tables.link(RelationshipKind::FactHasPeriod, fact_id, period_id);
        tables.link(RelationshipKind::FactHasElement, fact_id, element_id);

        let (entity_id, is_filer) = self.fact_entity(self.filing.entity(fact).as_ref());
        self.tables.push_edge(
            Edge::new(RelationshipKind::FactHasEntity, fact_id, entity_id)
                .with_property("is_filer", is_filer),
        );

        for dimension in self.filing.dimensions(fact) {
            let dimension_id = materialize_dimension(&mut self.tables, &self.concepts, &dimension);
            self.tables.push_edge(
                Edge::new(RelationshipKind::FactHasDimension, fact_id, dimension_id)
                    .with_property("context_element", dimension.container.as_str()),
            );
        }
    }

    /// The filer, or a subsidiary entity when the context names someone else.
    fn fact_entity(&mut self, entity: Option<&EntityIdentifier>) -> (Identifier, bool) {
        let Some(entity) = entity else {
            return (self.filer_id, true);
        };
        let key = entity_key(entity);
        if key == self.filer_key {
            return (self.filer_id, true);
        }
        let filer_id = self.filer_id;
        let inserted = self.tables.entities.insert_with(&key, |identifier| EntityNode {
            identifier,
            cik: identifier_cik(entity),
            name: None,
            ticker: None,
            exchange: None,
            sic: None,
            state_of_incorporation: None,
            fiscal_year_end: None,
            scheme: Some(entity.scheme.clone()),
            scheme_value: Some(entity.value.clone()),
            is_parent: false,
            parent_entity_id: Some(filer_id),
        });
        if inserted.is_new {
            debug!(entity = %key, "subsidiary entity");
        }
        (inserted.id, false)
    }

    fn flush(&mut self) {
        for outcome in self.externalizer.flush() {
            match outcome.result {
                Ok(external) => {
                    if let Some(fact) = self.tables.facts.get_mut(outcome.fact_id) {
                        fact.value = external.url;
                        fact.value_type = ValueType::External;
                        fact.content_type = Some(external.content_type);
                        self.stats.externalized += 1;
                    }
                }
                Err(_) => self.stats.externalization_fallbacks += 1,
            }
        }
    }

    fn structures(&mut self) {
        let stats = build_structures(
            &mut self.tables,
            self.filing,
            &self.concepts,
            self.options,
            &self.accession,
        );
        self.stats.structures = stats.structures;
        self.stats.associations = stats.associations;
    }

    fn finish(mut self) -> FilingGraph {
        let fact_count = i64::try_from(self.tables.facts.len()).unwrap_or(i64::MAX);
        if let Some(report) = self.tables.reports.get_mut(self.report_id) {
            report.fact_count = fact_count;
            report.processed = true;
        }
        if let Some(fact_set) = self.tables.fact_sets.get_mut(self.fact_set_id) {
            fact_set.fact_count = fact_count;
        }
        FilingGraph {
            cik: self
                .tables
                .entities
                .get(self.filer_id)
                .and_then(|e| e.cik.clone()),
            accession: self.accession,
            tables: self.tables,
            stats: self.stats,
            failed: false,
        }
    }
}

/// Metadata CIK, else the first fact's context entity.
fn filer_key<F: ParsedFiling + ?Sized>(
    filing: &F,
    metadata: &FilingMetadata,
    accession: &str,
) -> String {
    if let Some(cik) = metadata.normalized_cik() {
        return cik_entity_key(&cik);
    }
    filing
        .facts()
        .next()
        .and_then(|fact| filing.entity(fact))
        .map(|entity| entity_key(&entity))
        .unwrap_or_else(|| format!("entity:unknown:{accession}"))
}

/// Entity segment of blob storage keys: the filer's CIK, else the raw
/// identifier value of the first fact's entity.
fn storage_entity<F: ParsedFiling + ?Sized>(filing: &F, metadata: &FilingMetadata) -> String {
    if let Some(cik) = metadata.normalized_cik() {
        return cik;
    }
    filing
        .facts()
        .next()
        .and_then(|fact| filing.entity(fact))
        .map(|entity| identifier_cik(&entity).unwrap_or_else(|| entity.value.trim().to_string()))
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn taxonomy_node(identifier: Identifier, taxonomy: &TaxonomyRef) -> TaxonomyNode {
    let segments: Vec<&str> = taxonomy
        .namespace
        .trim_end_matches('/')
        .rsplit('/')
        .filter(|s| !s.is_empty())
        .collect();
    let is_version = |s: &str| s.chars().next().is_some_and(|c| c.is_ascii_digit());
    let version = segments
        .first()
        .filter(|s| is_version(s))
        .map(|s| (*s).to_string());
    let name = taxonomy
        .prefix
        .clone()
        .filter(|p| !p.is_empty())
        .or_else(|| {
            segments
                .iter()
                .find(|s| !is_version(s))
                .map(|s| (*s).to_string())
        })
        .unwrap_or_else(|| taxonomy.namespace.clone());
    TaxonomyNode {
        identifier,
        namespace: taxonomy.namespace.clone(),
        schema_location: taxonomy.schema_location.clone(),
        prefix: taxonomy.prefix.clone(),
        name,
        version,
    }
}
