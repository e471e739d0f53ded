//! Per-pass record storage.
//!
//! Each node kind gets an always-present arena holding its records in emission
//! order with a semantic-key index, so a dedup check is a map lookup rather
//! than a scan or a "does this table exist yet" branch.

use std::collections::{BTreeMap, HashMap};

use filing_model::{
    AssociationNode, DimensionNode, Edge, ElementNode, EntityNode, FactNode, FactSetNode,
    Identifier, LabelNode, NodeKind, NodeRecord, PeriodNode, ReferenceNode, RelationshipKind,
    ReportNode, StructureNode, TableKind, TableRows, TaxonomyNode, UnitNode,
};

/// Result of an insert: the identifier, and whether this call created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inserted {
    pub id: Identifier,
    pub is_new: bool,
}

#[derive(Debug, Clone)]
pub struct NodeArena<T> {
    records: Vec<T>,
    by_key: HashMap<String, usize>,
    by_id: HashMap<Identifier, usize>,
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            by_key: HashMap::new(),
            by_id: HashMap::new(),
        }
    }
}

impl<T: NodeRecord> NodeArena<T> {
    /// Returns the existing identifier for `key`, or derives one and stores the
    /// record built from it. `build` only runs for new keys.
    pub fn insert_with(&mut self, key: &str, build: impl FnOnce(Identifier) -> T) -> Inserted {
        if let Some(&idx) = self.by_key.get(key) {
            return Inserted {
                id: self.records[idx].identifier(),
                is_new: false,
            };
        }
        let id = Identifier::from_semantic_key(key);
        let idx = self.records.len();
        self.records.push(build(id));
        self.by_key.insert(key.to_string(), idx);
        self.by_id.insert(id, idx);
        Inserted { id, is_new: true }
    }

    pub fn lookup(&self, key: &str) -> Option<Identifier> {
        self.by_key
            .get(key)
            .map(|&idx| self.records[idx].identifier())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn get(&self, id: Identifier) -> Option<&T> {
        self.by_id.get(&id).map(|&idx| &self.records[idx])
    }

    pub fn get_mut(&mut self, id: Identifier) -> Option<&mut T> {
        self.by_id.get(&id).map(|&idx| &mut self.records[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_table(&self) -> TableRows {
        TableRows::new(
            TableKind::Node(T::KIND),
            self.records.iter().map(NodeRecord::to_row).collect(),
        )
    }
}

/// Every table one filing pass can emit.
#[derive(Debug, Clone)]
pub struct GraphTables {
    pub entities: NodeArena<EntityNode>,
    pub reports: NodeArena<ReportNode>,
    pub fact_sets: NodeArena<FactSetNode>,
    pub facts: NodeArena<FactNode>,
    pub units: NodeArena<UnitNode>,
    pub periods: NodeArena<PeriodNode>,
    pub elements: NodeArena<ElementNode>,
    pub dimensions: NodeArena<DimensionNode>,
    pub structures: NodeArena<StructureNode>,
    pub associations: NodeArena<AssociationNode>,
    pub labels: NodeArena<LabelNode>,
    pub references: NodeArena<ReferenceNode>,
    pub taxonomies: NodeArena<TaxonomyNode>,
    edges: BTreeMap<RelationshipKind, Vec<Edge>>,
}

impl Default for GraphTables {
    fn default() -> Self {
        Self {
            entities: NodeArena::default(),
            reports: NodeArena::default(),
            fact_sets: NodeArena::default(),
            facts: NodeArena::default(),
            units: NodeArena::default(),
            periods: NodeArena::default(),
            elements: NodeArena::default(),
            dimensions: NodeArena::default(),
            structures: NodeArena::default(),
            associations: NodeArena::default(),
            labels: NodeArena::default(),
            references: NodeArena::default(),
            taxonomies: NodeArena::default(),
            edges: RelationshipKind::ALL
                .into_iter()
                .map(|kind| (kind, Vec::new()))
                .collect(),
        }
    }
}

impl GraphTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(&mut self, kind: RelationshipKind, from: Identifier, to: Identifier) {
        self.push_edge(Edge::new(kind, from, to));
    }

    pub fn push_edge(&mut self, edge: Edge) {
        self.edges.entry(edge.kind).or_default().push(edge);
    }

    pub fn edges(&self, kind: RelationshipKind) -> &[Edge] {
        self.edges.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node_count(&self, kind: NodeKind) -> usize {
        match kind {
            NodeKind::Entity => self.entities.len(),
            NodeKind::Report => self.reports.len(),
            NodeKind::FactSet => self.fact_sets.len(),
            NodeKind::Fact => self.facts.len(),
            NodeKind::Unit => self.units.len(),
            NodeKind::Period => self.periods.len(),
            NodeKind::Element => self.elements.len(),
            NodeKind::Dimension => self.dimensions.len(),
            NodeKind::Structure => self.structures.len(),
            NodeKind::Association => self.associations.len(),
            NodeKind::Label => self.labels.len(),
            NodeKind::Reference => self.references.len(),
            NodeKind::Taxonomy => self.taxonomies.len(),
        }
    }

    pub fn edge_count(&self, kind: RelationshipKind) -> usize {
        self.edges(kind).len()
    }

    pub fn total_nodes(&self) -> usize {
        NodeKind::ALL.iter().map(|kind| self.node_count(*kind)).sum()
    }

    pub fn total_edges(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    fn node_table(&self, kind: NodeKind) -> TableRows {
        match kind {
            NodeKind::Entity => self.entities.to_table(),
            NodeKind::Report => self.reports.to_table(),
            NodeKind::FactSet => self.fact_sets.to_table(),
            NodeKind::Fact => self.facts.to_table(),
            NodeKind::Unit => self.units.to_table(),
            NodeKind::Period => self.periods.to_table(),
            NodeKind::Element => self.elements.to_table(),
            NodeKind::Dimension => self.dimensions.to_table(),
            NodeKind::Structure => self.structures.to_table(),
            NodeKind::Association => self.associations.to_table(),
            NodeKind::Label => self.labels.to_table(),
            NodeKind::Reference => self.references.to_table(),
            NodeKind::Taxonomy => self.taxonomies.to_table(),
        }
    }

    /// Flattens every table, empty ones included, in `TableKind::all` order.
    pub fn to_table_rows(&self) -> Vec<TableRows> {
        TableKind::all()
            .map(|kind| match kind {
                TableKind::Node(node) => self.node_table(node),
                TableKind::Relationship(rel) => TableRows::new(
                    kind,
                    self.edges(rel).iter().map(Edge::to_row).collect(),
                ),
            })
            .collect()
    }
}
