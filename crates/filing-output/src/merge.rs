//! Combining tables from several filings.

use std::collections::BTreeMap;

use filing_model::{TableKind, TableRows};

/// Concatenates tables of the same kind, preserving filing order.
///
/// Node rows are not deduplicated here; the writer drops repeated
/// identifiers, so shared units, periods and elements land once.
pub fn merge_tables<I>(graphs: I) -> Vec<TableRows>
where
    I: IntoIterator<Item = Vec<TableRows>>,
{
    let mut merged: BTreeMap<TableKind, TableRows> = TableKind::all()
        .map(|kind| (kind, TableRows::new(kind, Vec::new())))
        .collect();
    for tables in graphs {
        for table in tables {
            merged
                .entry(table.kind)
                .or_insert_with(|| TableRows::new(table.kind, Vec::new()))
                .rows
                .extend(table.rows);
        }
    }
    let mut ordered: Vec<TableRows> = Vec::with_capacity(merged.len());
    for kind in TableKind::all() {
        if let Some(table) = merged.remove(&kind) {
            ordered.push(table);
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use filing_model::{NodeKind, Row};

    use super::*;

    #[test]
    fn concatenates_by_kind() {
        let unit = TableKind::Node(NodeKind::Unit);
        let first = vec![TableRows::new(unit, vec![Row::new().with("identifier", "a")])];
        let second = vec![TableRows::new(unit, vec![Row::new().with("identifier", "a")])];
        let merged = merge_tables([first, second]);
        assert_eq!(merged.len(), TableKind::all().count());
        let units = merged.iter().find(|t| t.kind == unit).unwrap();
        assert_eq!(units.len(), 2);
    }
}
