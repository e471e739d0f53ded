use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use filing_cli::pipeline::{FilingSummary, RunResult};

pub fn print_summary(result: &RunResult) {
    println!(
        "Schema: {} ({} tables, {})",
        result.schema.source,
        result.schema.table_count,
        short_fingerprint(&result.schema.fingerprint)
    );
    if result.dry_run {
        println!("Dry run: no files written");
    } else {
        println!("Output: {}", result.output_dir.display());
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Filing"),
        header_cell("CIK"),
        header_cell("Facts"),
        header_cell("Nodes"),
        header_cell("Edges"),
        header_cell("External"),
        header_cell("Tables"),
        header_cell("Status"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..=6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 7, CellAlignment::Center);

    let mut total_facts = 0usize;
    let mut total_nodes = 0usize;
    let mut total_edges = 0usize;
    let mut total_external = 0usize;
    let mut total_tables = 0usize;
    for filing in &result.filings {
        total_facts += filing.facts;
        total_nodes += filing.nodes;
        total_edges += filing.edges;
        total_external += filing.externalized;
        total_tables += filing.written.len();
        table.add_row(vec![
            Cell::new(&filing.accession)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            filing.cik.as_deref().map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(filing.facts),
            Cell::new(filing.nodes),
            Cell::new(filing.edges),
            count_cell(filing.externalized),
            Cell::new(filing.written.len()),
            status_cell(filing),
        ]);
    }
    if !result.merged.is_empty() {
        let (edge_tables, node_tables): (Vec<_>, Vec<_>) = result
            .merged
            .iter()
            .partition(|written| written.kind.is_relationship());
        table.add_row(vec![
            Cell::new("merged").fg(Color::DarkCyan),
            dim_cell("-"),
            dim_cell("-"),
            Cell::new(node_tables.iter().map(|t| t.rows).sum::<usize>()),
            Cell::new(edge_tables.iter().map(|t| t.rows).sum::<usize>()),
            dim_cell("-"),
            Cell::new(result.merged.len()),
            dim_cell("-"),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} filings", result.filings.len()))
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_facts).add_attribute(Attribute::Bold),
        Cell::new(total_nodes).add_attribute(Attribute::Bold),
        Cell::new(total_edges).add_attribute(Attribute::Bold),
        count_cell(total_external).add_attribute(Attribute::Bold),
        Cell::new(total_tables).add_attribute(Attribute::Bold),
        failed_total_cell(result.failed_count()),
    ]);
    println!("{table}");
    print_failures(result);
    println!("Completed in {} ms", result.duration_ms);
}

fn print_failures(result: &RunResult) {
    let failures: Vec<&FilingSummary> = result.filings.iter().filter(|f| !f.is_ok()).collect();
    if failures.is_empty() {
        return;
    }
    eprintln!("Failures:");
    for filing in failures {
        let reason = filing
            .write_error
            .as_deref()
            .or(filing.failure_reason.as_deref())
            .unwrap_or("unknown error");
        eprintln!("- {} ({}): {reason}", filing.accession, filing.input.display());
    }
}

fn short_fingerprint(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}

fn status_cell(filing: &FilingSummary) -> Cell {
    if filing.failed {
        Cell::new("failed").fg(Color::Red).add_attribute(Attribute::Bold)
    } else if filing.write_error.is_some() {
        Cell::new("write error").fg(Color::Red).add_attribute(Attribute::Bold)
    } else {
        Cell::new("✓").fg(Color::Green).add_attribute(Attribute::Bold)
    }
}

fn failed_total_cell(failed: usize) -> Cell {
    if failed > 0 {
        Cell::new(format!("{failed} failed"))
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    } else {
        dim_cell("-")
    }
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).fg(Color::Yellow)
    } else {
        dim_cell(count)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
