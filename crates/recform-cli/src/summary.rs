//! Terminal tables for command results.

use std::path::Path;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use recform_model::TermRecord;

use crate::commands::AlignOutcome;

/// One row per shared field, one column per source holding its path there.
pub fn match_matrix_table(outcome: &AlignOutcome) -> Table {
    let mut table = Table::new();
    let mut header = vec![header_cell("Field")];
    header.extend(outcome.columns.iter().map(|path| header_cell(&source_label(path))));
    table.set_header(header);
    apply_table_style(&mut table);
    for (field, paths) in outcome.matrix.iter() {
        let mut row = vec![Cell::new(field).fg(Color::Blue).add_attribute(Attribute::Bold)];
        row.extend(paths.iter().map(Cell::new));
        table.add_row(row);
    }
    if outcome.matrix.is_empty() {
        table.add_row(vec![dim_cell("no shared fields")]);
    }
    table
}

pub fn converters_table(names: &[String]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Converter")]);
    apply_table_style(&mut table);
    for name in names {
        table.add_row(vec![Cell::new(name)]);
    }
    table
}

pub fn terms_table(terms: &[TermRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Slug"), header_cell("Term")]);
    apply_table_style(&mut table);
    for term in terms {
        table.add_row(vec![Cell::new(&term.name), dim_cell(&term.url)]);
    }
    table
}

pub fn print_align_summary(outcome: &AlignOutcome) {
    println!("{}", match_matrix_table(outcome));
    println!(
        "Records: {}  Fields: {}",
        outcome.records.len(),
        outcome.matrix.len()
    );
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn source_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
