//! CSV tables as sequences of string-valued records.

use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use recform_model::{Node, NodeMap};

use crate::error::{IngestError, Result};

fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Reads the CSV file at `path`. See [`read_csv_records_from`].
pub fn read_csv_records(path: &Path) -> Result<Node> {
    let file = std::fs::File::open(path).map_err(|source| IngestError::io(path, source))?;
    read_csv_records_from(file, path)
}

/// Reads CSV text into a sequence of maps from header to cell.
///
/// The first non-blank row is the header. Headers and cells are trimmed,
/// blank rows are skipped, short rows are padded with empty cells and
/// columns without a header are dropped. `origin` only labels errors.
pub fn read_csv_records_from<R: Read>(reader: R, origin: &Path) -> Result<Node> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut headers: Option<Vec<String>> = None;
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|source| IngestError::csv(origin, source))?;
        let cells: Vec<String> = row.iter().map(normalize_cell).collect();
        if cells.iter().all(String::is_empty) {
            continue;
        }
        if headers.is_none() {
            headers = Some(cells.iter().map(|cell| normalize_header(cell)).collect());
            continue;
        }
        let names = headers.as_deref().unwrap_or_default();
        let mut record = NodeMap::new();
        for (index, name) in names.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            let value = cells.get(index).cloned().unwrap_or_default();
            record.insert(name.clone(), Node::String(value));
        }
        records.push(Node::Object(record));
    }
    Ok(Node::Array(records))
}
