//! Aligning records from differently-shaped sources on shared field names.
//!
//! One probe record per source (its first) decides, for every scalar field
//! name common to all probes, the path that reaches it in that source. The
//! remaining records of a source are assumed to share its probe's shape and
//! are read through the same paths.

use std::collections::BTreeMap;

use recform_model::{Node, NodeMap, Path, PathError};
use serde::Serialize;
use thiserror::Error;

use crate::access::get;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlignError {
    #[error("source {source_index}, record {record}: field `{field}` is unreachable")]
    Shape {
        source_index: usize,
        record: usize,
        field: String,
        #[source]
        cause: PathError,
    },
}

/// Paths to every scalar leaf stored under a map key, grouped by that key.
///
/// Keys are visited in sorted order, parents before children, so the first
/// path for a name is the shallowest-leftmost occurrence.
pub fn scalar_paths(record: &Node) -> BTreeMap<String, Vec<Path>> {
    let mut found = BTreeMap::new();
    collect(record, &mut Path::root(), &mut found);
    found
}

fn collect(node: &Node, at: &mut Path, found: &mut BTreeMap<String, Vec<Path>>) {
    match node {
        Node::Object(map) => {
            for (key, child) in map {
                at.push(key.as_str());
                if child.is_object() || child.is_array() {
                    collect(child, at, found);
                } else {
                    found.entry(key.clone()).or_default().push(at.clone());
                }
                at.pop();
            }
        }
        Node::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                at.push(index);
                collect(child, at, found);
                at.pop();
            }
        }
        _ => {}
    }
}

/// Field name → per-source path, for the scalar field names shared by every
/// probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchMatrix {
    fields: BTreeMap<String, Vec<Path>>,
}

impl MatchMatrix {
    /// Common field names in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Path to `field` in the source of probe `source_index`.
    pub fn path(&self, field: &str, source_index: usize) -> Option<&Path> {
        self.fields.get(field)?.get(source_index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Path])> {
        self.fields
            .iter()
            .map(|(field, paths)| (field.as_str(), paths.as_slice()))
    }
}

/// Builds the match matrix of `probes`. A field name that occurs at several
/// paths in one probe is reached through its first occurrence.
pub fn build_match_matrix(probes: &[&Node]) -> MatchMatrix {
    let Some((first, rest)) = probes.split_first() else {
        return MatchMatrix::default();
    };
    let others: Vec<_> = rest.iter().map(|probe| scalar_paths(probe)).collect();
    let fields = scalar_paths(first)
        .into_iter()
        .filter_map(|(field, paths)| {
            let mut row = vec![paths.into_iter().next()?];
            for other in &others {
                row.push(other.get(&field)?.first()?.clone());
            }
            Some((field, row))
        })
        .collect();
    MatchMatrix { fields }
}

/// Flattens every record of every source to a map of the common field
/// names. Sources are concatenated in order; an empty source contributes
/// neither a probe nor records.
///
/// ```
/// use recform_core::align;
/// use serde_json::json;
///
/// let left = vec![json!({"id": 1, "name": "a"})];
/// let right = vec![json!({"meta": {"id": 2}, "title": "b"})];
/// assert_eq!(align(&[left, right]).unwrap(), vec![json!({"id": 1}), json!({"id": 2})]);
/// ```
pub fn align(sources: &[Vec<Node>]) -> Result<Vec<Node>, AlignError> {
    let populated: Vec<(usize, &Vec<Node>)> = sources
        .iter()
        .enumerate()
        .filter(|(_, records)| !records.is_empty())
        .collect();
    let probes: Vec<&Node> = populated.iter().map(|(_, records)| &records[0]).collect();
    let matrix = build_match_matrix(&probes);

    let mut aligned = Vec::new();
    for (column, (source_index, records)) in populated.iter().enumerate() {
        for (record_index, record) in records.iter().enumerate() {
            aligned.push(project(&matrix, column, record).map_err(|(field, cause)| {
                AlignError::Shape {
                    source_index: *source_index,
                    record: record_index,
                    field,
                    cause,
                }
            })?);
        }
    }
    Ok(aligned)
}

fn project(matrix: &MatchMatrix, column: usize, record: &Node) -> Result<Node, (String, PathError)> {
    let mut flat = NodeMap::new();
    for (field, paths) in matrix.iter() {
        let Some(path) = paths.get(column) else {
            continue;
        };
        let value = get(record, path).map_err(|cause| (field.to_string(), cause))?;
        flat.insert(field.to_string(), value.clone());
    }
    Ok(Node::Object(flat))
}
