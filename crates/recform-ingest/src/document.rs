//! Loading and saving record trees as JSON, YAML or CSV documents.

use std::fmt;
use std::path::Path;

use recform_model::{Node, NodeMap};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::csv_records::{read_csv_records, read_csv_records_from};
use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Json,
    Yaml,
    Csv,
}

impl DocumentFormat {
    /// Format named by the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "csv" => Ok(Self::Csv),
            "" => Err(IngestError::unsupported(path, "no file extension")),
            other => Err(IngestError::unsupported(
                path,
                format!("unknown extension `{other}`"),
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loads the document at `path`, choosing the format by extension.
pub fn load_document(path: &Path) -> Result<Node> {
    let format = DocumentFormat::from_path(path)?;
    debug!(path = %path.display(), %format, "loading document");
    if format == DocumentFormat::Csv {
        return read_csv_records(path);
    }
    let text = std::fs::read_to_string(path).map_err(|source| IngestError::io(path, source))?;
    parse_document(&text, format, path)
}

/// Parses document text. `origin` only labels errors.
pub fn parse_document(text: &str, format: DocumentFormat, origin: &Path) -> Result<Node> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str(text).map_err(|source| IngestError::json(origin, source))
        }
        DocumentFormat::Yaml => {
            if text.trim().is_empty() {
                return Ok(Node::Null);
            }
            let value: serde_yaml::Value =
                serde_yaml::from_str(text).map_err(|source| IngestError::yaml(origin, source))?;
            Ok(yaml_to_node(value))
        }
        DocumentFormat::Csv => read_csv_records_from(text.as_bytes(), origin),
    }
}

/// Converts YAML to a record tree. Non-string keys are stringified, so
/// `1: a` becomes `{"1": "a"}`; tags are dropped.
pub fn yaml_to_node(value: serde_yaml::Value) -> Node {
    match value {
        serde_yaml::Value::Null => Node::Null,
        serde_yaml::Value::Bool(flag) => Node::Bool(flag),
        serde_yaml::Value::Number(number) => number_node(&number),
        serde_yaml::Value::String(text) => Node::String(text),
        serde_yaml::Value::Sequence(items) => {
            Node::Array(items.into_iter().map(yaml_to_node).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = NodeMap::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key), yaml_to_node(value));
            }
            Node::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_node(tagged.value),
    }
}

fn number_node(number: &serde_yaml::Number) -> Node {
    if let Some(int) = number.as_i64() {
        Node::from(int)
    } else if let Some(int) = number.as_u64() {
        Node::from(int)
    } else {
        number
            .as_f64()
            .and_then(serde_json::Number::from_f64)
            .map_or(Node::Null, Node::Number)
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match yaml_to_node(key) {
        Node::String(text) => text,
        Node::Bool(true) => "True".to_string(),
        Node::Bool(false) => "False".to_string(),
        Node::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// Serialises `tree` in `format`. CSV output is not supported.
pub fn to_string_pretty(tree: &Node, format: DocumentFormat) -> Result<String> {
    let origin = Path::new("<output>");
    match format {
        DocumentFormat::Json => {
            serde_json::to_string_pretty(tree).map_err(|source| IngestError::json(origin, source))
        }
        DocumentFormat::Yaml => {
            serde_yaml::to_string(tree).map_err(|source| IngestError::yaml(origin, source))
        }
        DocumentFormat::Csv => Err(IngestError::unsupported(
            origin,
            "trees can only be written as JSON or YAML",
        )),
    }
}

/// Writes `tree` to `path`, choosing the format by extension.
pub fn write_document(path: &Path, tree: &Node) -> Result<()> {
    let format = DocumentFormat::from_path(path)?;
    let mut text = to_string_pretty(tree, format).map_err(|error| match error {
        IngestError::UnsupportedFormat { reason, .. } => IngestError::unsupported(path, reason),
        other => other,
    })?;
    if !text.ends_with('\n') {
        text.push('\n');
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| IngestError::io(parent, source))?;
    }
    std::fs::write(path, text).map_err(|source| IngestError::io(path, source))?;
    debug!(path = %path.display(), %format, "wrote document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn formats_by_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/b.JSON")).unwrap(),
            DocumentFormat::Json
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("b.yml")).unwrap(),
            DocumentFormat::Yaml
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("b.csv")).unwrap(),
            DocumentFormat::Csv
        );
        assert!(matches!(
            DocumentFormat::from_path(Path::new("b.xml")),
            Err(IngestError::UnsupportedFormat { .. })
        ));
        assert!(DocumentFormat::from_path(Path::new("README")).is_err());
    }

    #[test]
    fn yaml_keys_become_strings() {
        let text = "1: one\ntrue: yes\nname:\n  - 2.5\n  - ~\n";
        let tree = parse_document(text, DocumentFormat::Yaml, Path::new("x.yaml")).unwrap();
        assert_eq!(
            tree,
            json!({"1": "one", "True": "yes", "name": [2.5, null]})
        );
    }

    #[test]
    fn invalid_json_names_the_origin() {
        let error = parse_document("{", DocumentFormat::Json, Path::new("bad.json")).unwrap_err();
        assert_eq!(error.path(), Path::new("bad.json"));
    }

    #[test]
    fn yaml_output() {
        let text = to_string_pretty(&json!({"a": [1, "x"]}), DocumentFormat::Yaml).unwrap();
        assert_eq!(text, "a:\n- 1\n- x\n");
        assert!(to_string_pretty(&json!([]), DocumentFormat::Csv).is_err());
    }
}
