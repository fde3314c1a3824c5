//! Typed schema trees.
//!
//! Schema documents are ordinary record trees in which a map may carry a
//! directive under the reserved `*` key, and in which every sequence holds a
//! single representative element. [`Schema`] lifts the directive out of the
//! map into its own field so that nothing downstream has to special-case the
//! reserved key; [`Schema::to_node`] writes the document form back.

use std::collections::BTreeMap;

use tracing::debug;

use crate::directive::{DIRECTIVE_KEY, Directive};
use crate::error::PathError;
use crate::node::{Node, NodeKind, NodeMap};
use crate::path::{Path, Segment};

#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// A mapping level with its own (optional) directive and per-key children.
    Map {
        directive: Option<Directive>,
        fields: BTreeMap<String, Schema>,
    },
    /// A sequence level; all data elements share the representative element.
    Seq(Option<Box<Schema>>),
    /// A scalar in schema position, such as version metadata. Inert.
    Leaf(Node),
}

impl Default for Schema {
    fn default() -> Self {
        Self::Map {
            directive: None,
            fields: BTreeMap::new(),
        }
    }
}

impl Schema {
    /// A map level carrying only `directive`.
    pub fn directive(directive: Directive) -> Self {
        Self::Map {
            directive: Some(directive),
            fields: BTreeMap::new(),
        }
    }

    /// Reads a schema document. Never fails: anything that is not a map or a
    /// sequence becomes an inert leaf.
    pub fn from_node(node: &Node) -> Self {
        match node {
            Node::Object(map) => {
                let mut directive = None;
                let mut fields = BTreeMap::new();
                for (key, value) in map {
                    if key == DIRECTIVE_KEY {
                        match value {
                            Node::String(raw) => directive = Some(Directive::parse(raw)),
                            other => debug!(
                                kind = %NodeKind::of(other),
                                "ignoring non-string directive"
                            ),
                        }
                        continue;
                    }
                    fields.insert(key.clone(), Self::from_node(value));
                }
                Self::Map { directive, fields }
            }
            Node::Array(items) => Self::Seq(items.first().map(|item| Box::new(Self::from_node(item)))),
            other => Self::Leaf(other.clone()),
        }
    }

    /// Writes the document form, with directives under the `*` key.
    pub fn to_node(&self) -> Node {
        match self {
            Self::Map { directive, fields } => {
                let mut map = NodeMap::new();
                if let Some(directive) = directive {
                    map.insert(DIRECTIVE_KEY.to_string(), Node::String(directive.to_string()));
                }
                for (key, child) in fields {
                    map.insert(key.clone(), child.to_node());
                }
                Node::Object(map)
            }
            Self::Seq(element) => Node::Array(element.iter().map(|e| e.to_node()).collect()),
            Self::Leaf(node) => node.clone(),
        }
    }

    /// The directive of this level, if it is a map carrying one.
    pub fn own_directive(&self) -> Option<&Directive> {
        match self {
            Self::Map { directive, .. } => directive.as_ref(),
            _ => None,
        }
    }

    pub fn fields(&self) -> Option<&BTreeMap<String, Schema>> {
        match self {
            Self::Map { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Sequence levels stand for their representative element: a schema
    /// entry that is itself a sequence is read through to element `0`.
    pub fn representative(&self) -> Option<&Schema> {
        match self {
            Self::Seq(element) => element.as_deref(),
            other => Some(other),
        }
    }

    /// Follows `path` through the schema. Key segments select map fields;
    /// any index selects the representative element.
    pub fn get(&self, path: &Path) -> Result<&Schema, PathError> {
        let mut current = self;
        let mut at = Path::root();
        for segment in path {
            current = current.step(&at, segment)?;
            at.push(segment.clone());
        }
        Ok(current)
    }

    fn step(&self, at: &Path, segment: &Segment) -> Result<&Schema, PathError> {
        match (self, segment) {
            (Self::Map { fields, .. }, Segment::Key(key)) => fields
                .get(key)
                .ok_or_else(|| PathError::missing(at, segment)),
            (Self::Seq(element), Segment::Index(_)) => element
                .as_deref()
                .ok_or_else(|| PathError::missing(at, segment)),
            (Self::Map { .. }, Segment::Index(_)) => {
                Err(PathError::mismatch(at, segment, NodeKind::Map))
            }
            (Self::Seq(_), Segment::Key(_)) => {
                Err(PathError::mismatch(at, segment, NodeKind::Sequence))
            }
            (Self::Leaf(node), _) => Err(PathError::mismatch(at, segment, NodeKind::of(node))),
        }
    }
}

impl From<&Node> for Schema {
    fn from(node: &Node) -> Self {
        Self::from_node(node)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn people() -> Node {
        json!([{
            "_version": "domain.com/parents-0.1",
            "*": "https://www.wikidata.org/wiki/Q7565",
            "children": [{
                "*": "https://www.wikidata.org/wiki/Q7569",
                "age": {"*": "https://www.wikidata.org/wiki/Q185836|lambda _: float(_)"}
            }],
            "name": {"*": "https://www.wikidata.org/wiki/Q82799"}
        }])
    }

    #[test]
    fn document_round_trip() {
        let node = people();
        assert_eq!(Schema::from_node(&node).to_node(), node);
    }

    #[test]
    fn directive_is_lifted_out_of_fields() {
        let schema = Schema::from_node(&json!({"*": "Person|", "name": {"*": ""}}));
        let Schema::Map { directive, fields } = &schema else {
            panic!("expected a map schema");
        };
        assert_eq!(directive.as_ref().map(|d| d.term.as_str()), Some("Person"));
        assert!(!fields.contains_key("*"));
        assert_eq!(fields["name"].own_directive(), Some(&Directive::default()));
    }

    #[test]
    fn lookup_uses_representative_elements() {
        let schema = Schema::from_node(&people());
        let age = schema
            .get(&Path::root().index(0).key("children").index(0).key("age"))
            .unwrap();
        assert_eq!(age.own_directive().unwrap().rule, "lambda _: float(_)");
    }

    #[test]
    fn lookup_failures_are_path_errors() {
        let schema = Schema::from_node(&people());
        assert!(matches!(
            schema.get(&Path::root().index(0).key("address")),
            Err(PathError::Missing { .. })
        ));
        assert!(matches!(
            schema.get(&Path::root().key("name")),
            Err(PathError::TypeMismatch { kind: NodeKind::Sequence, .. })
        ));
        assert!(matches!(
            schema.get(&Path::root().index(0).key("_version").key("x")),
            Err(PathError::TypeMismatch { kind: NodeKind::String, .. })
        ));
    }
}
