//! The universal value type flowing through every operation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A record tree node: map, sequence or scalar, exactly as parsed from JSON.
pub type Node = serde_json::Value;

/// Map payload of a [`Node`].
pub type NodeMap = serde_json::Map<String, Node>;

/// Runtime kind of a [`Node`], used for type-compatibility checks and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Null,
    Bool,
    Number,
    String,
    Sequence,
    Map,
}

impl NodeKind {
    pub fn of(node: &Node) -> Self {
        match node {
            Node::Null => Self::Null,
            Node::Bool(_) => Self::Bool,
            Node::Number(_) => Self::Number,
            Node::String(_) => Self::String,
            Node::Array(_) => Self::Sequence,
            Node::Object(_) => Self::Map,
        }
    }

    /// True for kinds that hold other nodes.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Sequence | Self::Map)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Sequence => "sequence",
            Self::Map => "map",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when the node is a string, number, boolean or null.
pub fn is_scalar(node: &Node) -> bool {
    !NodeKind::of(node).is_container()
}

/// Truthiness used by the merge engine and the rule language:
/// null, false, zero and empty containers/strings are falsy.
pub fn is_truthy(node: &Node) -> bool {
    match node {
        Node::Null => false,
        Node::Bool(b) => *b,
        Node::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Node::String(s) => !s.is_empty(),
        Node::Array(items) => !items.is_empty(),
        Node::Object(map) => !map.is_empty(),
    }
}
