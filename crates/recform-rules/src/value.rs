//! Numeric and textual views of nodes shared by the evaluator and the
//! built-in converters.

use std::cmp::Ordering;

use recform_model::{Node, NodeKind};

use crate::error::ConversionError;

/// A number as the rule language sees it: integers stay integers until an
/// operation needs a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Self::Int(value) => value as f64,
            Self::Float(value) => value,
        }
    }
}

/// Numbers and booleans (`True` is `1`).
pub(crate) fn num(node: &Node) -> Option<Num> {
    match node {
        Node::Bool(flag) => Some(Num::Int(i64::from(*flag))),
        Node::Number(number) => number
            .as_i64()
            .map(Num::Int)
            .or_else(|| number.as_f64().map(Num::Float)),
        _ => None,
    }
}

pub(crate) fn num_node(value: Num) -> Result<Node, ConversionError> {
    match value {
        Num::Int(value) => Ok(Node::from(value)),
        Num::Float(value) => float_node(value),
    }
}

pub(crate) fn float_node(value: f64) -> Result<Node, ConversionError> {
    serde_json::Number::from_f64(value)
        .map(Node::Number)
        .ok_or_else(|| ConversionError::Eval(format!("{value} is not a finite number")))
}

/// Text rendering of a node: strings verbatim, `True`/`False`/`None` for
/// the keyword scalars, JSON for containers.
pub(crate) fn display_string(node: &Node) -> String {
    match node {
        Node::String(text) => text.clone(),
        Node::Null => "None".to_string(),
        Node::Bool(true) => "True".to_string(),
        Node::Bool(false) => "False".to_string(),
        Node::Number(number) => number.to_string(),
        Node::Array(_) | Node::Object(_) => node.to_string(),
    }
}

/// Map key under which a value is stored or looked up.
pub(crate) fn key_string(node: &Node) -> String {
    display_string(node)
}

/// Equality with numeric promotion, so that `1 == 1.0` and `True == 1`.
pub(crate) fn loose_eq(left: &Node, right: &Node) -> bool {
    match (num(left), num(right)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => a == b,
        (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

pub(crate) fn compare(
    op: &'static str,
    left: &Node,
    right: &Node,
) -> Result<Ordering, ConversionError> {
    let mismatch = || ConversionError::Operands {
        op,
        left: NodeKind::of(left),
        right: NodeKind::of(right),
    };
    match (left, right) {
        (Node::String(a), Node::String(b)) => Ok(a.cmp(b)),
        (Node::Array(a), Node::Array(b)) => {
            for (x, y) in a.iter().zip(b) {
                if !loose_eq(x, y) {
                    return compare(op, x, y);
                }
            }
            Ok(a.len().cmp(&b.len()))
        }
        _ => match (num(left), num(right)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(a.cmp(&b)),
            (Some(a), Some(b)) => a.as_f64().partial_cmp(&b.as_f64()).ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
    }
}

/// `int(...)`: truncates floats, parses decimal strings, maps booleans.
pub(crate) fn to_int(node: &Node) -> Result<Node, ConversionError> {
    match node {
        Node::String(text) => text
            .trim()
            .parse::<i64>()
            .map(Node::from)
            .map_err(|_| ConversionError::invalid("int", text.as_str())),
        other => match num(other) {
            Some(Num::Int(value)) => Ok(Node::from(value)),
            Some(Num::Float(value)) if value.is_finite() => Ok(Node::from(value.trunc() as i64)),
            _ => Err(ConversionError::Argument {
                function: "int".into(),
                kind: NodeKind::of(other),
            }),
        },
    }
}

/// `float(...)`: promotes integers, parses strings.
pub(crate) fn to_float(node: &Node) -> Result<Node, ConversionError> {
    match node {
        Node::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| ConversionError::invalid("float", text.as_str()))
            .and_then(float_node),
        other => match num(other) {
            Some(value) => float_node(value.as_f64()),
            None => Err(ConversionError::Argument {
                function: "float".into(),
                kind: NodeKind::of(other),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn display_uses_keyword_spelling() {
        assert_eq!(display_string(&json!(true)), "True");
        assert_eq!(display_string(&json!(null)), "None");
        assert_eq!(display_string(&json!(1.0)), "1.0");
        assert_eq!(display_string(&json!(12)), "12");
    }

    #[test]
    fn casts() {
        assert_eq!(to_int(&json!(" 42 ")).unwrap(), json!(42));
        assert_eq!(to_int(&json!(3.9)).unwrap(), json!(3));
        assert_eq!(to_int(&json!(-3.9)).unwrap(), json!(-3));
        assert!(to_int(&json!("1.5")).is_err());
        assert_eq!(to_float(&json!("2.5")).unwrap(), json!(2.5));
        assert_eq!(to_float(&json!(2)).unwrap(), json!(2.0));
        assert!(to_float(&json!([1])).is_err());
    }

    #[test]
    fn numeric_equality_promotes() {
        assert!(loose_eq(&json!(1), &json!(1.0)));
        assert!(loose_eq(&json!(true), &json!(1)));
        assert!(!loose_eq(&json!("1"), &json!(1)));
    }
}
