//! Evaluation of rule bodies against a single input value.
//!
//! The language is closed: the only free name is the lambda parameter, and
//! calls resolve to a fixed set of builtins or to the converter registry.

use std::cmp::Ordering;

use recform_model::{Node, NodeKind, NodeMap, is_truthy};

use crate::ast::{BinaryOp, CompareOp, Expr, UnaryOp};
use crate::converters::Converters;
use crate::error::ConversionError;
use crate::value::{
    Num, compare, display_string, float_node, key_string, loose_eq, num, num_node, to_float,
    to_int,
};

/// Upper bound for `str * int` results.
const MAX_REPEAT_BYTES: usize = 1 << 20;

pub(crate) struct Scope<'a> {
    pub param: &'a str,
    pub value: &'a Node,
    pub converters: &'a Converters,
}

impl Scope<'_> {
    pub(crate) fn eval(&self, expr: &Expr) -> Result<Node, ConversionError> {
        match expr {
            Expr::Literal(node) => Ok(node.clone()),
            Expr::Name(name) if name == self.param => Ok(self.value.clone()),
            Expr::Name(name) => Err(ConversionError::UnknownName(name.clone())),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Node::Array),
            Expr::Dict(entries) => {
                let mut map = NodeMap::new();
                for (key, value) in entries {
                    let key = key_string(&self.eval(key)?);
                    map.insert(key, self.eval(value)?);
                }
                Ok(Node::Object(map))
            }
            Expr::Unary { op, operand } => unary(*op, self.eval(operand)?),
            Expr::Binary { op, left, right } => binary(*op, &self.eval(left)?, &self.eval(right)?),
            Expr::Compare { op, left, right } => {
                compare_op(*op, &self.eval(left)?, &self.eval(right)?).map(Node::Bool)
            }
            Expr::And(left, right) => {
                let left = self.eval(left)?;
                if is_truthy(&left) {
                    self.eval(right)
                } else {
                    Ok(left)
                }
            }
            Expr::Or(left, right) => {
                let left = self.eval(left)?;
                if is_truthy(&left) {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if is_truthy(&self.eval(condition)?) {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Call { function, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(function, &args)
            }
            Expr::Method {
                receiver,
                method,
                args,
            } => {
                let receiver = self.eval(receiver)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                call_method(&receiver, method, &args)
            }
            Expr::Index { target, index } => subscript(&self.eval(target)?, &self.eval(index)?),
        }
    }

    fn call(&self, function: &str, args: &[Node]) -> Result<Node, ConversionError> {
        match function {
            "int" => to_int(single(function, args)?),
            "float" => to_float(single(function, args)?),
            "str" => Ok(Node::String(display_string(single(function, args)?))),
            "bool" => Ok(Node::Bool(is_truthy(single(function, args)?))),
            "len" => length(single(function, args)?),
            "list" => to_list(single(function, args)?),
            "abs" => absolute(single(function, args)?),
            "round" => round(args),
            "min" => extreme(function, args, Ordering::Less),
            "max" => extreme(function, args, Ordering::Greater),
            name => match self.converters.get(name) {
                Some(converter) => converter(single(name, args)?),
                None => Err(ConversionError::UnknownConverter(name.to_string())),
            },
        }
    }
}

fn single<'a>(function: &str, args: &'a [Node]) -> Result<&'a Node, ConversionError> {
    match args {
        [only] => Ok(only),
        _ => Err(arity(function, 1, args.len())),
    }
}

fn arity(function: &str, expected: usize, actual: usize) -> ConversionError {
    ConversionError::Arity {
        function: function.to_string(),
        expected,
        actual,
    }
}

fn argument(function: &str, node: &Node) -> ConversionError {
    ConversionError::Argument {
        function: function.to_string(),
        kind: NodeKind::of(node),
    }
}

fn operands(op: &'static str, left: &Node, right: &Node) -> ConversionError {
    ConversionError::Operands {
        op,
        left: NodeKind::of(left),
        right: NodeKind::of(right),
    }
}

fn unary(op: UnaryOp, operand: Node) -> Result<Node, ConversionError> {
    match op {
        UnaryOp::Not => Ok(Node::Bool(!is_truthy(&operand))),
        UnaryOp::Pos => match num(&operand) {
            Some(value) => num_node(value),
            None => Err(argument("unary +", &operand)),
        },
        UnaryOp::Neg => match num(&operand) {
            Some(Num::Int(value)) => value
                .checked_neg()
                .map(Node::from)
                .ok_or_else(|| ConversionError::Eval("integer overflow".into())),
            Some(Num::Float(value)) => float_node(-value),
            None => Err(argument("unary -", &operand)),
        },
    }
}

fn binary(op: BinaryOp, left: &Node, right: &Node) -> Result<Node, ConversionError> {
    let symbol = op.symbol();
    match (op, left, right) {
        (BinaryOp::Add, Node::String(a), Node::String(b)) => Ok(Node::String(format!("{a}{b}"))),
        (BinaryOp::Add, Node::Array(a), Node::Array(b)) => {
            Ok(Node::Array(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOp::Mul, Node::String(text), count) | (BinaryOp::Mul, count, Node::String(text))
            if matches!(num(count), Some(Num::Int(_))) =>
        {
            let times = match num(count) {
                Some(Num::Int(times)) => usize::try_from(times).unwrap_or(0),
                _ => 0,
            };
            if text.len().saturating_mul(times) > MAX_REPEAT_BYTES {
                return Err(ConversionError::Eval("repeated string too large".into()));
            }
            Ok(Node::String(text.repeat(times)))
        }
        _ => {
            let (Some(a), Some(b)) = (num(left), num(right)) else {
                return Err(operands(symbol, left, right));
            };
            arithmetic(op, a, b).and_then(num_node)
        }
    }
}

fn arithmetic(op: BinaryOp, left: Num, right: Num) -> Result<Num, ConversionError> {
    let overflow = || ConversionError::Eval("integer overflow".into());
    let zero = || ConversionError::Eval("division by zero".into());
    if let (Num::Int(a), Num::Int(b)) = (left, right) {
        return match op {
            BinaryOp::Add => a.checked_add(b).map(Num::Int).ok_or_else(overflow),
            BinaryOp::Sub => a.checked_sub(b).map(Num::Int).ok_or_else(overflow),
            BinaryOp::Mul => a.checked_mul(b).map(Num::Int).ok_or_else(overflow),
            BinaryOp::Div if b == 0 => Err(zero()),
            BinaryOp::Div => Ok(Num::Float(a as f64 / b as f64)),
            BinaryOp::FloorDiv | BinaryOp::Mod if b == 0 => Err(zero()),
            BinaryOp::FloorDiv => {
                let quotient = a.checked_div(b).ok_or_else(overflow)?;
                let floored = if a % b != 0 && ((a < 0) != (b < 0)) {
                    quotient - 1
                } else {
                    quotient
                };
                Ok(Num::Int(floored))
            }
            BinaryOp::Mod => {
                let remainder = a.checked_rem(b).ok_or_else(overflow)?;
                let adjusted = if remainder != 0 && ((remainder < 0) != (b < 0)) {
                    remainder + b
                } else {
                    remainder
                };
                Ok(Num::Int(adjusted))
            }
        };
    }

    let (a, b) = (left.as_f64(), right.as_f64());
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod if b == 0.0 => return Err(zero()),
        BinaryOp::Div => a / b,
        BinaryOp::FloorDiv => (a / b).floor(),
        BinaryOp::Mod => a - b * (a / b).floor(),
    };
    Ok(Num::Float(value))
}

fn compare_op(op: CompareOp, left: &Node, right: &Node) -> Result<bool, ConversionError> {
    let symbol = op.symbol();
    match op {
        CompareOp::Eq => Ok(loose_eq(left, right)),
        CompareOp::NotEq => Ok(!loose_eq(left, right)),
        CompareOp::Lt => Ok(compare(symbol, left, right)? == Ordering::Less),
        CompareOp::Le => Ok(compare(symbol, left, right)? != Ordering::Greater),
        CompareOp::Gt => Ok(compare(symbol, left, right)? == Ordering::Greater),
        CompareOp::Ge => Ok(compare(symbol, left, right)? != Ordering::Less),
        CompareOp::In => contains(left, right),
        CompareOp::NotIn => contains(left, right).map(|found| !found),
    }
}

fn contains(needle: &Node, haystack: &Node) -> Result<bool, ConversionError> {
    match (needle, haystack) {
        (Node::String(part), Node::String(whole)) => Ok(whole.contains(part.as_str())),
        (_, Node::Array(items)) => Ok(items.iter().any(|item| loose_eq(item, needle))),
        (key, Node::Object(map)) if !NodeKind::of(key).is_container() => {
            Ok(map.contains_key(&key_string(key)))
        }
        _ => Err(operands("in", needle, haystack)),
    }
}

fn subscript(target: &Node, index: &Node) -> Result<Node, ConversionError> {
    let missing = || ConversionError::Eval(format!("no item {} in {}", index, NodeKind::of(target)));
    match target {
        Node::Object(map) => map.get(&key_string(index)).cloned().ok_or_else(missing),
        Node::Array(items) => position(index, items.len())
            .and_then(|at| items.get(at).cloned())
            .ok_or_else(missing),
        Node::String(text) => {
            let chars: Vec<char> = text.chars().collect();
            position(index, chars.len())
                .and_then(|at| chars.get(at))
                .map(|ch| Node::String(ch.to_string()))
                .ok_or_else(missing)
        }
        _ => Err(operands("[]", target, index)),
    }
}

/// Resolves a possibly negative index against a length.
fn position(index: &Node, len: usize) -> Option<usize> {
    let Some(Num::Int(raw)) = num(index) else {
        return None;
    };
    if raw < 0 {
        len.checked_sub(usize::try_from(raw.unsigned_abs()).ok()?)
    } else {
        usize::try_from(raw).ok()
    }
}

fn length(node: &Node) -> Result<Node, ConversionError> {
    let len = match node {
        Node::String(text) => text.chars().count(),
        Node::Array(items) => items.len(),
        Node::Object(map) => map.len(),
        other => return Err(argument("len", other)),
    };
    Ok(Node::from(len))
}

fn to_list(node: &Node) -> Result<Node, ConversionError> {
    match node {
        Node::String(text) => Ok(Node::Array(
            text.chars().map(|ch| Node::String(ch.to_string())).collect(),
        )),
        Node::Array(items) => Ok(Node::Array(items.clone())),
        Node::Object(map) => Ok(Node::Array(map.keys().cloned().map(Node::String).collect())),
        other => Err(argument("list", other)),
    }
}

fn absolute(node: &Node) -> Result<Node, ConversionError> {
    match num(node) {
        Some(Num::Int(value)) => value
            .checked_abs()
            .map(Node::from)
            .ok_or_else(|| ConversionError::Eval("integer overflow".into())),
        Some(Num::Float(value)) => float_node(value.abs()),
        None => Err(argument("abs", node)),
    }
}

/// `round(x)` gives an integer, `round(x, n)` a float; ties go to even.
fn round(args: &[Node]) -> Result<Node, ConversionError> {
    let (value, digits) = match args {
        [value] => (value, None),
        [value, digits] => (value, Some(digits)),
        _ => return Err(arity("round", 1, args.len())),
    };
    let number = num(value).ok_or_else(|| argument("round", value))?;
    match digits {
        None => match number {
            Num::Int(value) => Ok(Node::from(value)),
            Num::Float(value) if value.is_finite() => {
                Ok(Node::from(value.round_ties_even() as i64))
            }
            Num::Float(_) => Err(argument("round", value)),
        },
        Some(digits) => {
            let Some(Num::Int(digits)) = num(digits) else {
                return Err(argument("round", digits));
            };
            let scale = 10f64.powi(i32::try_from(digits).unwrap_or(0));
            match number {
                Num::Int(value) => Ok(Node::from(value)),
                Num::Float(value) => float_node((value * scale).round_ties_even() / scale),
            }
        }
    }
}

fn extreme(function: &str, args: &[Node], wanted: Ordering) -> Result<Node, ConversionError> {
    let candidates: &[Node] = match args {
        [Node::Array(items)] => items,
        [] => return Err(arity(function, 1, 0)),
        _ => args,
    };
    let mut best: Option<&Node> = None;
    for candidate in candidates {
        best = match best {
            Some(current) if compare("<", candidate, current)? != wanted => Some(current),
            _ => Some(candidate),
        };
    }
    best.cloned()
        .ok_or_else(|| ConversionError::Eval(format!("{function}() of an empty sequence")))
}

fn call_method(receiver: &Node, method: &str, args: &[Node]) -> Result<Node, ConversionError> {
    match receiver {
        Node::String(text) => string_method(text, method, args),
        Node::Object(map) => map_method(map, method, args),
        Node::Array(items) => match (method, args) {
            ("index", [needle]) => items
                .iter()
                .position(|item| loose_eq(item, needle))
                .map(Node::from)
                .ok_or_else(|| ConversionError::Eval(format!("{needle} is not in sequence"))),
            ("count", [needle]) => Ok(Node::from(
                items.iter().filter(|item| loose_eq(item, needle)).count(),
            )),
            _ => Err(no_method(receiver, method)),
        },
        _ => Err(no_method(receiver, method)),
    }
}

fn no_method(receiver: &Node, method: &str) -> ConversionError {
    ConversionError::NoMethod {
        kind: NodeKind::of(receiver),
        method: method.to_string(),
    }
}

fn text_arg<'a>(method: &str, arg: &'a Node) -> Result<&'a str, ConversionError> {
    arg.as_str().ok_or_else(|| argument(method, arg))
}

fn string_method(text: &str, method: &str, args: &[Node]) -> Result<Node, ConversionError> {
    let string = |value: String| Ok(Node::String(value));
    match (method, args) {
        ("replace", [from, to]) => {
            string(text.replace(text_arg(method, from)?, text_arg(method, to)?))
        }
        ("upper", []) => string(text.to_uppercase()),
        ("lower", []) => string(text.to_lowercase()),
        ("title", []) => string(title_case(text)),
        ("capitalize", []) => {
            let mut chars = text.chars();
            let capitalized = match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.as_str().to_lowercase().chars())
                    .collect(),
                None => String::new(),
            };
            string(capitalized)
        }
        ("strip", []) => string(text.trim().to_string()),
        ("lstrip", []) => string(text.trim_start().to_string()),
        ("rstrip", []) => string(text.trim_end().to_string()),
        ("strip", [chars]) => {
            let chars = text_arg(method, chars)?;
            string(text.trim_matches(|ch: char| chars.contains(ch)).to_string())
        }
        ("lstrip", [chars]) => {
            let chars = text_arg(method, chars)?;
            string(text.trim_start_matches(|ch: char| chars.contains(ch)).to_string())
        }
        ("rstrip", [chars]) => {
            let chars = text_arg(method, chars)?;
            string(text.trim_end_matches(|ch: char| chars.contains(ch)).to_string())
        }
        ("split", []) => Ok(Node::Array(
            text.split_whitespace()
                .map(|part| Node::String(part.to_string()))
                .collect(),
        )),
        ("split", [separator]) => {
            let separator = text_arg(method, separator)?;
            if separator.is_empty() {
                return Err(ConversionError::Eval("empty separator".into()));
            }
            Ok(Node::Array(
                text.split(separator)
                    .map(|part| Node::String(part.to_string()))
                    .collect(),
            ))
        }
        ("join", [Node::Array(items)]) => {
            let parts = items
                .iter()
                .map(|item| text_arg(method, item))
                .collect::<Result<Vec<_>, _>>()?;
            string(parts.join(text))
        }
        ("join", [Node::String(chars)]) => {
            let parts: Vec<String> = chars.chars().map(String::from).collect();
            string(parts.join(text))
        }
        ("startswith", [prefix]) => Ok(Node::Bool(text.starts_with(text_arg(method, prefix)?))),
        ("endswith", [suffix]) => Ok(Node::Bool(text.ends_with(text_arg(method, suffix)?))),
        ("isdigit", []) => Ok(Node::Bool(
            !text.is_empty() && text.chars().all(|ch| ch.is_ascii_digit()),
        )),
        ("format", _) => {
            let mut rendered = text.to_string();
            for arg in args {
                rendered = rendered.replacen("{}", &display_string(arg), 1);
            }
            string(rendered)
        }
        _ => Err(ConversionError::NoMethod {
            kind: NodeKind::String,
            method: method.to_string(),
        }),
    }
}

/// Upper-cases the first letter of every alphabetic run.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_alpha = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if previous_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_alpha = true;
        } else {
            out.push(ch);
            previous_alpha = false;
        }
    }
    out
}

fn map_method(map: &NodeMap, method: &str, args: &[Node]) -> Result<Node, ConversionError> {
    match (method, args) {
        ("get", [key]) => Ok(map.get(&key_string(key)).cloned().unwrap_or(Node::Null)),
        ("get", [key, default]) => Ok(map
            .get(&key_string(key))
            .cloned()
            .unwrap_or_else(|| default.clone())),
        ("keys", []) => Ok(Node::Array(map.keys().cloned().map(Node::String).collect())),
        ("values", []) => Ok(Node::Array(map.values().cloned().collect())),
        _ => Err(ConversionError::NoMethod {
            kind: NodeKind::Map,
            method: method.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn floor_division_and_modulo_follow_the_divisor_sign() {
        assert_eq!(
            arithmetic(BinaryOp::FloorDiv, Num::Int(-7), Num::Int(2)).unwrap(),
            Num::Int(-4)
        );
        assert_eq!(
            arithmetic(BinaryOp::FloorDiv, Num::Int(7), Num::Int(-2)).unwrap(),
            Num::Int(-4)
        );
        assert_eq!(
            arithmetic(BinaryOp::Mod, Num::Int(-7), Num::Int(3)).unwrap(),
            Num::Int(2)
        );
        assert!(arithmetic(BinaryOp::Div, Num::Int(1), Num::Int(0)).is_err());
    }

    #[test]
    fn title_case_restarts_after_non_letters() {
        assert_eq!(title_case("hello wORLD-foo"), "Hello World-Foo");
    }

    #[test]
    fn negative_indices_count_from_the_end() {
        assert_eq!(subscript(&json!([1, 2, 3]), &json!(-1)).unwrap(), json!(3));
        assert_eq!(subscript(&json!("abc"), &json!(0)).unwrap(), json!("a"));
        assert!(subscript(&json!([1]), &json!(-2)).is_err());
    }

    #[test]
    fn rounding_ties_to_even() {
        assert_eq!(round(&[json!(2.5)]).unwrap(), json!(2));
        assert_eq!(round(&[json!(3.5)]).unwrap(), json!(4));
        assert_eq!(round(&[json!(1.234), json!(2)]).unwrap(), json!(1.23));
    }
}
