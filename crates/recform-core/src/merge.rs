//! Structural addition and subtraction of record trees.
//!
//! Both operations walk the right operand bottom-up and fold each of its
//! nodes into a copy of the left operand at the same path. They are
//! heuristics for trees of roughly matching shape, not an algebra: values
//! that cannot be combined are paired as `[left, right]`, and repeated
//! additions nest those pairs instead of flattening them.

use recform_model::{Node, NodeKind, Path, Segment};
use serde_json::Number;

use crate::access::{delete, get, lookup_any, set};
use crate::walk::visit_nodes;

/// Result of folding one right-hand node into the left-hand value.
enum Combined {
    Merged(Node),
    Paired(Node, Node),
}

impl Combined {
    fn into_node(self) -> Node {
        match self {
            Self::Merged(node) => node,
            Self::Paired(left, right) => Node::Array(vec![left, right]),
        }
    }
}

fn combine(left: &Node, right: &Node) -> Combined {
    match (left, right) {
        (Node::Number(a), Node::Number(b)) => Combined::Merged(number_sum(a, b)),
        (Node::String(a), Node::String(b)) => Combined::Merged(Node::String(format!("{a}{b}"))),
        (Node::Array(a), Node::Array(b)) => {
            Combined::Merged(Node::Array(a.iter().chain(b).cloned().collect()))
        }
        (a, b) if a == b => Combined::Merged(a.clone()),
        (a, b) => Combined::Paired(a.clone(), b.clone()),
    }
}

fn number_sum(a: &Number, b: &Number) -> Node {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64())
        && let Some(sum) = a.checked_add(b)
    {
        return Node::from(sum);
    }
    float_node(a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0))
}

fn number_difference(a: &Number, b: &Number) -> Node {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64())
        && let Some(difference) = a.checked_sub(b)
    {
        return Node::from(difference);
    }
    float_node(a.as_f64().unwrap_or(0.0) - b.as_f64().unwrap_or(0.0))
}

fn float_node(value: f64) -> Node {
    Number::from_f64(value).map_or(Node::Null, Node::Number)
}

fn is_zero(node: &Node) -> bool {
    node.as_f64().is_some_and(|value| value == 0.0)
}

fn is_sequence_at(tree: &Node, path: &Path) -> bool {
    get(tree, path).is_ok_and(Node::is_array)
}

/// Adds `right` into a copy of `left`.
///
/// Paths missing from `left` are copied over, building containers shaped
/// like `right`. Where both sides hold a value, numbers are summed, strings
/// and sequences concatenated, equal values kept once and anything else
/// paired as `[left, right]`. Elements of sequences that both sides hold are
/// not combined one by one; the sequence-level concatenation covers them.
/// The roots are folded the same way, except that two maps stay a map.
///
/// ```
/// use recform_core::add;
/// use serde_json::json;
///
/// assert_eq!(add(&json!({"x": 1}), &json!({"x": 1})), json!({"x": 2}));
/// assert_eq!(add(&json!({"y": 1}), &json!({"y": [1]})), json!({"y": [1, [1]]}));
/// assert_eq!(add(&json!([1]), &json!([2])), json!([1, 2]));
/// ```
pub fn add(left: &Node, right: &Node) -> Node {
    let mut out = left.clone();
    visit_nodes(right, |parent, key, incoming| {
        let target = parent.child(key.clone());
        if get(left, &target).is_err() {
            set(&mut out, &target, incoming.clone(), Some(right));
            return;
        }
        if key.is_index() && is_sequence_at(left, parent) && is_sequence_at(right, parent) {
            return;
        }
        let combined = match get(&out, &target) {
            Ok(current) => combine(current, incoming).into_node(),
            Err(_) => incoming.clone(),
        };
        set(&mut out, &target, combined, Some(right));
    });
    if !(left.is_object() && right.is_object()) {
        out = combine(&out, right).into_node();
    }
    out
}

/// State carried between visits of a subtraction pass.
#[derive(Debug, Default)]
struct DiffContext {
    /// The previous visit was a sequence element, so the sequence holding it
    /// has already been handled element by element.
    previous_was_element: bool,
}

/// Outcome of comparing one left-hand value against its right-hand match.
enum Difference {
    Keep,
    Replace(Node),
    Remove,
}

fn difference(left: &Node, right: &Node) -> Difference {
    match (left, right) {
        (Node::Number(a), Node::Number(b)) => {
            let rest = number_difference(a, b);
            if is_zero(&rest) {
                Difference::Remove
            } else {
                Difference::Replace(rest)
            }
        }
        (Node::Array(a), Node::Array(b)) => {
            let rest = multiset_difference(a, b);
            if rest.is_empty() {
                Difference::Remove
            } else {
                Difference::Replace(Node::Array(rest))
            }
        }
        (Node::Object(_), Node::Object(_)) => Difference::Keep,
        (a, b) if NodeKind::of(a) != NodeKind::of(b) => {
            let removed = items(b);
            let mut rest: Vec<Node> = items(a)
                .into_iter()
                .filter(|item| !removed.contains(item))
                .collect();
            if rest.len() == 1 {
                Difference::Replace(rest.remove(0))
            } else {
                Difference::Replace(Node::Array(rest))
            }
        }
        (a, b) if a == b => Difference::Remove,
        _ => Difference::Keep,
    }
}

fn items(node: &Node) -> Vec<Node> {
    match node {
        Node::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

fn multiset_difference(left: &[Node], right: &[Node]) -> Vec<Node> {
    let mut pending: Vec<&Node> = right.iter().collect();
    left.iter()
        .filter(|item| match pending.iter().position(|other| other == item) {
            Some(found) => {
                pending.swap_remove(found);
                false
            }
            None => true,
        })
        .cloned()
        .collect()
}

/// Subtracts `right` from a copy of `left`.
///
/// Numbers are subtracted and sequences lose the elements `right` holds,
/// with the node removed once nothing is left. Equal scalars are removed.
/// Values of different kinds are compared as item lists. Inside sequences an
/// equal element is looked up first, since earlier removals shift positions.
/// Maps are never removed themselves, so `subtract(x, x)` keeps the container
/// skeleton of `x` and drops every scalar. A root that is removed entirely
/// becomes `null`.
///
/// ```
/// use recform_core::subtract;
/// use serde_json::json;
///
/// let g = json!({"z": {"?": 1, "!": 1}, "u": 1});
/// let e = json!({"z": {"?": 1}});
/// assert_eq!(subtract(&g, &e), json!({"z": {"!": 1}, "u": 1}));
/// ```
pub fn subtract(left: &Node, right: &Node) -> Node {
    let mut out = left.clone();
    let mut context = DiffContext::default();
    visit_nodes(right, |parent, key, removed| {
        if !key.is_index() && removed.is_array() && context.previous_was_element {
            context.previous_was_element = false;
            return;
        }
        context.previous_was_element = key.is_index();

        let mut location = parent.child(key.clone());
        if location.iter().any(Segment::is_index)
            && let Some((found, _)) = lookup_any(&out, &location, |candidate| candidate == removed)
        {
            location = found;
        }
        match get(&out, &location).map(|current| difference(current, removed)) {
            Ok(Difference::Keep) | Err(_) => {}
            Ok(Difference::Replace(rest)) => {
                set(&mut out, &location, rest, None);
            }
            Ok(Difference::Remove) => {
                delete(&mut out, &location);
            }
        }
    });
    if !(right.is_array() && context.previous_was_element) {
        match difference(&out, right) {
            Difference::Keep => {}
            Difference::Replace(rest) => out = rest,
            Difference::Remove => out = Node::Null,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn addition_pins() {
        let a = json!({"x": 1});
        let b = json!({"x": 1});
        let c = json!({"y": 1});
        let d = json!({"y": [1]});
        let e = json!({"z": {"?": 1}});
        let f = json!({"z": {"?": [1]}});

        assert_eq!(add(&a, &b), json!({"x": 2}));
        assert_eq!(add(&a, &c), json!({"x": 1, "y": 1}));
        assert_eq!(add(&add(&a, &b), &c), json!({"x": 2, "y": 1}));
        assert_eq!(add(&d, &d), json!({"y": [1, 1]}));
        assert_eq!(add(&a, &d), json!({"x": 1, "y": [1]}));
        assert_eq!(add(&c, &d), json!({"y": [1, [1]]}));
        assert_eq!(add(&d, &c), json!({"y": [[1], 1]}));
        assert_eq!(add(&e, &f), json!({"z": [{"?": [1, [1]]}, {"?": [1]}]}));
    }

    #[test]
    fn nested_maps_pair_after_merging() {
        let a = json!({"x": {"y": {"z": 1}, "u": 2}, "m": 1, "n": 2});
        let b = json!({"x": {"y": {"z": 2}, "u": 8}, "m": [2], "n": 3});
        assert_eq!(
            add(&a, &b),
            json!({
                "x": [{"y": [{"z": 3}, {"z": 2}], "u": 10}, {"y": {"z": 2}, "u": 8}],
                "m": [1, [2]],
                "n": 5
            })
        );

        let c = json!({"x": {"y": [{"1": "Thing A"}, {"2": "Thing B"}]}});
        let d = json!({"x": {"y": [{"3": "Thing C"}, {"4": "Thing D"}]}});
        assert_eq!(
            add(&c, &d),
            json!({"x": [
                {"y": [
                    {"1": "Thing A", "3": "Thing C"},
                    {"2": "Thing B", "4": "Thing D"},
                    {"3": "Thing C"},
                    {"4": "Thing D"}
                ]},
                {"y": [{"3": "Thing C"}, {"4": "Thing D"}]}
            ]})
        );
    }

    #[test]
    fn addition_of_strings_and_floats() {
        assert_eq!(add(&json!({"s": "ab"}), &json!({"s": "cd"})), json!({"s": "abcd"}));
        assert_eq!(add(&json!({"f": 0.5}), &json!({"f": 1})), json!({"f": 1.5}));
        assert_eq!(add(&json!({"t": true}), &json!({"t": true})), json!({"t": true}));
        assert_eq!(add(&json!({"t": true}), &json!({"t": null})), json!({"t": [true, null]}));
    }

    #[test]
    fn subtraction_pins() {
        let a = json!({"x": 1});
        let b = json!({"x": 1});
        let d = json!({"y": [1]});
        let e = json!({"z": {"?": 1}});
        let f = json!({"z": {"?": [1]}});
        let g = json!({"z": {"?": 1, "!": 1}, "u": 1});

        assert_eq!(subtract(&b, &a), json!({}));
        assert_eq!(subtract(&a, &b), json!({}));
        assert_eq!(subtract(&json!({}), &f), json!({}));
        assert_eq!(subtract(&d, &d), json!({"y": []}));
        assert_eq!(subtract(&e, &e), json!({"z": {}}));
        assert_eq!(subtract(&g, &e), json!({"z": {"!": 1}, "u": 1}));
        assert_eq!(subtract(&e, &f), json!({"z": {"?": 1}}));
    }

    #[test]
    fn subtraction_of_mixed_kinds() {
        assert_eq!(subtract(&json!({"x": [1, 2]}), &json!({"x": 1})), json!({"x": 2}));
        assert_eq!(subtract(&json!({"x": [1, 2, 3]}), &json!({"x": 1})), json!({"x": [2, 3]}));
        assert_eq!(subtract(&json!({"x": 5}), &json!({"x": 2})), json!({"x": 3}));
        assert_eq!(subtract(&json!({"x": "a"}), &json!({"x": "b"})), json!({"x": "a"}));
    }

    #[test]
    fn elements_shift_after_removal() {
        let numbers = json!({"xs": [1, 2]});
        assert_eq!(subtract(&numbers, &numbers), json!({"xs": []}));

        let nested = json!({"k": [1, 1, [1]]});
        assert_eq!(subtract(&nested, &nested), json!({"k": [[]]}));

        let records = json!({"xs": [{"k": "a"}, {"k": "b"}]});
        assert_eq!(subtract(&records, &records), json!({"xs": [{}, {}]}));
    }

    #[test]
    fn roots_are_folded_too() {
        assert_eq!(add(&json!([1]), &json!([2])), json!([1, 2]));
        assert_eq!(add(&json!(1), &json!(2)), json!(3));
        assert_eq!(add(&json!("ab"), &json!("cd")), json!("abcd"));
        assert_eq!(add(&json!(true), &json!(null)), json!([true, null]));
        assert_eq!(
            add(&json!([{"a": 1}]), &json!([{"b": 2}, {"c": 3}])),
            json!([{"a": 1, "b": 2}, {"b": 2}, {"c": 3}])
        );

        assert_eq!(subtract(&json!(5), &json!(5)), json!(null));
        assert_eq!(subtract(&json!(5), &json!(2)), json!(3));
        assert_eq!(subtract(&json!([1, 2]), &json!([1, 2])), json!([]));
        assert_eq!(subtract(&json!([1, 2, 3]), &json!([2])), json!([1, 3]));
        assert_eq!(subtract(&json!([1, 2]), &json!(1)), json!(2));
    }
}
