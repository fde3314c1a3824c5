//! Reading, writing and deleting values at paths.

use recform_model::{Node, NodeKind, NodeMap, Path, PathError, Segment};

fn step<'a>(node: &'a Node, at: &[Segment], segment: &Segment) -> Result<&'a Node, PathError> {
    let location = || Path::from(at.to_vec());
    match (node, segment) {
        (Node::Object(map), segment) => map
            .get(&segment.to_key_string())
            .ok_or_else(|| PathError::missing(&location(), segment)),
        (Node::Array(items), Segment::Index(index)) => items
            .get(*index)
            .ok_or_else(|| PathError::missing(&location(), segment)),
        (other, segment) => Err(PathError::mismatch(&location(), segment, NodeKind::of(other))),
    }
}

/// The node at `path`. Index segments also address maps by their decimal
/// key spelling.
pub fn get<'a>(tree: &'a Node, path: &[Segment]) -> Result<&'a Node, PathError> {
    let mut current = tree;
    for (depth, segment) in path.iter().enumerate() {
        current = step(current, &path[..depth], segment)?;
    }
    Ok(current)
}

/// Like [`get`], with absence as `None`.
pub fn get_optional<'a>(tree: &'a Node, path: &[Segment]) -> Option<&'a Node> {
    get(tree, path).ok()
}

pub fn get_mut<'a>(tree: &'a mut Node, path: &[Segment]) -> Option<&'a mut Node> {
    let mut current = tree;
    for segment in path {
        current = match (current, segment) {
            (Node::Object(map), segment) => map.get_mut(&segment.to_key_string())?,
            (Node::Array(items), Segment::Index(index)) => items.get_mut(*index)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Finds a node at `path` that satisfies `accept`, tolerating stale sequence
/// indices: at every index segment the exact index is tried first, then the
/// other elements in order. Returns the path actually resolved.
pub fn lookup_any<'a, F>(tree: &'a Node, path: &[Segment], accept: F) -> Option<(Path, &'a Node)>
where
    F: Fn(&Node) -> bool,
{
    let mut resolved = Path::root();
    let found = lookup_from(tree, path, &accept, &mut resolved)?;
    Some((resolved, found))
}

fn lookup_from<'a, F>(
    node: &'a Node,
    rest: &[Segment],
    accept: &F,
    resolved: &mut Path,
) -> Option<&'a Node>
where
    F: Fn(&Node) -> bool,
{
    let Some((segment, tail)) = rest.split_first() else {
        return accept(node).then_some(node);
    };
    match (node, segment) {
        (Node::Array(items), Segment::Index(preferred)) => {
            let others = (0..items.len()).filter(|index| index != preferred);
            for index in std::iter::once(*preferred).chain(others) {
                let Some(child) = items.get(index) else {
                    continue;
                };
                resolved.push(index);
                if let Some(found) = lookup_from(child, tail, accept, resolved) {
                    return Some(found);
                }
                resolved.pop();
            }
            None
        }
        (Node::Object(map), segment) => {
            let child = map.get(&segment.to_key_string())?;
            resolved.push(segment.clone());
            let found = lookup_from(child, tail, accept, resolved);
            if found.is_none() {
                resolved.pop();
            }
            found
        }
        _ => None,
    }
}

/// Writes `value` at `path`. Returns whether anything was written.
///
/// Missing intermediate containers are created. Their kind is read from the
/// same position in `hint` when it holds a container there, and defaults to a
/// map; index segments into maps use the decimal key spelling. Sequences are
/// never extended: an index at or past the end, or a step through a scalar,
/// leaves `tree` untouched.
pub fn set(tree: &mut Node, path: &[Segment], value: Node, hint: Option<&Node>) -> bool {
    let Some((last, init)) = path.split_last() else {
        *tree = value;
        return true;
    };

    let mut current = tree;
    for (depth, segment) in init.iter().enumerate() {
        let exists = match (&*current, segment) {
            (Node::Object(map), segment) => map.contains_key(&segment.to_key_string()),
            (Node::Array(items), Segment::Index(index)) => *index < items.len(),
            _ => return false,
        };
        if !exists {
            let Some(fresh) = build(path, depth + 1, value, hint) else {
                return false;
            };
            return insert(current, segment, fresh);
        }
        current = match (current, segment) {
            (Node::Object(map), segment) => match map.get_mut(&segment.to_key_string()) {
                Some(child) => child,
                None => return false,
            },
            (Node::Array(items), Segment::Index(index)) => match items.get_mut(*index) {
                Some(child) => child,
                None => return false,
            },
            _ => return false,
        };
    }
    insert(current, last, value)
}

fn insert(container: &mut Node, segment: &Segment, value: Node) -> bool {
    match (container, segment) {
        (Node::Object(map), segment) => {
            map.insert(segment.to_key_string(), value);
            true
        }
        (Node::Array(items), Segment::Index(index)) => match items.get_mut(*index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        },
        _ => false,
    }
}

/// Builds, innermost first, the containers for `path[from..]` around
/// `value`. The result is the node to store at `path[..from]`.
fn build(path: &[Segment], from: usize, value: Node, hint: Option<&Node>) -> Option<Node> {
    let mut node = value;
    for depth in (from..path.len()).rev() {
        let kind = hint
            .and_then(|hint| get_optional(hint, &path[..depth]))
            .map(NodeKind::of);
        node = match (kind, &path[depth]) {
            (Some(NodeKind::Sequence), Segment::Index(0)) => Node::Array(vec![node]),
            (Some(NodeKind::Sequence), _) => return None,
            (_, segment) => {
                let mut map = NodeMap::new();
                map.insert(segment.to_key_string(), node);
                Node::Object(map)
            }
        };
    }
    Some(node)
}

/// Removes the node at `path`. Returns the removed node; the root cannot be
/// removed.
pub fn delete(tree: &mut Node, path: &[Segment]) -> Option<Node> {
    let (last, init) = path.split_last()?;
    match (get_mut(tree, init)?, last) {
        (Node::Object(map), segment) => map.remove(&segment.to_key_string()),
        (Node::Array(items), Segment::Index(index)) if *index < items.len() => {
            Some(items.remove(*index))
        }
        _ => None,
    }
}
