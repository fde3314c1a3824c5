//! Bottom-up tree traversal.
//!
//! [`walk`] rebuilds a tree, handing every node to a visitor after its
//! children have been rebuilt. The visitor sees the path of the node's parent,
//! the node's own key (`None` for the root) and the rebuilt value, and decides
//! whether to keep, rename or drop it.

use recform_model::{Node, NodeMap, Path, Segment};

/// What a visitor wants done with a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Visit {
    Keep(Node),
    /// Store the value under a new key. Ignored for sequence elements and
    /// for the root.
    Rename(Segment, Node),
    Drop,
}

impl Visit {
    /// Rename when the key changed, keep otherwise.
    pub fn entry(original: &Segment, key: Segment, value: Node) -> Self {
        if &key == original {
            Self::Keep(value)
        } else {
            Self::Rename(key, value)
        }
    }
}

/// Rebuilds `tree`, visiting every node once, children before parents.
///
/// Dropping the root yields `null`. Sequence elements keep their relative
/// order; dropped elements close up the gap.
pub fn walk<F>(tree: Node, mut visit: F) -> Node
where
    F: FnMut(&Path, Option<&Segment>, Node) -> Visit,
{
    let mut path = Path::root();
    let rebuilt = rebuild(tree, &mut path, &mut visit);
    match visit(&path, None, rebuilt) {
        Visit::Keep(value) | Visit::Rename(_, value) => value,
        Visit::Drop => Node::Null,
    }
}

fn rebuild<F>(node: Node, path: &mut Path, visit: &mut F) -> Node
where
    F: FnMut(&Path, Option<&Segment>, Node) -> Visit,
{
    match node {
        Node::Object(map) => {
            let mut out = NodeMap::new();
            for (key, child) in map {
                let segment = Segment::Key(key);
                let child = descend(child, path, &segment, visit);
                match visit(path, Some(&segment), child) {
                    Visit::Keep(value) => {
                        out.insert(segment.to_key_string(), value);
                    }
                    Visit::Rename(renamed, value) => {
                        out.insert(renamed.to_key_string(), value);
                    }
                    Visit::Drop => {}
                }
            }
            Node::Object(out)
        }
        Node::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, child) in items.into_iter().enumerate() {
                let segment = Segment::Index(index);
                let child = descend(child, path, &segment, visit);
                match visit(path, Some(&segment), child) {
                    Visit::Keep(value) | Visit::Rename(_, value) => out.push(value),
                    Visit::Drop => {}
                }
            }
            Node::Array(out)
        }
        scalar => scalar,
    }
}

fn descend<F>(child: Node, path: &mut Path, segment: &Segment, visit: &mut F) -> Node
where
    F: FnMut(&Path, Option<&Segment>, Node) -> Visit,
{
    path.push(segment.clone());
    let rebuilt = rebuild(child, path, visit);
    path.pop();
    rebuilt
}

/// Read-only post-order traversal of every node below the root.
pub fn visit_nodes<F>(tree: &Node, mut visit: F)
where
    F: FnMut(&Path, &Segment, &Node),
{
    let mut path = Path::root();
    visit_children(tree, &mut path, &mut visit);
}

fn visit_children<F>(node: &Node, path: &mut Path, visit: &mut F)
where
    F: FnMut(&Path, &Segment, &Node),
{
    let step = |segment: Segment, child: &Node, path: &mut Path, visit: &mut F| {
        path.push(segment.clone());
        visit_children(child, path, visit);
        path.pop();
        visit(path, &segment, child);
    };
    match node {
        Node::Object(map) => {
            for (key, child) in map {
                step(Segment::Key(key.clone()), child, path, visit);
            }
        }
        Node::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                step(Segment::Index(index), child, path, visit);
            }
        }
        _ => {}
    }
}
