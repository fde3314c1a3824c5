//! Deriving schema templates from sample data.

use std::collections::BTreeMap;

use recform_model::{Directive, Node, Schema};

/// Derives a schema skeleton with the shape of `sample`.
///
/// Every map and every scalar gets an empty directive. Sequences collapse to
/// one representative element whose fields are the union of all element
/// fields, later elements winning.
pub fn metaplate(sample: &Node) -> Schema {
    match sample {
        Node::Object(map) => Schema::Map {
            directive: Some(Directive::default()),
            fields: map
                .iter()
                .map(|(key, value)| (key.clone(), metaplate(value)))
                .collect(),
        },
        Node::Array(items) => Schema::Seq(Some(Box::new(representative(items)))),
        _ => Schema::directive(Directive::default()),
    }
}

/// Template in document form (`*` keys), ready to be edited and saved.
///
/// Same skeleton as [`metaplate`], except that maps nested inside a sequence
/// element carry no `*`. The element itself and every leaf keep theirs.
pub fn template(sample: &Node) -> Node {
    let mut schema = metaplate(sample);
    clear_nested_directives(&mut schema, false);
    schema.to_node()
}

fn clear_nested_directives(schema: &mut Schema, in_element: bool) {
    match schema {
        Schema::Map { directive, fields } => {
            if in_element && !fields.is_empty() {
                *directive = None;
            }
            for child in fields.values_mut() {
                clear_nested_directives(child, in_element);
            }
        }
        Schema::Seq(Some(element)) => match element.as_mut() {
            Schema::Map { fields, .. } => {
                for child in fields.values_mut() {
                    clear_nested_directives(child, true);
                }
            }
            nested => clear_nested_directives(nested, in_element),
        },
        Schema::Seq(None) | Schema::Leaf(_) => {}
    }
}

fn representative(items: &[Node]) -> Schema {
    let mut fields = BTreeMap::new();
    let mut nested = None;
    for item in items {
        match metaplate(item) {
            Schema::Map {
                fields: element, ..
            } => fields.extend(element),
            sequence @ Schema::Seq(_) => nested = Some(sequence),
            Schema::Leaf(_) => {}
        }
    }
    match nested {
        Some(sequence) if fields.is_empty() && items.iter().all(Node::is_array) => sequence,
        _ => Schema::Map {
            directive: Some(Directive::default()),
            fields,
        },
    }
}
