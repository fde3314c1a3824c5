//! Renaming keys to their aliases in another language.

use std::collections::HashMap;

use recform_model::{ConceptResolver, Node, Segment};
use tracing::debug;

use crate::walk::{Visit, walk};

/// Rewrites every map key that has a concept with an alias in `lang` to the
/// first such alias. Other keys pass through. Each distinct key is resolved
/// once per call.
pub fn translate(tree: &Node, lang: &str, resolver: &dyn ConceptResolver, refresh: bool) -> Node {
    let mut aliases: HashMap<String, Option<String>> = HashMap::new();
    walk(tree.clone(), |_, key, value| {
        let Some(Segment::Key(name)) = key else {
            return Visit::Keep(value);
        };
        let alias = aliases
            .entry(name.clone())
            .or_insert_with(|| {
                let alias = resolver
                    .resolve_concept(name, refresh)
                    .and_then(|concept| concept.alias(lang).map(str::to_string));
                if alias.is_none() {
                    debug!(key = %name, lang, "no alias");
                }
                alias
            })
            .clone();
        match alias {
            Some(alias) => Visit::Rename(Segment::Key(alias), value),
            None => Visit::Keep(value),
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use recform_model::Concept;
    use serde_json::json;

    use super::*;
    use crate::registry::StaticConceptResolver;

    fn concepts() -> StaticConceptResolver {
        StaticConceptResolver::from_node(&json!({
            "name": {"aliases": {"lt": ["vardas", "pavadinimas"], "de": ["Name"]}},
            "city": {"aliases": {"de": ["Stadt"]}}
        }))
        .unwrap()
    }

    #[test]
    fn first_alias_wins() {
        let tree = json!({"name": "Max", "address": {"city": "Vilnius"}, "list": [{"name": "x"}]});
        assert_eq!(
            translate(&tree, "lt", &concepts(), false),
            json!({"vardas": "Max", "address": {"city": "Vilnius"}, "list": [{"vardas": "x"}]})
        );
        assert_eq!(
            translate(&tree, "de", &concepts(), false),
            json!({"Name": "Max", "address": {"Stadt": "Vilnius"}, "list": [{"Name": "x"}]})
        );
    }

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl ConceptResolver for Counting {
        fn resolve_concept(&self, _key: &str, _refresh: bool) -> Option<Concept> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    #[test]
    fn keys_resolve_once() {
        let resolver = Counting::default();
        let tree = json!([{"a": 1}, {"a": 2}, {"a": 3, "b": 4}]);
        assert_eq!(translate(&tree, "lt", &resolver, true), tree);
        assert_eq!(resolver.calls.load(Ordering::Relaxed), 2);
    }
}
