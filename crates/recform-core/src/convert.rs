//! Applying one directive to one node.

use recform_model::{Node, Schema, Segment, TermRecord, is_scalar, slug};
use recform_rules::Rule;
use tracing::{debug, warn};

use crate::normalize::Normalizer;

impl Normalizer<'_> {
    /// Applies the directive of `schema` to a `(key, value)` pair.
    ///
    /// A schema level without a directive returns the pair unchanged. The
    /// term (after optional namespace shortening and slugging) replaces the
    /// key; the rule converts the value, keeping the original on failure.
    pub fn convert(&self, key: &Segment, value: Node, schema: &Schema) -> (Segment, Node) {
        let Some(directive) = schema.own_directive() else {
            return (key.clone(), value);
        };

        let term = directive.term().map(|term| self.canonical_term(term));
        let value = match directive.rule() {
            Some(rule) => self.apply_rule(rule, value),
            None => value,
        };
        let key = term.map_or_else(|| key.clone(), Segment::Key);
        (key, value)
    }

    fn canonical_term(&self, term: &str) -> String {
        let term = if self.options.namespace {
            self.shortener().shorten(term)
        } else {
            term.to_string()
        };
        if !self.options.slugify {
            return term;
        }

        let name = slug(&term);
        if let Some(registry) = self.registry {
            let record = TermRecord {
                name: name.clone(),
                url: term,
            };
            if let Err(error) = registry.register(record) {
                debug!(%error, term = %name, "term not registered");
            }
        }
        name
    }

    fn apply_rule(&self, source: &str, value: Node) -> Node {
        let converted = Rule::parse(source).and_then(|rule| rule.apply(&value, &self.converters));
        match converted {
            Ok(converted) => converted,
            Err(error) => {
                if is_scalar(&value) {
                    warn!(rule = source, value = %value, %error, "failed to convert value");
                }
                value
            }
        }
    }
}

/// Converts a single pair with default options and the built-in converters.
pub fn convert(key: &Segment, value: Node, schema: &Schema) -> (Segment, Node) {
    Normalizer::new().convert(key, value, schema)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn directive(raw: &str) -> Schema {
        Schema::from_node(&json!({ "*": raw }))
    }

    #[test]
    fn rename_and_convert() {
        let key = Segment::from("something");
        assert_eq!(
            convert(&key, json!("1,234"), &directive("IN:mindey/thing|lambda _: _.replace(',','')")),
            (Segment::from("IN:mindey/thing"), json!("1234"))
        );
        assert_eq!(
            convert(&key, json!("1,234"), &directive("term")),
            (Segment::from("term"), json!("1,234"))
        );
        assert_eq!(
            convert(&key, json!("7"), &directive("|lambda x: int(x)")),
            (key.clone(), json!(7))
        );
        assert_eq!(
            convert(&key, json!(1), &Schema::from_node(&json!({"other": 1}))),
            (key.clone(), json!(1))
        );
    }

    #[test]
    fn failed_rules_keep_the_value() {
        let key = Segment::from("k");
        assert_eq!(
            convert(&key, json!("abc"), &directive("n|lambda x: int(x)")),
            (Segment::from("n"), json!("abc"))
        );
        assert_eq!(
            convert(&key, json!({"a": 1}), &directive("|lambda x: x.upper()")),
            (key.clone(), json!({"a": 1}))
        );
        assert_eq!(
            convert(&key, json!(1), &directive("|lambda x: (")),
            (key.clone(), json!(1))
        );
    }

    #[test]
    fn namespace_then_slug() {
        let normalizer = Normalizer::new().with_options(
            recform_model::NormalizeOptions::new()
                .with_namespace(true)
                .with_slugify(true),
        );
        let (key, _) = normalizer.convert(
            &Segment::from("k"),
            json!(1),
            &directive("https://www.wikidata.org/wiki/Q82799"),
        );
        assert_eq!(key, Segment::from("wd-q82799"));
    }
}
