//! Post-processing of `base#converter` key suffixes.

use recform_model::{FormatOptions, Node, Segment, is_scalar};
use recform_rules::Converters;

use crate::walk::{Visit, walk};

/// Separator between a key's base name and its converter suffix.
pub const SUFFIX_SEPARATOR: char = '#';

/// Splits `key` at its last `#` when both halves are non-empty.
pub fn split_suffix(key: &str) -> Option<(&str, &str)> {
    key.rsplit_once(SUFFIX_SEPARATOR)
        .filter(|(base, converter)| !base.is_empty() && !converter.is_empty())
}

/// Strips converter suffixes from every map key, converting scalar values
/// with the named converter on the way.
///
/// Unknown and skipped converters, ignored keys and non-scalar values only
/// lose the suffix. Conversion failures keep the original value.
pub fn formatize(tree: &Node, converters: &Converters, options: &FormatOptions) -> Node {
    walk(tree.clone(), |_, key, value| {
        let Some(Segment::Key(full)) = key else {
            return Visit::Keep(value);
        };
        let Some((base, converter)) = split_suffix(full) else {
            return Visit::Keep(value);
        };
        let renamed = Segment::Key(base.to_string());
        if options.ignores(base, full)
            || options.skips(converter)
            || !is_scalar(&value)
            || !converters.contains(converter)
        {
            return Visit::Rename(renamed, value);
        }
        Visit::Rename(renamed, converters.apply(converter, &value, options.silent))
    })
}

/// [`formatize`] with the built-in converters and default options.
pub fn formatize_default(tree: &Node) -> Node {
    formatize(tree, &Converters::default(), &FormatOptions::default())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn suffix_split() {
        assert_eq!(split_suffix("a#b"), Some(("a", "b")));
        assert_eq!(split_suffix("a#b#c"), Some(("a#b", "c")));
        assert_eq!(split_suffix("#b"), None);
        assert_eq!(split_suffix("a#"), None);
        assert_eq!(split_suffix("plain"), None);
    }

    #[test]
    fn converts_and_strips() {
        let tree = json!({
            "_:username#string": "L2174",
            "_:creation-date#unixtime": 1_114_819_200,
            "_:autobiography#string": {
                "_:body-text#string": "\n\n",
                "_:creation-date#isodate": "2005-04-30T00:00:00",
                "_:last-updated#isodate": "2005-05-01"
            },
            "_:idea#object": [
                {"_:url#url": "http://www.na.com/airbag_20active#1118115294", "_:title#string": "airbag active"}
            ]
        });
        assert_eq!(
            formatize_default(&tree),
            json!({
                "_:username": "L2174",
                "_:creation-date": "2005-04-30T00:00:00",
                "_:autobiography": {
                    "_:body-text": "\n\n",
                    "_:creation-date": "2005-04-30T00:00:00",
                    "_:last-updated": "2005-05-01T00:00:00"
                },
                "_:idea": [
                    {"_:url": "http://www.na.com/airbag_20active#1118115294", "_:title": "airbag active"}
                ]
            })
        );
    }

    #[test]
    fn ignore_skip_and_unknown() {
        let tree = json!({"a#integer": "7", "b#integer": "8", "c#nope": "9", "d#integer": "x"});
        let options = FormatOptions::new()
            .with_ignore(vec!["a".to_string()])
            .with_skip(vec!["nothing".to_string()])
            .with_silent(true);
        assert_eq!(
            formatize(&tree, &Converters::default(), &options),
            json!({"a": "7", "b": 8, "c": "9", "d": "x"})
        );

        let skipping = FormatOptions::new().with_skip(vec!["integer".to_string()]);
        assert_eq!(
            formatize(&json!({"b#integer": "8"}), &Converters::default(), &skipping),
            json!({"b": "8"})
        );
    }

    #[test]
    fn sequence_elements_are_untouched() {
        let tree = json!(["x#integer", {"k#integer": "1"}]);
        assert_eq!(formatize_default(&tree), json!(["x#integer", {"k": 1}]));
    }
}
