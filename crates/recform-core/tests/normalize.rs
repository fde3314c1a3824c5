//! Tests for schema-driven normalization and templates.

use serde_json::json;

use recform_core::{MemoryTermRegistry, Normalizer, metaplate, normalize, template};
use recform_model::{Node, NormalizeOptions, Schema, TermRegistry};
use recform_rules::Converters;

fn people() -> Node {
    json!([
        {
            "address": {"number": 14, "street": "Leonardo str."},
            "children": [{"age": 1, "name": "Mike"}, {"age": 15, "name": "Tom"}],
            "name": "Max"
        },
        {
            "address": {"number": "1", "street": "Nexus str."},
            "children": [{"age": 1, "name": "Deli"}, {"age": 7, "name": "Miki"}],
            "name": "Dim"
        }
    ])
}

fn people_schema() -> Schema {
    Schema::from_node(&json!([{
        "_version": "domain.com/parents-0.1",
        "*": "https://www.wikidata.org/wiki/Q7565",
        "address": {
            "*": "https://www.wikidata.org/wiki/Q319608",
            "number": {"*": "https://www.wikidata.org/wiki/Q1413235|lambda _: int(_)"},
            "street": {"*": "https://www.wikidata.org/wiki/Q24574749"}
        },
        "children": [{
            "*": "https://www.wikidata.org/wiki/Q7569",
            "age": {"*": "https://www.wikidata.org/wiki/Q185836|lambda _: float(_)"},
            "name": {"*": "https://www.wikidata.org/wiki/Q82799"}
        }],
        "name": {"*": "https://www.wikidata.org/wiki/Q82799"}
    }]))
}

fn sample() -> Node {
    json!({"hello": 1.0, "world": 2, "how": ["is", {"are": {"you": "doing"}}]})
}

fn sample_schema() -> Schema {
    Schema::from_node(&json!({
        "*": "greeting",
        "hello": {"*": "length|lambda x: x+5."},
        "world": {"*": "atoms|lambda x: str(x)+'ABC'"},
        "how": [{"*": "method", "are": {"*": "yup", "you": {"*": "me|lambda x: '-'.join(list(x))"}}}]
    }))
}

// ============================================================================
// Normalization
// ============================================================================

#[test]
fn namespaced_terms() {
    let normalizer = Normalizer::new().with_options(NormalizeOptions::new().with_namespace(true));
    assert_eq!(
        normalizer.normalize(&people(), Some(&people_schema())),
        json!([
            {
                "WD:Q319608": {"WD:Q1413235": 14, "WD:Q24574749": "Leonardo str."},
                "WD:Q7569": [
                    {"WD:Q185836": 1.0, "WD:Q82799": "Mike"},
                    {"WD:Q185836": 15.0, "WD:Q82799": "Tom"}
                ],
                "WD:Q82799": "Max"
            },
            {
                "WD:Q319608": {"WD:Q1413235": 1, "WD:Q24574749": "Nexus str."},
                "WD:Q7569": [
                    {"WD:Q185836": 1.0, "WD:Q82799": "Deli"},
                    {"WD:Q185836": 7.0, "WD:Q82799": "Miki"}
                ],
                "WD:Q82799": "Dim"
            }
        ])
    );
}

#[test]
fn renames_and_lambdas() {
    assert_eq!(
        normalize(&sample(), &sample_schema()),
        json!({
            "atoms": "2ABC",
            "length": 6.0,
            "method": ["is", {"yup": {"me": "d-o-i-n-g"}}]
        })
    );
}

#[test]
fn custom_converters() {
    let schema = Schema::from_node(&json!({
        "*": "greeting",
        "hello": {"*": "length|converters.func"},
        "world": {"*": "atoms|lambda x: str(x)+'ABC'"},
        "how": [{"*": "method", "are": {"*": "yup", "you": {"*": "me|lambda x: '-'.join(list(x))"}}}]
    }));
    let converters = Converters::default().with("func", |value: &Node| {
        Ok(json!(f64::from(345 - 123) * value.as_f64().unwrap_or_default()))
    });
    let normalizer = Normalizer::new().with_converters(converters);
    assert_eq!(
        normalizer.normalize(&sample(), Some(&schema)),
        json!({
            "atoms": "2ABC",
            "length": 222.0,
            "method": ["is", {"yup": {"me": "d-o-i-n-g"}}]
        })
    );
}

#[test]
fn rules_nested_too_deeply_keep_the_value() {
    let rule = format!("lambda x: {}x{}", "(".repeat(10_000), ")".repeat(10_000));
    let schema = Schema::from_node(&json!({"n": {"*": format!("count|{rule}")}}));
    assert_eq!(normalize(&json!({"n": "7"}), &schema), json!({"count": "7"}));
}

#[test]
fn lookup_tables_and_truthiness() {
    let schema = Schema::from_node(&json!([{
        "id": {"*": "topic-id"},
        "type": {"*": "|lambda x: {0: \"NEED\", 1: \"GOAL\", 2: \"IDEA\", 3: \"PLAN\", 4: \"STEP\", 5: \"TASK\"}.get(x)"},
        "owner": {"username": {"*": ""}, "id": {"*": "user-id"}},
        "blockchain": {"*": "|lambda x: x and True or False"}
    }]));
    let topics = json!([
        {"id": 1, "type": 5, "owner": {"username": "mindey", "id": 7}, "blockchain": 0},
        {"id": 2, "type": 2, "owner": {"username": "ann", "id": 8}, "blockchain": 1}
    ]);
    assert_eq!(
        normalize(&topics, &schema),
        json!([
            {"topic-id": 1, "type": "TASK", "owner": {"username": "mindey", "user-id": 7}, "blockchain": false},
            {"topic-id": 2, "type": "IDEA", "owner": {"username": "ann", "user-id": 8}, "blockchain": true}
        ])
    );
}

#[test]
fn key_renaming_variants() {
    let data = json!({"A": 1});
    let plain = Schema::from_node(&json!({"A": {"*": "B"}}));
    let underscored = Schema::from_node(&json!({"A": {"*": "a_b"}}));
    let slugged = Normalizer::new().with_options(NormalizeOptions::new().with_slugify(true));

    assert_eq!(normalize(&data, &plain), json!({"B": 1}));
    assert_eq!(normalize(&data, &underscored), json!({"a_b": 1}));
    assert_eq!(slugged.normalize(&data, Some(&plain)), json!({"b": 1}));
    assert_eq!(slugged.normalize(&data, Some(&underscored)), json!({"a-b": 1}));
}

#[test]
fn slugged_terms_are_registered_once() {
    let registry = MemoryTermRegistry::new();
    let normalizer = Normalizer::new()
        .with_options(NormalizeOptions::new().with_slugify(true))
        .with_registry(&registry);
    let schema = Schema::from_node(&json!([{"name": {"*": "Full Name"}}]));
    let data = json!([{"name": "a"}, {"name": "b"}]);

    assert_eq!(
        normalizer.normalize(&data, Some(&schema)),
        json!([{"full-name": "a"}, {"full-name": "b"}])
    );
    assert_eq!(registry.len(), 1);
    let record = registry.lookup("full-name").unwrap();
    assert_eq!(record.url, "Full Name");
}

#[test]
fn record_directives_rename_only_map_entries() {
    let schema = Schema::from_node(&json!([{"*": "Person", "name": {"*": "full-name|lambda x: x.title()"}}]));
    assert_eq!(
        normalize(&json!([{"name": "max"}]), &schema),
        json!([{"full-name": "Max"}])
    );
    let nested = Schema::from_node(&json!({"people": [{"*": "Person", "name": {"*": "full-name"}}]}));
    assert_eq!(
        normalize(&json!({"people": [{"name": "max"}]}), &nested),
        json!({"Person": [{"full-name": "max"}]})
    );
}

// ============================================================================
// Templates
// ============================================================================

#[test]
fn edited_template_renames_one_field() {
    let data = json!({"a": [{"b": "c"}, {"e": "f"}, {"g": "h"}], "b": "something"});
    let mut tpl = template(&data);
    tpl["a"][0]["b"]["*"] = json!("hello");

    assert_eq!(
        normalize(&data, &Schema::from_node(&tpl)),
        json!({"a": [{"hello": "c"}, {"e": "f"}, {"g": "h"}], "b": "something"})
    );
}

#[test]
fn complex_template_with_slugs() {
    let data = json!({
        "fields": {
            "blockchain": 0,
            "body": ".:en\nThe estimated cost",
            "categories": [],
            "comment_count": 37,
            "created_date": "2012-10-14T11:43:11",
            "data": null,
            "is_draft": false,
            "parents": [32],
            "title": ".:en:Cost"
        },
        "model": "core.topic",
        "pk": 1
    });
    let mut tpl = template(&data);
    tpl["fields"]["blockchain"]["*"] = json!("HELLO");

    let normalizer = Normalizer::new().with_options(NormalizeOptions::new().with_slugify(true));
    let result = normalizer.normalize(&data, Some(&Schema::from_node(&tpl)));

    let mut expected = data.clone();
    let fields = expected["fields"].as_object_mut().unwrap();
    fields.remove("blockchain");
    fields.insert("hello".to_string(), json!(0));
    assert_eq!(result, expected);
}

#[test]
fn template_snapshot() {
    insta::assert_json_snapshot!(template(&sample()), @r###"
    {
      "*": "",
      "hello": {
        "*": ""
      },
      "how": [
        {
          "*": "",
          "are": {
            "you": {
              "*": ""
            }
          }
        }
      ],
      "world": {
        "*": ""
      }
    }
    "###);
    assert_ne!(metaplate(&sample()).to_node(), template(&sample()));
}
