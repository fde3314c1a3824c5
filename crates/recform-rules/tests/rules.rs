//! Tests for rule parsing and evaluation.

use proptest::prelude::*;
use serde_json::json;

use recform_model::Node;
use recform_rules::{ConversionError, Converters, Rule, apply_rule};

fn run(source: &str, value: Node) -> Node {
    apply_rule(source, &value, &Converters::default())
        .unwrap_or_else(|error| panic!("{source}: {error}"))
}

#[test]
fn string_cleanup_lambdas() {
    assert_eq!(run("lambda _: _.replace(',','')", json!("1,234")), json!("1234"));
    assert_eq!(run("lambda x: x.title()", json!("max mustermann")), json!("Max Mustermann"));
    assert_eq!(run("lambda x: x.strip().upper()", json!("  ok ")), json!("OK"));
    assert_eq!(
        run("lambda x: \"-\".join(list(x))", json!("abc")),
        json!("a-b-c")
    );
    assert_eq!(run("lambda x: x.split(',')", json!("a,b")), json!(["a", "b"]));
}

#[test]
fn numeric_casts_and_arithmetic() {
    assert_eq!(run("lambda _: int(_)", json!("42")), json!(42));
    assert_eq!(run("lambda _: float(_)", json!("4.5")), json!(4.5));
    assert_eq!(run("lambda x: x+5.", json!(1.0)), json!(6.0));
    assert_eq!(run("lambda x: x+5", json!(1)), json!(6));
    assert_eq!(run("lambda x: x / 2", json!(3)), json!(1.5));
    assert_eq!(run("lambda x: x // 2", json!(7)), json!(3));
    assert_eq!(run("lambda x: -x % 3", json!(7)), json!(2));
    assert_eq!(run("lambda x: round(x, 1)", json!(2.26)), json!(2.3));
    assert_eq!(run("lambda x: max(x)", json!([3, 9, 2])), json!(9));
    assert_eq!(run("lambda x: min(x, 0)", json!(-4)), json!(-4));
}

#[test]
fn str_uses_keyword_spelling() {
    assert_eq!(run("lambda x: str(x)+\"ABC\"", json!(1.0)), json!("1.0ABC"));
    assert_eq!(run("lambda x: str(x)", json!(true)), json!("True"));
    assert_eq!(run("lambda x: str(x)", json!(null)), json!("None"));
}

#[test]
fn boolean_operators_return_operands() {
    assert_eq!(run("lambda x: x and True or False", json!(1)), json!(true));
    assert_eq!(run("lambda x: x and True or False", json!(0)), json!(false));
    assert_eq!(run("lambda x: x or 'default'", json!("")), json!("default"));
    assert_eq!(run("lambda x: 'yes' if x > 3 else 'no'", json!(4)), json!("yes"));
    assert_eq!(run("lambda x: not x", json!([])), json!(true));
    assert_eq!(run("lambda x: 0 < x < 10", json!(5)), json!(true));
    assert_eq!(run("lambda x: 0 < x < 10", json!(10)), json!(false));
}

#[test]
fn dict_lookups_stringify_keys() {
    let rule = "lambda x: {0: \"NEED\", 1: \"GOAL\", 2: \"IDEA\"}.get(x)";
    assert_eq!(run(rule, json!(0)), json!("NEED"));
    assert_eq!(run(rule, json!(2)), json!("IDEA"));
    assert_eq!(run(rule, json!(7)), json!(null));
    assert_eq!(run("lambda x: x['name']", json!({"name": "Max"})), json!("Max"));
    assert_eq!(run("lambda x: 'a' in x", json!({"a": 1})), json!(true));
    assert_eq!(run("lambda x: x not in [1, 2]", json!(3)), json!(true));
}

#[test]
fn named_converters() {
    let mut converters = Converters::default();
    converters.register("func", |value: &Node| {
        apply_rule("lambda x: (345-123)*x", value, &Converters::empty())
    });

    let rule = Rule::parse("converters.func").unwrap();
    assert_eq!(rule.converter_name(), Some("func"));
    assert_eq!(rule.apply(&json!(1.0), &converters).unwrap(), json!(222.0));

    let integer = Rule::parse("integer").unwrap();
    assert_eq!(integer.apply(&json!("12"), &converters).unwrap(), json!(12));

    let nested = Rule::parse("lambda x: converters.func(x) + 1").unwrap();
    assert_eq!(nested.apply(&json!(1), &converters).unwrap(), json!(223));
    let bare = Rule::parse("lambda x: isodate(x)").unwrap();
    assert_eq!(
        bare.apply(&json!("2005-04-30"), &converters).unwrap(),
        json!("2005-04-30T00:00:00")
    );
}

#[test]
fn failures_are_errors_not_panics() {
    let converters = Converters::default();
    assert!(matches!(
        apply_rule("lambda x: y", &json!(1), &converters),
        Err(ConversionError::UnknownName(name)) if name == "y"
    ));
    assert!(matches!(
        apply_rule("nope", &json!(1), &converters),
        Err(ConversionError::UnknownConverter(_))
    ));
    assert!(matches!(
        apply_rule("lambda x: int(x)", &json!({"a": 1}), &converters),
        Err(ConversionError::Argument { .. })
    ));
    assert!(matches!(
        apply_rule("lambda x: x.nope()", &json!("s"), &converters),
        Err(ConversionError::NoMethod { .. })
    ));
    assert!(matches!(
        apply_rule("lambda x: x +", &json!(1), &converters),
        Err(ConversionError::Syntax { .. })
    ));
    assert!(apply_rule("lambda x: x / 0", &json!(1), &converters).is_err());
    assert!(apply_rule("lambda x: x - 'a'", &json!(1), &converters).is_err());
}

#[test]
fn deeply_nested_rules_are_rejected() {
    let converters = Converters::default();
    let deep = format!("lambda x: {}x{}", "(".repeat(10_000), ")".repeat(10_000));
    let error = apply_rule(&deep, &json!(1), &converters).unwrap_err();
    assert!(error.to_string().contains("rule nested too deeply"), "{error}");

    let long = format!("lambda x: x{}", " + 1".repeat(10_000));
    assert!(matches!(
        Rule::parse(&long),
        Err(ConversionError::Syntax { .. })
    ));

    assert_eq!(run("lambda x: ((((x + 1) * 2)))", json!(1)), json!(4));
}

#[test]
fn rules_display_their_source() {
    let rule: Rule = " lambda x: x ".parse().unwrap();
    assert_eq!(rule.to_string(), "lambda x: x");
    assert_eq!(rule.source(), "lambda x: x");
    assert_eq!(rule.converter_name(), None);
}

proptest! {
    #[test]
    fn identity_lambda_returns_its_input(text in ".*", number in any::<i64>()) {
        let converters = Converters::default();
        prop_assert_eq!(apply_rule("lambda v: v", &json!(text), &converters).unwrap(), json!(text));
        prop_assert_eq!(apply_rule("lambda v: v", &json!(number), &converters).unwrap(), json!(number));
    }

    #[test]
    fn int_of_str_round_trips(number in any::<i64>()) {
        let converters = Converters::default();
        prop_assert_eq!(
            apply_rule("lambda v: int(str(v))", &json!(number), &converters).unwrap(),
            json!(number)
        );
    }

    #[test]
    fn arbitrary_sources_never_panic(source in "[a-z0-9 +*/().:,'\\[\\]{}=<>-]{0,24}") {
        let _ = apply_rule(&source, &json!(1), &Converters::default());
    }
}
