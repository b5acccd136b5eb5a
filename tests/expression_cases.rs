//! Expression Language Cases
//!
//! Table-driven checks of the restricted expression grammar:
//! - Operator semantics follow Python rules (floor division, chaining, truthiness)
//! - Names resolve only against the supplied scope
//! - Failures are classified as syntax or runtime with a category

use pqlmock::expr::{Expression, RuntimeCategory};
use rstest::rstest;
use serde_json::{json, Map, Value};

fn scope() -> Map<String, Value> {
    let mut vars = Map::new();
    vars.insert("page".into(), json!(3));
    vars.insert("limit".into(), json!(20));
    vars.insert("it".into(), json!({"id": 7, "tags": ["a", "b"], "parent": null}));
    vars.insert("query".into(), json!({"q": "abc"}));
    vars
}

#[rstest]
#[case("1 + 2 * 3", json!(7))]
#[case("2 ** 3 ** 2", json!(512))]
#[case("7 // 2", json!(3))]
#[case("-7 // 2", json!(-4))]
#[case("-7 % 3", json!(2))]
#[case("7 / 2", json!(3.5))]
#[case("(page-1)*limit", json!(40))]
#[case("'ab' + 'c'", json!("abc"))]
#[case("[1, 2, 3][-1]", json!(3))]
#[case("[1, 2, 3, 4][1:3]", json!([2, 3]))]
#[case("[1, 2, 3, 4][::-1]", json!([4, 3, 2, 1]))]
#[case("[1, 2, 3][5:]", json!([]))]
#[case("1 < 2 < 3", json!(true))]
#[case("3 > 2 > 2", json!(false))]
#[case("2 in [1, 2]", json!(true))]
#[case("'x' not in 'abc'", json!(true))]
#[case("None is None", json!(true))]
#[case("0 or 'y'", json!("y"))]
#[case("[] and 1", json!([]))]
#[case("1 if False else 2", json!(2))]
#[case("True + 1", json!(2))]
#[case("1 == 1.0", json!(true))]
#[case("len({'a': 1})", json!(1))]
#[case("max(3, 9, 4)", json!(9))]
#[case("str(12)", json!("12"))]
#[case("it['id']", json!(7))]
#[case("it.id + 1", json!(8))]
#[case("len(it['tags'])", json!(2))]
#[case("not it['parent']", json!(true))]
#[case("query['q'][1:]", json!("bc"))]
#[case("[1, 2, 3][1::9223372036854775807]", json!([2]))]
#[case("'abc'[::-9223372036854775807]", json!("c"))]
fn test_evaluates(#[case] source: &str, #[case] expected: Value) {
    let expr = Expression::compile(source).unwrap();
    assert_eq!(expr.evaluate(&scope()).unwrap(), expected, "{}", source);
}

#[rstest]
#[case("it[")]
#[case("1 +")]
#[case("open('f')")]
#[case("''.join([])")]
#[case("a b")]
#[case("")]
fn test_syntax_errors(#[case] source: &str) {
    let err = Expression::compile(source).unwrap_err();
    assert!(err.is_syntax(), "{}: {}", source, err);
}

#[rstest]
#[case("missing", RuntimeCategory::NameError)]
#[case("1 / 0", RuntimeCategory::ZeroDivisionError)]
#[case("it['nope']", RuntimeCategory::KeyError)]
#[case("it['tags'][5]", RuntimeCategory::IndexError)]
#[case("int('z')", RuntimeCategory::ValueError)]
#[case("len(1)", RuntimeCategory::TypeError)]
#[case("1 < 'a'", RuntimeCategory::TypeError)]
#[case("it.nope", RuntimeCategory::AttributeError)]
#[case("[1][::0]", RuntimeCategory::ValueError)]
fn test_runtime_errors(#[case] source: &str, #[case] category: RuntimeCategory) {
    let expr = Expression::compile(source).unwrap();
    let err = expr.evaluate(&scope()).unwrap_err();
    assert_eq!(err.category(), Some(category), "{}", source);
}

#[test]
fn test_deep_nesting_is_syntax_error() {
    let source = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
    let err = Expression::compile(&source).unwrap_err();
    assert!(err.is_syntax());
    assert!(err.to_string().contains("nested too deeply"));
}
