//! Integration tests for the filter grammar.
//!
//! Parses expressions through the public API and evaluates them against
//! connector objects, in both the attribute and the field-pointer forms.

use idgate_connector::prelude::*;

// =============================================================================
// Test Helpers
// =============================================================================

fn person(name: &str, age: i64, mail: Option<&str>) -> ConnectorObject {
    let builder = ConnectorObject::builder(ObjectClass::account())
        .with_uid(Uid::new(format!("u-{name}")))
        .with_name(name)
        .with("givenName", name)
        .with("age", age);
    let builder = match mail {
        Some(mail) => builder.with("mail", mail),
        None => builder,
    };
    builder.build().unwrap()
}

fn people() -> Vec<ConnectorObject> {
    vec![
        person("bob", 42, Some("bob@example.com")),
        person("carl", 17, None),
        person("joanne", 19, Some("jo@example.org")),
        person("jon", 65, Some("jon@example.com")),
    ]
}

fn matching(expression: &str) -> Vec<String> {
    let filter = Filter::parse(expression).unwrap();
    people()
        .into_iter()
        .filter(|p| filter.accept(p).unwrap())
        .map(|p| p.name().unwrap_or_default().to_string())
        .collect()
}

fn pointer(expression: &str) -> QueryFilter<JsonPointer> {
    parse_query_filter(expression).unwrap()
}

// =============================================================================
// Evaluation
// =============================================================================

#[test]
fn test_starts_with_over_population() {
    assert_eq!(matching(r#"__NAME__ sw "b""#), vec!["bob"]);
}

#[test]
fn test_combined_expression() {
    assert_eq!(
        matching(r#"(givenName co "jo" and ! (age ge 21))"#),
        vec!["joanne"]
    );
    assert_eq!(
        matching(r#"givenName co "jo" or age lt 18"#),
        vec!["carl", "joanne", "jon"]
    );
}

#[test]
fn test_present_and_absent_attributes() {
    assert_eq!(matching("mail pr"), vec!["bob", "joanne", "jon"]);
    assert_eq!(matching("! (mail pr)"), vec!["carl"]);
    assert!(matching(r#"nickname eq "bob""#).is_empty());
}

#[test]
fn test_ends_with_extension() {
    assert_eq!(matching(r#"mail ew "example.com""#), vec!["bob", "jon"]);
}

#[test]
fn test_boolean_literals() {
    assert_eq!(matching("true").len(), 4);
    assert!(matching("false").is_empty());
}

#[test]
fn test_string_operator_on_number_is_error() {
    let filter = Filter::parse(r#"age co "4""#).unwrap();
    let err = filter.accept(&people()[0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAttributeValue);
}

// =============================================================================
// Text Form
// =============================================================================

#[test]
fn test_display_reparses_to_same_filter() {
    for expression in [
        r#"(givenName co "jo" and ! (age ge 21))"#,
        r#"__NAME__ sw "b" or mail pr"#,
        r#"a eq "x" and (b eq "y" or c lt 3)"#,
        r#"title eq "say \"hi\"""#,
        "active eq true",
    ] {
        let filter = Filter::parse(expression).unwrap();
        let reparsed = Filter::parse(&filter.to_string()).unwrap();
        assert_eq!(reparsed, filter, "{expression}");
    }
}

#[test]
fn test_pointer_filter_evaluates_simple_fields() {
    let filter = pointer(r#"/givenName sw "jo" and /age gt 20"#);
    let matched: Vec<bool> = people()
        .iter()
        .map(|p| filter.accept(p).unwrap())
        .collect();
    assert_eq!(matched, vec![false, false, false, true]);
}

#[test]
fn test_pointer_filter_nested_path_never_matches() {
    let filter = pointer(r#"/manager/name eq "bob""#);
    assert!(!filter.accept(&people()[0]).unwrap());
}

// =============================================================================
// Composite Algebra
// =============================================================================

#[test]
fn test_left_and_right_of_and() {
    let filter = Filter::parse("a pr and b pr and c pr").unwrap();
    assert_eq!(filter.left(), Some(Filter::present("a")));
    assert_eq!(
        filter.right(),
        Some(Filter::and(vec![Filter::present("b"), Filter::present("c")]))
    );
}

#[test]
fn test_right_of_or_stays_or() {
    let filter = Filter::parse("a pr or b pr or c pr").unwrap();
    assert_eq!(
        filter.right(),
        Some(Filter::or(vec![Filter::present("b"), Filter::present("c")]))
    );

    let pair = Filter::parse("a pr or b pr").unwrap();
    assert_eq!(pair.right(), Some(Filter::present("b")));
}

#[test]
fn test_leaf_has_no_operands() {
    let filter = Filter::parse("a pr").unwrap();
    assert!(filter.left().is_none());
    assert!(filter.right().is_none());
}

// =============================================================================
// Grammar Violations
// =============================================================================

#[test]
fn test_deep_nesting_is_rejected() {
    let depth = 257;
    let expression = format!("{}a pr{}", "(".repeat(depth), ")".repeat(depth));
    assert!(matches!(
        Filter::parse(&expression),
        Err(FilterParseError::TooDeeplyNested { .. })
    ));

    let negations = format!("{}a pr{}", "! (".repeat(depth), ")".repeat(depth));
    assert!(matches!(
        Filter::parse(&negations),
        Err(FilterParseError::TooDeeplyNested { .. })
    ));
}

#[test]
fn test_malformed_expressions() {
    for expression in [
        "",
        "a",
        "a eq",
        r#"a eq "open"#,
        "(a pr",
        "a pr)",
        "a pr and",
        r#"a eq "x" b"#,
    ] {
        assert!(Filter::parse(expression).is_err(), "{expression:?} parsed");
    }
}
