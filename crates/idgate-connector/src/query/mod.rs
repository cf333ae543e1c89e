//! Field-based query filters
//!
//! [`QueryFilter`] is the filter variant whose comparisons name a field
//! reference (by default a [`JsonPointer`]) rather than carrying a whole
//! attribute. It shares the grammar, the composite normalization rules and
//! the visitor protocol with the attribute-based [`crate::filter::Filter`].

mod parser;
mod pointer;
mod visitor;

use std::cmp::Ordering;
use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{ConnectorError, ConnectorResult};
use crate::objects::{AttributeValue, ConnectorObject};

pub use parser::{parse_query_filter, FilterParseError, FilterParser, MAX_FILTER_DEPTH};
pub use pointer::JsonPointer;
pub use visitor::QueryFilterVisitor;

/// Comparison operator of a [`QueryFilter::Comparison`] node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Equals,
    Contains,
    StartsWith,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    /// A resource-specific operator outside the core set.
    Extended(String),
}

impl ComparisonOperator {
    /// Resolve an operator name; names outside the core set become
    /// [`ComparisonOperator::Extended`].
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "eq" => ComparisonOperator::Equals,
            "co" => ComparisonOperator::Contains,
            "sw" => ComparisonOperator::StartsWith,
            "gt" => ComparisonOperator::GreaterThan,
            "ge" => ComparisonOperator::GreaterThanOrEqual,
            "lt" => ComparisonOperator::LessThan,
            "le" => ComparisonOperator::LessThanOrEqual,
            _ => ComparisonOperator::Extended(name.to_string()),
        }
    }

    /// The grammar name of this operator.
    pub fn name(&self) -> &str {
        match self {
            ComparisonOperator::Equals => "eq",
            ComparisonOperator::Contains => "co",
            ComparisonOperator::StartsWith => "sw",
            ComparisonOperator::GreaterThan => "gt",
            ComparisonOperator::GreaterThanOrEqual => "ge",
            ComparisonOperator::LessThan => "lt",
            ComparisonOperator::LessThanOrEqual => "le",
            ComparisonOperator::Extended(name) => name,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Variant of a [`QueryFilter`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryFilterKind {
    And,
    Or,
    Not,
    Boolean,
    Comparison,
    Present,
}

impl QueryFilterKind {
    #[must_use]
    pub fn all() -> &'static [QueryFilterKind] {
        &[
            QueryFilterKind::And,
            QueryFilterKind::Or,
            QueryFilterKind::Not,
            QueryFilterKind::Boolean,
            QueryFilterKind::Comparison,
            QueryFilterKind::Present,
        ]
    }
}

/// An immutable field-based filter expression.
///
/// Build trees with the constructor functions: [`QueryFilter::and`] and
/// [`QueryFilter::or`] normalize zero children to a boolean literal and a
/// single child to that child.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter<F = JsonPointer> {
    And(Vec<QueryFilter<F>>),
    Or(Vec<QueryFilter<F>>),
    Not(Box<QueryFilter<F>>),
    BooleanLiteral(bool),
    Comparison {
        field: F,
        operator: ComparisonOperator,
        value: AttributeValue,
    },
    Present {
        field: F,
    },
}

/// Something a filter can be evaluated against.
pub trait FilterCandidate<F> {
    /// Values of the referenced field, or `None` if the field is absent.
    fn field_values(&self, field: &F) -> Option<&[AttributeValue]>;
}

impl FilterCandidate<JsonPointer> for ConnectorObject {
    fn field_values(&self, field: &JsonPointer) -> Option<&[AttributeValue]> {
        if !field.is_simple() {
            return None;
        }
        self.attribute_by_name(field.leaf()?).map(|a| a.values())
    }
}

impl FilterCandidate<String> for ConnectorObject {
    fn field_values(&self, field: &String) -> Option<&[AttributeValue]> {
        self.attribute_by_name(field).map(|a| a.values())
    }
}

impl<F> QueryFilter<F> {
    /// Conjunction of `children`.
    pub fn and(mut children: Vec<QueryFilter<F>>) -> Self {
        match children.len() {
            0 => QueryFilter::BooleanLiteral(true),
            1 => children.remove(0),
            _ => QueryFilter::And(children),
        }
    }

    /// Disjunction of `children`.
    pub fn or(mut children: Vec<QueryFilter<F>>) -> Self {
        match children.len() {
            0 => QueryFilter::BooleanLiteral(false),
            1 => children.remove(0),
            _ => QueryFilter::Or(children),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(child: QueryFilter<F>) -> Self {
        QueryFilter::Not(Box::new(child))
    }

    pub fn always_true() -> Self {
        QueryFilter::BooleanLiteral(true)
    }

    pub fn always_false() -> Self {
        QueryFilter::BooleanLiteral(false)
    }

    pub fn comparison(
        field: F,
        operator: ComparisonOperator,
        value: impl Into<AttributeValue>,
    ) -> Self {
        QueryFilter::Comparison {
            field,
            operator,
            value: value.into(),
        }
    }

    pub fn equal_to(field: F, value: impl Into<AttributeValue>) -> Self {
        Self::comparison(field, ComparisonOperator::Equals, value)
    }

    pub fn contains(field: F, value: impl Into<AttributeValue>) -> Self {
        Self::comparison(field, ComparisonOperator::Contains, value)
    }

    pub fn starts_with(field: F, value: impl Into<AttributeValue>) -> Self {
        Self::comparison(field, ComparisonOperator::StartsWith, value)
    }

    pub fn greater_than(field: F, value: impl Into<AttributeValue>) -> Self {
        Self::comparison(field, ComparisonOperator::GreaterThan, value)
    }

    pub fn greater_than_or_equal_to(field: F, value: impl Into<AttributeValue>) -> Self {
        Self::comparison(field, ComparisonOperator::GreaterThanOrEqual, value)
    }

    pub fn less_than(field: F, value: impl Into<AttributeValue>) -> Self {
        Self::comparison(field, ComparisonOperator::LessThan, value)
    }

    pub fn less_than_or_equal_to(field: F, value: impl Into<AttributeValue>) -> Self {
        Self::comparison(field, ComparisonOperator::LessThanOrEqual, value)
    }

    pub fn extended(
        field: F,
        operator: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        Self::comparison(field, ComparisonOperator::Extended(operator.into()), value)
    }

    pub fn present(field: F) -> Self {
        QueryFilter::Present { field }
    }

    /// The variant of this node.
    #[must_use]
    pub fn kind(&self) -> QueryFilterKind {
        match self {
            QueryFilter::And(_) => QueryFilterKind::And,
            QueryFilter::Or(_) => QueryFilterKind::Or,
            QueryFilter::Not(_) => QueryFilterKind::Not,
            QueryFilter::BooleanLiteral(_) => QueryFilterKind::Boolean,
            QueryFilter::Comparison { .. } => QueryFilterKind::Comparison,
            QueryFilter::Present { .. } => QueryFilterKind::Present,
        }
    }
}

impl<F: Clone> QueryFilter<F> {
    /// First operand of a composite.
    pub fn left(&self) -> Option<QueryFilter<F>> {
        match self {
            QueryFilter::And(children) | QueryFilter::Or(children) => children.first().cloned(),
            _ => None,
        }
    }

    /// Everything after the first operand of a composite, as a composite of
    /// the same kind (or the plain second child when there are two).
    pub fn right(&self) -> Option<QueryFilter<F>> {
        match self {
            QueryFilter::And(children) if children.len() > 1 => {
                Some(QueryFilter::and(children[1..].to_vec()))
            }
            QueryFilter::Or(children) if children.len() > 1 => {
                Some(QueryFilter::or(children[1..].to_vec()))
            }
            _ => None,
        }
    }
}

impl<F: fmt::Display> QueryFilter<F> {
    /// The grammar text of this filter.
    ///
    /// Unlike `to_string()`, fails when a value has no literal form, so the
    /// returned text always parses back to an equal filter.
    pub fn to_expression(&self) -> ConnectorResult<String> {
        self.check_literals()?;
        Ok(self.to_string())
    }

    fn check_literals(&self) -> ConnectorResult<()> {
        match self {
            QueryFilter::And(children) | QueryFilter::Or(children) => {
                children.iter().try_for_each(QueryFilter::check_literals)
            }
            QueryFilter::Not(child) => child.check_literals(),
            QueryFilter::Comparison { value, .. } => check_literal(value),
            QueryFilter::BooleanLiteral(_) | QueryFilter::Present { .. } => Ok(()),
        }
    }

    /// Evaluate this filter against a candidate.
    ///
    /// A comparison matches when any value of the field satisfies it; an
    /// absent field never matches. String operators on non-string values and
    /// ordering operators on incomparable values are errors, as are extended
    /// operators, which only the target system can evaluate.
    pub fn accept<C>(&self, candidate: &C) -> ConnectorResult<bool>
    where
        C: FilterCandidate<F> + ?Sized,
    {
        match self {
            QueryFilter::And(children) => {
                for child in children {
                    if !child.accept(candidate)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            QueryFilter::Or(children) => {
                for child in children {
                    if child.accept(candidate)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            QueryFilter::Not(child) => Ok(!child.accept(candidate)?),
            QueryFilter::BooleanLiteral(value) => Ok(*value),
            QueryFilter::Present { field } => Ok(candidate
                .field_values(field)
                .is_some_and(|values| !values.is_empty())),
            QueryFilter::Comparison {
                field,
                operator,
                value,
            } => {
                let Some(values) = candidate.field_values(field) else {
                    return Ok(false);
                };
                for candidate_value in values {
                    if comparison_matches(field, operator, candidate_value, value)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

fn comparison_matches(
    field: &dyn fmt::Display,
    operator: &ComparisonOperator,
    actual: &AttributeValue,
    expected: &AttributeValue,
) -> ConnectorResult<bool> {
    match operator {
        ComparisonOperator::Equals => Ok(match actual.compare(expected) {
            Some(ordering) => ordering == Ordering::Equal,
            None => actual == expected,
        }),
        ComparisonOperator::Contains | ComparisonOperator::StartsWith => {
            let needle = expected.as_string().ok_or_else(|| {
                ConnectorError::illegal_argument(format!(
                    "operator '{operator}' on '{field}' requires a string value"
                ))
            })?;
            let haystack = actual.as_string().ok_or_else(|| {
                ConnectorError::invalid_attribute_value(format!(
                    "field '{field}' holds a {} value, operator '{operator}' requires a string",
                    actual.value_type()
                ))
            })?;
            Ok(match operator {
                ComparisonOperator::Contains => haystack.contains(needle),
                _ => haystack.starts_with(needle),
            })
        }
        ComparisonOperator::GreaterThan
        | ComparisonOperator::GreaterThanOrEqual
        | ComparisonOperator::LessThan
        | ComparisonOperator::LessThanOrEqual => {
            let ordering = actual.compare(expected).ok_or_else(|| {
                ConnectorError::invalid_attribute_value(format!(
                    "field '{field}' value of type {} is not comparable with {}",
                    actual.value_type(),
                    expected.value_type()
                ))
            })?;
            Ok(match operator {
                ComparisonOperator::GreaterThan => ordering == Ordering::Greater,
                ComparisonOperator::GreaterThanOrEqual => ordering != Ordering::Less,
                ComparisonOperator::LessThan => ordering == Ordering::Less,
                _ => ordering != Ordering::Greater,
            })
        }
        ComparisonOperator::Extended(name) => Err(ConnectorError::illegal_argument(format!(
            "extended operator '{name}' cannot be evaluated locally"
        ))),
    }
}

/// Prefix of a byte array literal; the rest is standard base64.
pub(crate) const BYTES_PREFIX: &str = "base64:";

/// Prefix of a character literal; the rest is the hex code point.
pub(crate) const CHARACTER_PREFIX: &str = "U+";

/// Write a value as a grammar literal.
///
/// Strings are quoted with `"` and `\` escaped; `i64` and `f64` numbers and
/// booleans are bare. Every other type uses its typed literal form (see
/// [`parse_query_filter`]) so the text parses back to the same type.
/// Guarded strings have no literal form and are written redacted.
pub(crate) fn write_literal(f: &mut fmt::Formatter<'_>, value: &AttributeValue) -> fmt::Result {
    match value {
        AttributeValue::String(s) => write_quoted(f, s),
        AttributeValue::Character(c) => write!(f, "{CHARACTER_PREFIX}{:04X}", u32::from(*c)),
        AttributeValue::Integer(i) => write!(f, "{i}i32"),
        AttributeValue::Long(l) => write!(f, "{l}"),
        AttributeValue::BigInteger(b) => write!(f, "{b}n"),
        AttributeValue::BigDecimal(d) => write!(f, "{d}m"),
        AttributeValue::Float(x) => {
            write_floating(f, &x.to_string())?;
            f.write_str("f32")
        }
        AttributeValue::Double(x) => write_floating(f, &x.to_string()),
        AttributeValue::Boolean(b) => write!(f, "{b}"),
        AttributeValue::Bytes(bytes) => write!(f, "{BYTES_PREFIX}{}", STANDARD.encode(bytes)),
        AttributeValue::GuardedString(_) => write_quoted(f, "****"),
    }
}

/// Fail for values whose text form does not parse back.
pub(crate) fn check_literal(value: &AttributeValue) -> ConnectorResult<()> {
    match value {
        AttributeValue::GuardedString(_) => Err(ConnectorError::illegal_argument(
            "guarded string values have no filter literal",
        )),
        _ => Ok(()),
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        if c == '"' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("\"")
}

fn write_floating(f: &mut fmt::Formatter<'_>, rendered: &str) -> fmt::Result {
    match rendered {
        "NaN" => f.write_str("NaN"),
        "inf" => f.write_str("Infinity"),
        "-inf" => f.write_str("-Infinity"),
        digits => {
            f.write_str(digits)?;
            if !digits.contains('.') {
                f.write_str(".0")?;
            }
            Ok(())
        }
    }
}

pub(crate) fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    children: &[T],
    keyword: &str,
) -> fmt::Result {
    f.write_str("(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {keyword} ")?;
        }
        write!(f, "{child}")?;
    }
    f.write_str(")")
}

impl<F: fmt::Display> fmt::Display for QueryFilter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryFilter::And(children) if children.is_empty() => f.write_str("true"),
            QueryFilter::Or(children) if children.is_empty() => f.write_str("false"),
            QueryFilter::And(children) => write_joined(f, children, "and"),
            QueryFilter::Or(children) => write_joined(f, children, "or"),
            QueryFilter::Not(child) => write!(f, "!({child})"),
            QueryFilter::BooleanLiteral(value) => write!(f, "{value}"),
            QueryFilter::Comparison {
                field,
                operator,
                value,
            } => {
                write!(f, "{field} {operator} ")?;
                write_literal(f, value)
            }
            QueryFilter::Present { field } => write!(f, "{field} pr"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{ObjectClass, Uid};

    fn field(name: &str) -> JsonPointer {
        JsonPointer::field(name)
    }

    fn bob() -> ConnectorObject {
        ConnectorObject::builder(ObjectClass::account())
            .with_uid(Uid::new("1"))
            .with_name("bob")
            .with("age", 30i64)
            .with("email", "bob@example.com")
            .build()
            .unwrap()
    }

    #[test]
    fn test_composite_normalization() {
        assert_eq!(
            QueryFilter::<JsonPointer>::and(vec![]),
            QueryFilter::always_true()
        );
        assert_eq!(
            QueryFilter::<JsonPointer>::or(vec![]),
            QueryFilter::always_false()
        );
        let leaf = QueryFilter::present(field("a"));
        assert_eq!(QueryFilter::and(vec![leaf.clone()]), leaf);
        assert_eq!(QueryFilter::or(vec![leaf.clone()]), leaf);
    }

    #[test]
    fn test_left_right_keep_composite_kind() {
        let (a, b, c) = (
            QueryFilter::present(field("a")),
            QueryFilter::present(field("b")),
            QueryFilter::present(field("c")),
        );
        let and = QueryFilter::and(vec![a.clone(), b.clone(), c.clone()]);
        assert_eq!(and.left(), Some(a.clone()));
        assert_eq!(
            and.right(),
            Some(QueryFilter::And(vec![b.clone(), c.clone()]))
        );

        let or = QueryFilter::or(vec![a.clone(), b.clone(), c.clone()]);
        assert_eq!(or.right(), Some(QueryFilter::Or(vec![b.clone(), c.clone()])));

        let pair = QueryFilter::and(vec![a, b.clone()]);
        assert_eq!(pair.right(), Some(b));
        assert_eq!(c.right(), None);
    }

    #[test]
    fn test_accept_comparisons() {
        let object = bob();
        assert!(QueryFilter::starts_with(field("__NAME__"), "b")
            .accept(&object)
            .unwrap());
        assert!(QueryFilter::greater_than_or_equal_to(field("age"), 21i64)
            .accept(&object)
            .unwrap());
        assert!(QueryFilter::equal_to(field("age"), 30i32).accept(&object).unwrap());
        assert!(!QueryFilter::less_than(field("age"), 30.0f64)
            .accept(&object)
            .unwrap());
        assert!(QueryFilter::contains(field("email"), "@example")
            .accept(&object)
            .unwrap());
    }

    #[test]
    fn test_absent_field_is_false() {
        let object = bob();
        assert!(!QueryFilter::equal_to(field("missing"), "x")
            .accept(&object)
            .unwrap());
        assert!(!QueryFilter::present(field("missing")).accept(&object).unwrap());
        assert!(QueryFilter::present(field("email")).accept(&object).unwrap());
    }

    #[test]
    fn test_string_operator_on_number_is_error() {
        let err = QueryFilter::starts_with(field("age"), "3")
            .accept(&bob())
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidAttributeValue);
    }

    #[test]
    fn test_extended_operator_is_not_evaluable() {
        let err = QueryFilter::extended(field("email"), "regex", ".*")
            .accept(&bob())
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::IllegalArgument);
    }

    #[test]
    fn test_display_is_grammar() {
        let filter = QueryFilter::and(vec![
            QueryFilter::contains(field("givenName"), "jo \"j\""),
            QueryFilter::not(QueryFilter::greater_than_or_equal_to(field("age"), 21i64)),
            QueryFilter::or(vec![
                QueryFilter::equal_to(field("score"), 2.0f64),
                QueryFilter::present(field("mail")),
            ]),
        ]);
        assert_eq!(
            filter.to_string(),
            r#"(/givenName co "jo \"j\"" and !(/age ge 21) and (/score eq 2.0 or /mail pr))"#
        );
    }

    #[test]
    fn test_every_value_kind_round_trips_through_text() {
        let wide: num_bigint::BigInt = "123456789012345678901234567890".parse().unwrap();
        let values = vec![
            AttributeValue::from("say \"hi\""),
            AttributeValue::from(-7i32),
            AttributeValue::from(i64::MIN),
            AttributeValue::from(0.1f32),
            AttributeValue::from(f32::NAN),
            AttributeValue::from(f32::NEG_INFINITY),
            AttributeValue::from(-0.0f32),
            AttributeValue::from(2.0f64),
            AttributeValue::from(f64::MAX),
            AttributeValue::from(f64::NAN),
            AttributeValue::from(f64::INFINITY),
            AttributeValue::from(f64::NEG_INFINITY),
            AttributeValue::from(false),
            AttributeValue::from('z'),
            AttributeValue::from(wide),
            AttributeValue::from(rust_decimal::Decimal::new(1050, 3)),
            AttributeValue::from(b"\x00\xfe?".to_vec()),
        ];
        for value in values {
            let filter = QueryFilter::less_than(field("v"), value);
            let text = filter.to_expression().unwrap();
            assert_eq!(parse_query_filter(&text).unwrap(), filter, "{text}");
        }
    }

    #[test]
    fn test_special_floats_use_named_literals() {
        let nan = QueryFilter::equal_to(field("x"), f64::NAN);
        assert_eq!(nan.to_string(), "/x eq NaN");
        let infinite = QueryFilter::less_than(field("x"), f32::NEG_INFINITY);
        assert_eq!(infinite.to_string(), "/x lt -Infinityf32");
    }

    #[test]
    fn test_to_expression_rejects_guarded_string() {
        let secret = AttributeValue::GuardedString(crate::objects::GuardedString::new("pw"));
        let filter = QueryFilter::and(vec![
            QueryFilter::present(field("a")),
            QueryFilter::equal_to(field("password"), secret),
        ]);
        let err = filter.to_expression().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::IllegalArgument);
        assert!(!filter.to_string().contains("\"pw\""));
    }
}
