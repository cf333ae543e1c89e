//! Attribute-based filters
//!
//! [`Filter`] is the filter variant connectors receive in search requests.
//! Every comparison carries a whole [`Attribute`]: the attribute name is the
//! field reference and its values are the assertion.
//!
//! Filters are immutable once built. The `and`/`or` constructors normalize an
//! empty child list to a boolean literal and a single child to that child.

mod translator;
mod visitor;

use std::cmp::Ordering;
use std::fmt;

use crate::error::{ConnectorError, ConnectorResult};
use crate::objects::{Attribute, AttributeValue, ConnectorObject};
use crate::query::{
    check_literal, parse_query_filter, write_joined, write_literal, ComparisonOperator,
    FilterParseError, QueryFilter, QueryFilterVisitor,
};

pub use translator::FilterTranslator;
pub use visitor::FilterVisitor;

/// Variant of a [`Filter`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterKind {
    And,
    Or,
    Not,
    Boolean,
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    ContainsAllValues,
    Present,
    ExtendedMatch,
}

impl FilterKind {
    #[must_use]
    pub fn all() -> &'static [FilterKind] {
        &[
            FilterKind::And,
            FilterKind::Or,
            FilterKind::Not,
            FilterKind::Boolean,
            FilterKind::Equals,
            FilterKind::Contains,
            FilterKind::StartsWith,
            FilterKind::EndsWith,
            FilterKind::GreaterThan,
            FilterKind::GreaterThanOrEqual,
            FilterKind::LessThan,
            FilterKind::LessThanOrEqual,
            FilterKind::ContainsAllValues,
            FilterKind::Present,
            FilterKind::ExtendedMatch,
        ]
    }

    /// Grammar operator of a comparison kind.
    #[must_use]
    pub fn operator(&self) -> Option<&'static str> {
        Some(match self {
            FilterKind::Equals => "eq",
            FilterKind::Contains => "co",
            FilterKind::StartsWith => "sw",
            FilterKind::EndsWith => "ew",
            FilterKind::GreaterThan => "gt",
            FilterKind::GreaterThanOrEqual => "ge",
            FilterKind::LessThan => "lt",
            FilterKind::LessThanOrEqual => "le",
            FilterKind::ContainsAllValues => "ca",
            FilterKind::Present => "pr",
            _ => return None,
        })
    }
}

/// An immutable attribute-based filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    BooleanLiteral(bool),
    Equals(Attribute),
    Contains(Attribute),
    StartsWith(Attribute),
    EndsWith(Attribute),
    GreaterThan(Attribute),
    GreaterThanOrEqual(Attribute),
    LessThan(Attribute),
    LessThanOrEqual(Attribute),
    ContainsAllValues(Attribute),
    Present(String),
    ExtendedMatch {
        operator: String,
        attribute: Attribute,
    },
}

impl Filter {
    /// Conjunction of `children`.
    pub fn and(mut children: Vec<Filter>) -> Self {
        match children.len() {
            0 => Filter::BooleanLiteral(true),
            1 => children.remove(0),
            _ => Filter::And(children),
        }
    }

    /// Disjunction of `children`.
    pub fn or(mut children: Vec<Filter>) -> Self {
        match children.len() {
            0 => Filter::BooleanLiteral(false),
            1 => children.remove(0),
            _ => Filter::Or(children),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Filter) -> Self {
        Filter::Not(Box::new(child))
    }

    pub fn always_true() -> Self {
        Filter::BooleanLiteral(true)
    }

    pub fn always_false() -> Self {
        Filter::BooleanLiteral(false)
    }

    pub fn equal_to(attribute: Attribute) -> Self {
        Filter::Equals(attribute)
    }

    pub fn contains(attribute: Attribute) -> Self {
        Filter::Contains(attribute)
    }

    pub fn starts_with(attribute: Attribute) -> Self {
        Filter::StartsWith(attribute)
    }

    pub fn ends_with(attribute: Attribute) -> Self {
        Filter::EndsWith(attribute)
    }

    pub fn greater_than(attribute: Attribute) -> Self {
        Filter::GreaterThan(attribute)
    }

    pub fn greater_than_or_equal_to(attribute: Attribute) -> Self {
        Filter::GreaterThanOrEqual(attribute)
    }

    pub fn less_than(attribute: Attribute) -> Self {
        Filter::LessThan(attribute)
    }

    pub fn less_than_or_equal_to(attribute: Attribute) -> Self {
        Filter::LessThanOrEqual(attribute)
    }

    pub fn contains_all_values(attribute: Attribute) -> Self {
        Filter::ContainsAllValues(attribute)
    }

    pub fn present(name: impl Into<String>) -> Self {
        Filter::Present(name.into())
    }

    pub fn extended_match(operator: impl Into<String>, attribute: Attribute) -> Self {
        Filter::ExtendedMatch {
            operator: operator.into(),
            attribute,
        }
    }

    /// Parse a filter expression.
    ///
    /// Besides the core operators, `ew` parses to [`Filter::EndsWith`] and
    /// `ca` to [`Filter::ContainsAllValues`]; other extended operators become
    /// [`Filter::ExtendedMatch`].
    pub fn parse(input: &str) -> Result<Filter, FilterParseError> {
        let query: QueryFilter<String> = parse_query_filter(input)?;
        Ok(Filter::from_query(&query))
    }

    /// The grammar text of this filter.
    ///
    /// Unlike `to_string()`, fails for filters whose text would not parse
    /// back: comparisons holding other than exactly one value, and guarded
    /// string values.
    pub fn to_expression(&self) -> ConnectorResult<String> {
        self.check_literals()?;
        Ok(self.to_string())
    }

    fn check_literals(&self) -> ConnectorResult<()> {
        match self {
            Filter::And(children) | Filter::Or(children) => {
                children.iter().try_for_each(Filter::check_literals)
            }
            Filter::Not(child) => child.check_literals(),
            Filter::BooleanLiteral(_) | Filter::Present(_) => Ok(()),
            other => match other.attribute().map(Attribute::values) {
                Some([value]) => check_literal(value),
                _ => Err(ConnectorError::illegal_argument(format!(
                    "filter '{other}' needs exactly one value to have a text form"
                ))),
            },
        }
    }

    /// Convert a field-based filter, using field names as attribute names.
    pub fn from_query(query: &QueryFilter<String>) -> Filter {
        query.accept_visitor(&mut QueryConversion, &())
    }

    /// The variant of this node.
    #[must_use]
    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::And(_) => FilterKind::And,
            Filter::Or(_) => FilterKind::Or,
            Filter::Not(_) => FilterKind::Not,
            Filter::BooleanLiteral(_) => FilterKind::Boolean,
            Filter::Equals(_) => FilterKind::Equals,
            Filter::Contains(_) => FilterKind::Contains,
            Filter::StartsWith(_) => FilterKind::StartsWith,
            Filter::EndsWith(_) => FilterKind::EndsWith,
            Filter::GreaterThan(_) => FilterKind::GreaterThan,
            Filter::GreaterThanOrEqual(_) => FilterKind::GreaterThanOrEqual,
            Filter::LessThan(_) => FilterKind::LessThan,
            Filter::LessThanOrEqual(_) => FilterKind::LessThanOrEqual,
            Filter::ContainsAllValues(_) => FilterKind::ContainsAllValues,
            Filter::Present(_) => FilterKind::Present,
            Filter::ExtendedMatch { .. } => FilterKind::ExtendedMatch,
        }
    }

    /// The attribute of a comparison node.
    pub fn attribute(&self) -> Option<&Attribute> {
        match self {
            Filter::Equals(a)
            | Filter::Contains(a)
            | Filter::StartsWith(a)
            | Filter::EndsWith(a)
            | Filter::GreaterThan(a)
            | Filter::GreaterThanOrEqual(a)
            | Filter::LessThan(a)
            | Filter::LessThanOrEqual(a)
            | Filter::ContainsAllValues(a)
            | Filter::ExtendedMatch { attribute: a, .. } => Some(a),
            _ => None,
        }
    }

    /// First operand of a composite.
    pub fn left(&self) -> Option<Filter> {
        match self {
            Filter::And(children) | Filter::Or(children) => children.first().cloned(),
            _ => None,
        }
    }

    /// Everything after the first operand of a composite, as a composite of
    /// the same kind (or the plain second child when there are two).
    pub fn right(&self) -> Option<Filter> {
        match self {
            Filter::And(children) if children.len() > 1 => {
                Some(Filter::and(children[1..].to_vec()))
            }
            Filter::Or(children) if children.len() > 1 => Some(Filter::or(children[1..].to_vec())),
            _ => None,
        }
    }

    /// Evaluate this filter against a connector object.
    ///
    /// Comparisons on an attribute the object lacks are false. String
    /// comparisons on non-string values and ordering comparisons on
    /// incomparable values are errors, as is an extended match, which only
    /// the target system can evaluate.
    pub fn accept(&self, object: &ConnectorObject) -> ConnectorResult<bool> {
        match self {
            Filter::And(children) => {
                for child in children {
                    if !child.accept(object)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Filter::Or(children) => {
                for child in children {
                    if child.accept(object)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Filter::Not(child) => Ok(!child.accept(object)?),
            Filter::BooleanLiteral(value) => Ok(*value),
            Filter::Present(name) => Ok(object.attribute_by_name(name).is_some()),
            Filter::Equals(expected) => Ok(object
                .attribute_by_name(expected.name())
                .is_some_and(|actual| {
                    actual.values().len() == expected.values().len()
                        && actual
                            .values()
                            .iter()
                            .zip(expected.values())
                            .all(|(a, e)| values_equal(a, e))
                })),
            Filter::ContainsAllValues(expected) => Ok(object
                .attribute_by_name(expected.name())
                .is_some_and(|actual| {
                    expected
                        .values()
                        .iter()
                        .all(|e| actual.values().iter().any(|a| values_equal(a, e)))
                })),
            Filter::Contains(expected) | Filter::StartsWith(expected) | Filter::EndsWith(expected) => {
                let needle = assertion_value(self.kind(), expected)?
                    .as_string()
                    .ok_or_else(|| {
                        ConnectorError::illegal_argument(format!(
                            "string filter on '{}' requires a string value",
                            expected.name()
                        ))
                    })?;
                let Some(actual) = first_value(object, expected) else {
                    return Ok(false);
                };
                let haystack = actual.as_string().ok_or_else(|| {
                    ConnectorError::invalid_attribute_value(format!(
                        "attribute '{}' holds a {} value, string filter requires a string",
                        expected.name(),
                        actual.value_type()
                    ))
                })?;
                Ok(match self {
                    Filter::Contains(_) => haystack.contains(needle),
                    Filter::StartsWith(_) => haystack.starts_with(needle),
                    _ => haystack.ends_with(needle),
                })
            }
            Filter::GreaterThan(expected)
            | Filter::GreaterThanOrEqual(expected)
            | Filter::LessThan(expected)
            | Filter::LessThanOrEqual(expected) => {
                let bound = assertion_value(self.kind(), expected)?;
                let Some(actual) = first_value(object, expected) else {
                    return Ok(false);
                };
                let ordering = actual.compare(bound).ok_or_else(|| {
                    ConnectorError::invalid_attribute_value(format!(
                        "attribute '{}' value of type {} is not comparable with {}",
                        expected.name(),
                        actual.value_type(),
                        bound.value_type()
                    ))
                })?;
                Ok(match self {
                    Filter::GreaterThan(_) => ordering == Ordering::Greater,
                    Filter::GreaterThanOrEqual(_) => ordering != Ordering::Less,
                    Filter::LessThan(_) => ordering == Ordering::Less,
                    _ => ordering != Ordering::Greater,
                })
            }
            Filter::ExtendedMatch { operator, .. } => Err(ConnectorError::illegal_argument(
                format!("extended match operator '{operator}' cannot be evaluated locally"),
            )),
        }
    }
}

fn values_equal(actual: &AttributeValue, expected: &AttributeValue) -> bool {
    match actual.compare(expected) {
        Some(ordering) => ordering == Ordering::Equal,
        None => actual == expected,
    }
}

fn first_value<'a>(object: &'a ConnectorObject, expected: &Attribute) -> Option<&'a AttributeValue> {
    object
        .attribute_by_name(expected.name())
        .and_then(|a| a.values().first())
}

fn assertion_value(kind: FilterKind, attribute: &Attribute) -> ConnectorResult<&AttributeValue> {
    match attribute.values() {
        [value] => Ok(value),
        _ => Err(ConnectorError::illegal_argument(format!(
            "{kind:?} filter on '{}' requires exactly one value",
            attribute.name()
        ))),
    }
}

/// Builds attribute filters from field-based ones.
struct QueryConversion;

impl QueryFilterVisitor<String, (), Filter> for QueryConversion {
    fn visit_and(&mut self, p: &(), children: &[QueryFilter<String>]) -> Filter {
        Filter::and(children.iter().map(|c| c.accept_visitor(self, p)).collect())
    }

    fn visit_or(&mut self, p: &(), children: &[QueryFilter<String>]) -> Filter {
        Filter::or(children.iter().map(|c| c.accept_visitor(self, p)).collect())
    }

    fn visit_not(&mut self, p: &(), child: &QueryFilter<String>) -> Filter {
        Filter::not(child.accept_visitor(self, p))
    }

    fn visit_boolean(&mut self, _: &(), value: bool) -> Filter {
        Filter::BooleanLiteral(value)
    }

    fn visit_comparison(
        &mut self,
        _: &(),
        field: &String,
        operator: &ComparisonOperator,
        value: &AttributeValue,
    ) -> Filter {
        let attribute = Attribute::single(field.as_str(), value.clone());
        match operator {
            ComparisonOperator::Equals => Filter::Equals(attribute),
            ComparisonOperator::Contains => Filter::Contains(attribute),
            ComparisonOperator::StartsWith => Filter::StartsWith(attribute),
            ComparisonOperator::GreaterThan => Filter::GreaterThan(attribute),
            ComparisonOperator::GreaterThanOrEqual => Filter::GreaterThanOrEqual(attribute),
            ComparisonOperator::LessThan => Filter::LessThan(attribute),
            ComparisonOperator::LessThanOrEqual => Filter::LessThanOrEqual(attribute),
            ComparisonOperator::Extended(name) if name.eq_ignore_ascii_case("ew") => {
                Filter::EndsWith(attribute)
            }
            ComparisonOperator::Extended(name) if name.eq_ignore_ascii_case("ca") => {
                Filter::ContainsAllValues(attribute)
            }
            ComparisonOperator::Extended(name) => Filter::extended_match(name.as_str(), attribute),
        }
    }

    fn visit_present(&mut self, _: &(), field: &String) -> Filter {
        Filter::Present(field.clone())
    }
}

fn write_comparison(f: &mut fmt::Formatter<'_>, operator: &str, attribute: &Attribute) -> fmt::Result {
    write!(f, "{} {operator} ", attribute.name())?;
    match attribute.values() {
        [value] => write_literal(f, value),
        // Not parseable: the grammar has no multi-value literal.
        values => {
            f.write_str("[")?;
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_literal(f, value)?;
            }
            f.write_str("]")
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::And(children) if children.is_empty() => f.write_str("true"),
            Filter::Or(children) if children.is_empty() => f.write_str("false"),
            Filter::And(children) => write_joined(f, children, "and"),
            Filter::Or(children) => write_joined(f, children, "or"),
            Filter::Not(child) => write!(f, "!({child})"),
            Filter::BooleanLiteral(value) => write!(f, "{value}"),
            Filter::Present(name) => write!(f, "{name} pr"),
            Filter::ExtendedMatch {
                operator,
                attribute,
            } => write_comparison(f, operator, attribute),
            other => match (other.kind().operator(), other.attribute()) {
                (Some(operator), Some(attribute)) => write_comparison(f, operator, attribute),
                _ => Ok(()),
            },
        }
    }
}
