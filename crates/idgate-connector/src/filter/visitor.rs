use crate::objects::Attribute;

use super::Filter;

/// A consumer of attribute-based filters, typically a translator into a
/// target system's query language.
///
/// One method per filter variant. Composite methods receive the raw child
/// list and decide themselves whether and how to recurse; an empty `and`
/// list means "true", an empty `or` list means "false".
pub trait FilterVisitor<P, R> {
    fn visit_and(&mut self, param: &P, children: &[Filter]) -> R;
    fn visit_or(&mut self, param: &P, children: &[Filter]) -> R;
    fn visit_not(&mut self, param: &P, child: &Filter) -> R;
    fn visit_boolean(&mut self, param: &P, value: bool) -> R;
    fn visit_equals(&mut self, param: &P, attribute: &Attribute) -> R;
    fn visit_contains(&mut self, param: &P, attribute: &Attribute) -> R;
    fn visit_starts_with(&mut self, param: &P, attribute: &Attribute) -> R;
    fn visit_ends_with(&mut self, param: &P, attribute: &Attribute) -> R;
    fn visit_greater_than(&mut self, param: &P, attribute: &Attribute) -> R;
    fn visit_greater_than_or_equal(&mut self, param: &P, attribute: &Attribute) -> R;
    fn visit_less_than(&mut self, param: &P, attribute: &Attribute) -> R;
    fn visit_less_than_or_equal(&mut self, param: &P, attribute: &Attribute) -> R;
    fn visit_contains_all_values(&mut self, param: &P, attribute: &Attribute) -> R;
    fn visit_present(&mut self, param: &P, name: &str) -> R;
    fn visit_extended_match(&mut self, param: &P, operator: &str, attribute: &Attribute) -> R;
}

impl Filter {
    /// Dispatch to the visitor method matching this node.
    pub fn accept_visitor<P, R, V>(&self, visitor: &mut V, param: &P) -> R
    where
        V: FilterVisitor<P, R> + ?Sized,
    {
        match self {
            Filter::And(children) => visitor.visit_and(param, children),
            Filter::Or(children) => visitor.visit_or(param, children),
            Filter::Not(child) => visitor.visit_not(param, child),
            Filter::BooleanLiteral(value) => visitor.visit_boolean(param, *value),
            Filter::Equals(a) => visitor.visit_equals(param, a),
            Filter::Contains(a) => visitor.visit_contains(param, a),
            Filter::StartsWith(a) => visitor.visit_starts_with(param, a),
            Filter::EndsWith(a) => visitor.visit_ends_with(param, a),
            Filter::GreaterThan(a) => visitor.visit_greater_than(param, a),
            Filter::GreaterThanOrEqual(a) => visitor.visit_greater_than_or_equal(param, a),
            Filter::LessThan(a) => visitor.visit_less_than(param, a),
            Filter::LessThanOrEqual(a) => visitor.visit_less_than_or_equal(param, a),
            Filter::ContainsAllValues(a) => visitor.visit_contains_all_values(param, a),
            Filter::Present(name) => visitor.visit_present(param, name),
            Filter::ExtendedMatch {
                operator,
                attribute,
            } => visitor.visit_extended_match(param, operator, attribute),
        }
    }
}
