use crate::objects::Attribute;

use super::Filter;

/// Translates attribute filters into a connector's native query type `Q`.
///
/// Implementers override the `create_*` methods for the expressions their
/// target system understands and leave the rest returning `None`. Every leaf
/// method receives `not = true` when the leaf sits under a negation; a
/// translator that cannot express the negated form returns `None`.
///
/// [`translate`](FilterTranslator::translate) pushes negations down to the
/// leaves (De Morgan), then combines translated leaves:
///
/// - an `and` whose operands cannot all be combined keeps the translatable
///   part, which only widens the native query;
/// - an `or` needs every operand translated; a top-level `or` that cannot be
///   combined natively becomes several native queries;
/// - an empty result means "query everything and filter locally".
///
/// The caller must still re-apply the original filter to the results.
pub trait FilterTranslator<Q> {
    fn create_and_expression(&self, _left: &Q, _right: &Q) -> Option<Q> {
        None
    }

    fn create_or_expression(&self, _left: &Q, _right: &Q) -> Option<Q> {
        None
    }

    fn create_equals_expression(&self, _attribute: &Attribute, _not: bool) -> Option<Q> {
        None
    }

    fn create_contains_expression(&self, _attribute: &Attribute, _not: bool) -> Option<Q> {
        None
    }

    fn create_starts_with_expression(&self, _attribute: &Attribute, _not: bool) -> Option<Q> {
        None
    }

    fn create_ends_with_expression(&self, _attribute: &Attribute, _not: bool) -> Option<Q> {
        None
    }

    fn create_greater_than_expression(&self, _attribute: &Attribute, _not: bool) -> Option<Q> {
        None
    }

    fn create_greater_than_or_equal_expression(
        &self,
        _attribute: &Attribute,
        _not: bool,
    ) -> Option<Q> {
        None
    }

    fn create_less_than_expression(&self, _attribute: &Attribute, _not: bool) -> Option<Q> {
        None
    }

    fn create_less_than_or_equal_expression(
        &self,
        _attribute: &Attribute,
        _not: bool,
    ) -> Option<Q> {
        None
    }

    fn create_contains_all_values_expression(
        &self,
        _attribute: &Attribute,
        _not: bool,
    ) -> Option<Q> {
        None
    }

    fn create_present_expression(&self, _name: &str, _not: bool) -> Option<Q> {
        None
    }

    fn create_extended_match_expression(
        &self,
        _operator: &str,
        _attribute: &Attribute,
        _not: bool,
    ) -> Option<Q> {
        None
    }

    /// Translate `filter` into zero or more native queries whose union
    /// covers every object the filter accepts.
    fn translate(&self, filter: &Filter) -> Vec<Q> {
        match push_down_not(filter, false) {
            Filter::Or(children) => {
                let mut queries = Vec::with_capacity(children.len());
                for child in &children {
                    match translate_node(self, child) {
                        Some(query) => queries.push(query),
                        None => return Vec::new(),
                    }
                }
                match combine_or(self, &queries) {
                    Some(combined) => vec![combined],
                    None => queries,
                }
            }
            normalized => translate_node(self, &normalized).into_iter().collect(),
        }
    }
}

/// Rewrite `filter` so that negations only appear directly above leaves.
fn push_down_not(filter: &Filter, negate: bool) -> Filter {
    match filter {
        Filter::Not(child) => push_down_not(child, !negate),
        Filter::And(children) => {
            let children = children.iter().map(|c| push_down_not(c, negate)).collect();
            if negate {
                Filter::or(children)
            } else {
                Filter::and(children)
            }
        }
        Filter::Or(children) => {
            let children = children.iter().map(|c| push_down_not(c, negate)).collect();
            if negate {
                Filter::and(children)
            } else {
                Filter::or(children)
            }
        }
        Filter::BooleanLiteral(value) => Filter::BooleanLiteral(*value != negate),
        leaf if negate => Filter::not(leaf.clone()),
        leaf => leaf.clone(),
    }
}

fn translate_node<Q, T>(translator: &T, filter: &Filter) -> Option<Q>
where
    T: FilterTranslator<Q> + ?Sized,
{
    match filter {
        Filter::And(children) => {
            let mut combined: Option<Q> = None;
            for query in children.iter().filter_map(|c| translate_node(translator, c)) {
                combined = match combined {
                    None => Some(query),
                    Some(acc) => Some(translator.create_and_expression(&acc, &query).unwrap_or(acc)),
                };
            }
            combined
        }
        Filter::Or(children) => {
            let queries: Option<Vec<Q>> = children
                .iter()
                .map(|c| translate_node(translator, c))
                .collect();
            combine_or(translator, &queries?)
        }
        Filter::Not(child) => translate_leaf(translator, child, true),
        leaf => translate_leaf(translator, leaf, false),
    }
}

fn combine_or<Q, T>(translator: &T, queries: &[Q]) -> Option<Q>
where
    T: FilterTranslator<Q> + ?Sized,
{
    let (first, rest) = queries.split_first()?;
    let mut combined = translator.create_or_expression(first, rest.first()?)?;
    for query in rest.iter().skip(1) {
        combined = translator.create_or_expression(&combined, query)?;
    }
    Some(combined)
}

fn translate_leaf<Q, T>(translator: &T, leaf: &Filter, not: bool) -> Option<Q>
where
    T: FilterTranslator<Q> + ?Sized,
{
    match leaf {
        Filter::Equals(a) => translator.create_equals_expression(a, not),
        Filter::Contains(a) => translator.create_contains_expression(a, not),
        Filter::StartsWith(a) => translator.create_starts_with_expression(a, not),
        Filter::EndsWith(a) => translator.create_ends_with_expression(a, not),
        Filter::GreaterThan(a) => translator.create_greater_than_expression(a, not),
        Filter::GreaterThanOrEqual(a) => translator.create_greater_than_or_equal_expression(a, not),
        Filter::LessThan(a) => translator.create_less_than_expression(a, not),
        Filter::LessThanOrEqual(a) => translator.create_less_than_or_equal_expression(a, not),
        Filter::ContainsAllValues(a) => translator.create_contains_all_values_expression(a, not),
        Filter::Present(name) => translator.create_present_expression(name, not),
        Filter::ExtendedMatch {
            operator,
            attribute,
        } => translator.create_extended_match_expression(operator, attribute, not),
        // Boolean literals and anything left composite are filtered locally.
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Translates to LDAP filter strings, without `ends_with` support.
    struct Ldap {
        supports_or: bool,
    }

    impl Ldap {
        fn leaf(attribute: &Attribute, pattern: &str, not: bool) -> Option<String> {
            let value = attribute.values().first()?.as_string()?;
            let expr = format!("({}={})", attribute.name(), pattern.replace('?', value));
            Some(if not { format!("(!{expr})") } else { expr })
        }
    }

    impl FilterTranslator<String> for Ldap {
        fn create_and_expression(&self, left: &String, right: &String) -> Option<String> {
            Some(format!("(&{left}{right})"))
        }

        fn create_or_expression(&self, left: &String, right: &String) -> Option<String> {
            self.supports_or.then(|| format!("(|{left}{right})"))
        }

        fn create_equals_expression(&self, attribute: &Attribute, not: bool) -> Option<String> {
            Self::leaf(attribute, "?", not)
        }

        fn create_starts_with_expression(&self, attribute: &Attribute, not: bool) -> Option<String> {
            Self::leaf(attribute, "?*", not)
        }
    }

    fn eq(name: &str, value: &str) -> Filter {
        Filter::equal_to(Attribute::single(name, value))
    }

    #[test]
    fn test_translate_and() {
        let ldap = Ldap { supports_or: true };
        let filter = Filter::and(vec![eq("cn", "bob"), eq("sn", "smith")]);
        assert_eq!(ldap.translate(&filter), vec!["(&(cn=bob)(sn=smith))"]);
    }

    #[test]
    fn test_untranslatable_and_operand_widens_query() {
        let ldap = Ldap { supports_or: true };
        let filter = Filter::and(vec![
            eq("cn", "bob"),
            Filter::ends_with(Attribute::single("mail", "@example.com")),
        ]);
        assert_eq!(ldap.translate(&filter), vec!["(cn=bob)"]);
    }

    #[test]
    fn test_untranslatable_or_operand_means_full_scan() {
        let ldap = Ldap { supports_or: true };
        let filter = Filter::or(vec![
            eq("cn", "bob"),
            Filter::ends_with(Attribute::single("mail", "@example.com")),
        ]);
        assert!(ldap.translate(&filter).is_empty());
    }

    #[test]
    fn test_or_without_native_support_splits_queries() {
        let ldap = Ldap { supports_or: false };
        let filter = Filter::or(vec![eq("cn", "a"), eq("cn", "b"), eq("cn", "c")]);
        assert_eq!(
            ldap.translate(&filter),
            vec!["(cn=a)", "(cn=b)", "(cn=c)"]
        );
    }

    #[test]
    fn test_not_is_pushed_down() {
        let ldap = Ldap { supports_or: true };
        let filter = Filter::not(Filter::and(vec![
            eq("cn", "bob"),
            Filter::starts_with(Attribute::single("sn", "sm")),
        ]));
        assert_eq!(
            ldap.translate(&filter),
            vec!["(|(!(cn=bob))(!(sn=sm*)))"]
        );

        let double = Filter::not(Filter::not(eq("cn", "bob")));
        assert_eq!(ldap.translate(&double), vec!["(cn=bob)"]);
    }

    #[test]
    fn test_boolean_literals_are_not_translated() {
        let ldap = Ldap { supports_or: true };
        assert!(ldap.translate(&Filter::always_true()).is_empty());
        assert_eq!(
            ldap.translate(&Filter::and(vec![Filter::always_true(), eq("cn", "x")])),
            vec!["(cn=x)"]
        );
    }
}
