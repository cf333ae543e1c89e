//! Double dispatch over [`QueryFilter`] trees.

use crate::objects::AttributeValue;

use super::{ComparisonOperator, QueryFilter};

/// A consumer of field-based filters.
///
/// Each method receives the node's contents together with the caller's
/// parameter. A visitor that needs to walk children calls
/// [`QueryFilter::accept_visitor`] on them itself.
///
/// `visit_and` and `visit_or` may receive an empty child list when a tree was
/// assembled from raw variants instead of the normalizing constructors. An
/// empty `and` means "true" and an empty `or` means "false".
pub trait QueryFilterVisitor<F, P, R> {
    fn visit_and(&mut self, param: &P, children: &[QueryFilter<F>]) -> R;

    fn visit_or(&mut self, param: &P, children: &[QueryFilter<F>]) -> R;

    fn visit_not(&mut self, param: &P, child: &QueryFilter<F>) -> R;

    fn visit_boolean(&mut self, param: &P, value: bool) -> R;

    fn visit_comparison(
        &mut self,
        param: &P,
        field: &F,
        operator: &ComparisonOperator,
        value: &AttributeValue,
    ) -> R;

    fn visit_present(&mut self, param: &P, field: &F) -> R;
}

impl<F> QueryFilter<F> {
    /// Dispatch to the visitor method matching this node.
    pub fn accept_visitor<P, R, V>(&self, visitor: &mut V, param: &P) -> R
    where
        V: QueryFilterVisitor<F, P, R> + ?Sized,
    {
        match self {
            QueryFilter::And(children) => visitor.visit_and(param, children),
            QueryFilter::Or(children) => visitor.visit_or(param, children),
            QueryFilter::Not(child) => visitor.visit_not(param, child),
            QueryFilter::BooleanLiteral(value) => visitor.visit_boolean(param, *value),
            QueryFilter::Comparison {
                field,
                operator,
                value,
            } => visitor.visit_comparison(param, field, operator, value),
            QueryFilter::Present { field } => visitor.visit_present(param, field),
        }
    }
}
