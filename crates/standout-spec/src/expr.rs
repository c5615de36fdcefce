//! Predicate expression trees.
//!
//! An [`Expr`] is an inspectable boolean function over one item. Children are
//! reference counted, so combining two trees splices the existing nodes
//! instead of copying or mutating them. A [`Predicate`] closes a tree over a
//! single [`Param`].

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};
use std::sync::Arc;

use crate::clause::Condition;
use crate::error::{Result, SpecError};
use crate::fields::Accessor;
use crate::param::{Param, ParamId};

/// Closure form of an opaque leaf.
pub type TestFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// An expression tree node.
pub enum Expr<T> {
    Const(bool),
    /// Field comparison. Inspectable, so query providers can translate it.
    Compare {
        param: ParamId,
        condition: Arc<Condition>,
        accessor: Accessor<T>,
    },
    /// Caller-supplied closure. Evaluable, but opaque to query providers.
    Test {
        param: ParamId,
        name: Arc<str>,
        test: TestFn<T>,
    },
    Not(Arc<Expr<T>>),
    And(Arc<Expr<T>>, Arc<Expr<T>>),
    Or(Arc<Expr<T>>, Arc<Expr<T>>),
    Xor(Arc<Expr<T>>, Arc<Expr<T>>),
}

impl<T> Expr<T> {
    pub fn constant(value: bool) -> Self {
        Expr::Const(value)
    }

    pub fn and(left: Expr<T>, right: Expr<T>) -> Self {
        Expr::And(Arc::new(left), Arc::new(right))
    }

    pub fn or(left: Expr<T>, right: Expr<T>) -> Self {
        Expr::Or(Arc::new(left), Arc::new(right))
    }

    pub fn xor(left: Expr<T>, right: Expr<T>) -> Self {
        Expr::Xor(Arc::new(left), Arc::new(right))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Expr<T>) -> Self {
        Expr::Not(Arc::new(expr))
    }

    /// Parameters referenced by the leaves of this tree.
    pub fn params(&self) -> BTreeSet<ParamId> {
        let mut found = BTreeSet::new();
        self.collect_params(&mut found);
        found
    }

    fn collect_params(&self, found: &mut BTreeSet<ParamId>) {
        match self {
            Expr::Const(_) => {}
            Expr::Compare { param, .. } | Expr::Test { param, .. } => {
                found.insert(*param);
            }
            Expr::Not(inner) => inner.collect_params(found),
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Xor(l, r) => {
                l.collect_params(found);
                r.collect_params(found);
            }
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        match self {
            Expr::Const(_) | Expr::Compare { .. } | Expr::Test { .. } => 1,
            Expr::Not(inner) => 1 + inner.node_count(),
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Xor(l, r) => {
                1 + l.node_count() + r.node_count()
            }
        }
    }

    /// Returns a tree where every leaf reading `from` reads `to` instead.
    ///
    /// Subtrees that don't mention `from` are shared with `self`.
    pub fn rebind(&self, from: ParamId, to: ParamId) -> Expr<T> {
        self.rebound(from, to).unwrap_or_else(|| self.clone())
    }

    // None means "unchanged", letting callers keep the original Arc.
    fn rebound(&self, from: ParamId, to: ParamId) -> Option<Expr<T>> {
        match self {
            Expr::Const(_) => None,
            Expr::Compare {
                param,
                condition,
                accessor,
            } => (*param == from).then(|| Expr::Compare {
                param: to,
                condition: Arc::clone(condition),
                accessor: *accessor,
            }),
            Expr::Test { param, name, test } => (*param == from).then(|| Expr::Test {
                param: to,
                name: Arc::clone(name),
                test: Arc::clone(test),
            }),
            Expr::Not(inner) => inner.rebound(from, to).map(|e| Expr::Not(Arc::new(e))),
            Expr::And(l, r) => rebound_pair(l, r, from, to).map(|(l, r)| Expr::And(l, r)),
            Expr::Or(l, r) => rebound_pair(l, r, from, to).map(|(l, r)| Expr::Or(l, r)),
            Expr::Xor(l, r) => rebound_pair(l, r, from, to).map(|(l, r)| Expr::Xor(l, r)),
        }
    }

    fn is_binary(&self) -> bool {
        matches!(self, Expr::And(..) | Expr::Or(..) | Expr::Xor(..))
    }
}

type Pair<T> = (Arc<Expr<T>>, Arc<Expr<T>>);

fn rebound_pair<T>(
    left: &Arc<Expr<T>>,
    right: &Arc<Expr<T>>,
    from: ParamId,
    to: ParamId,
) -> Option<Pair<T>> {
    let new_left = left.rebound(from, to);
    let new_right = right.rebound(from, to);
    if new_left.is_none() && new_right.is_none() {
        return None;
    }
    Some((
        new_left.map_or_else(|| Arc::clone(left), Arc::new),
        new_right.map_or_else(|| Arc::clone(right), Arc::new),
    ))
}

impl<T> Clone for Expr<T> {
    fn clone(&self) -> Self {
        match self {
            Expr::Const(b) => Expr::Const(*b),
            Expr::Compare {
                param,
                condition,
                accessor,
            } => Expr::Compare {
                param: *param,
                condition: Arc::clone(condition),
                accessor: *accessor,
            },
            Expr::Test { param, name, test } => Expr::Test {
                param: *param,
                name: Arc::clone(name),
                test: Arc::clone(test),
            },
            Expr::Not(inner) => Expr::Not(Arc::clone(inner)),
            Expr::And(l, r) => Expr::And(Arc::clone(l), Arc::clone(r)),
            Expr::Or(l, r) => Expr::Or(Arc::clone(l), Arc::clone(r)),
            Expr::Xor(l, r) => Expr::Xor(Arc::clone(l), Arc::clone(r)),
        }
    }
}

struct Grouped<'e, T>(&'e Expr<T>);

impl<T> fmt::Display for Grouped<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_binary() {
            write!(f, "({})", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl<T> fmt::Display for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(b) => write!(f, "{}", b),
            Expr::Compare { condition, .. } => write!(f, "{}", condition),
            Expr::Test { name, .. } => write!(f, "[{}]", name),
            Expr::Not(inner) => write!(f, "not {}", Grouped(inner)),
            Expr::And(l, r) => write!(f, "{} and {}", Grouped(l), Grouped(r)),
            Expr::Or(l, r) => write!(f, "{} or {}", Grouped(l), Grouped(r)),
            Expr::Xor(l, r) => write!(f, "{} xor {}", Grouped(l), Grouped(r)),
        }
    }
}

impl<T> fmt::Debug for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({})", self)
    }
}

impl<T> Not for Expr<T> {
    type Output = Expr<T>;

    fn not(self) -> Self::Output {
        Expr::Not(Arc::new(self))
    }
}

impl<T> BitAnd for Expr<T> {
    type Output = Expr<T>;

    fn bitand(self, rhs: Self) -> Self::Output {
        Expr::and(self, rhs)
    }
}

impl<T> BitOr for Expr<T> {
    type Output = Expr<T>;

    fn bitor(self, rhs: Self) -> Self::Output {
        Expr::or(self, rhs)
    }
}

impl<T> BitXor for Expr<T> {
    type Output = Expr<T>;

    fn bitxor(self, rhs: Self) -> Self::Output {
        Expr::xor(self, rhs)
    }
}

/// A closed predicate: `param => body`.
///
/// Every leaf of `body` reads `param`. The body sits behind an `Arc` whose
/// address is the predicate's identity in the
/// [`EvaluatorCache`](crate::EvaluatorCache).
pub struct Predicate<T> {
    param: Param<T>,
    body: Arc<Expr<T>>,
}

impl<T> Predicate<T> {
    /// Binds `body` to `param`.
    ///
    /// Fails with [`SpecError::InvalidArgument`] if `body` reads any other
    /// parameter.
    pub fn new(param: Param<T>, body: Expr<T>) -> Result<Self> {
        if let Some(foreign) = body.params().into_iter().find(|p| *p != param.id()) {
            return Err(SpecError::InvalidArgument(format!(
                "predicate body reads parameter {} but only binds `{}` ({})",
                foreign,
                param.name(),
                param.id()
            )));
        }
        Ok(Predicate {
            param,
            body: Arc::new(body),
        })
    }

    /// Wraps a closure in a fresh parameter.
    pub fn from_fn<F>(name: impl Into<Arc<str>>, test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let param = Param::default();
        let body = Arc::new(param.test(name, test));
        Predicate { param, body }
    }

    pub fn param(&self) -> &Param<T> {
        &self.param
    }

    pub fn body(&self) -> &Expr<T> {
        &self.body
    }

    pub(crate) fn shared_body(&self) -> &Arc<Expr<T>> {
        &self.body
    }

    /// Returns `true` if both predicates share the same tree, and therefore
    /// the same cache entry.
    pub fn same_tree(&self, other: &Predicate<T>) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }

    pub(crate) fn negate(&self) -> Self {
        Predicate {
            param: self.param.clone(),
            body: Arc::new(Expr::Not(Arc::clone(&self.body))),
        }
    }

    /// Splices `self` and `other` under `node`, reading `self`'s parameter.
    pub(crate) fn combine(
        &self,
        other: &Predicate<T>,
        node: fn(Arc<Expr<T>>, Arc<Expr<T>>) -> Expr<T>,
    ) -> Self {
        let right = if other.param.id() == self.param.id() {
            Arc::clone(&other.body)
        } else {
            Arc::new(other.body.rebind(other.param.id(), self.param.id()))
        };
        Predicate {
            param: self.param.clone(),
            body: Arc::new(node(Arc::clone(&self.body), right)),
        }
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Predicate {
            param: self.param.clone(),
            body: Arc::clone(&self.body),
        }
    }
}

impl<T> fmt::Display for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.body)
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|{}| {}", self.param.name(), self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Number, Value};

    struct Item {
        n: i64,
    }

    fn accessor<'a>(item: &'a Item, field: &str) -> Value<'a> {
        match field {
            "n" => Value::Number(Number::I64(item.n)),
            _ => Value::None,
        }
    }

    fn n_gt(param: &Param<Item>, bound: i64) -> Expr<Item> {
        param.field_with("n", accessor).gt(bound)
    }

    #[test]
    fn display_parenthesizes_binary_children() {
        let p = Param::<Item>::new("item");
        let expr = (n_gt(&p, 1) & n_gt(&p, 2)) | !n_gt(&p, 3);
        assert_eq!(expr.to_string(), "(n > 1 and n > 2) or not n > 3");

        let nested = !(n_gt(&p, 1) ^ Expr::constant(true));
        assert_eq!(nested.to_string(), "not (n > 1 xor true)");
    }

    #[test]
    fn test_leaves_render_by_name() {
        let p = Param::<Item>::new("item");
        let expr = p.test("even", |i: &Item| i.n % 2 == 0);
        assert_eq!(expr.to_string(), "[even]");
    }

    #[test]
    fn params_and_node_count() {
        let p = Param::<Item>::new("p");
        let q = Param::<Item>::new("q");
        let expr = Expr::and(n_gt(&p, 0), Expr::not(n_gt(&q, 0)));

        assert_eq!(expr.params().into_iter().collect::<Vec<_>>(), vec![p.id(), q.id()]);
        assert_eq!(expr.node_count(), 4);
        assert!(Expr::<Item>::constant(false).params().is_empty());
    }

    #[test]
    fn rebind_replaces_only_matching_leaves() {
        let p = Param::<Item>::new("p");
        let q = Param::<Item>::new("q");
        let r = Param::<Item>::new("r");
        let expr = Expr::or(n_gt(&q, 1), n_gt(&r, 2));

        let rebound = expr.rebind(q.id(), p.id());
        let params: Vec<_> = rebound.params().into_iter().collect();
        assert_eq!(params, vec![p.id(), r.id()]);
    }

    #[test]
    fn rebind_shares_untouched_subtrees() {
        let p = Param::<Item>::new("p");
        let q = Param::<Item>::new("q");
        let expr = Expr::and(n_gt(&q, 1), n_gt(&p, 2));

        let rebound = expr.rebind(q.id(), p.id());
        match (&expr, &rebound) {
            (Expr::And(_, before), Expr::And(_, after)) => assert!(Arc::ptr_eq(before, after)),
            _ => panic!("shape changed"),
        }
    }

    #[test]
    fn predicate_rejects_foreign_parameters() {
        let p = Param::<Item>::new("p");
        let q = Param::<Item>::new("q");

        let err = Predicate::new(p.clone(), Expr::and(n_gt(&p, 0), n_gt(&q, 0))).unwrap_err();
        assert!(matches!(err, SpecError::InvalidArgument(_)));
        assert!(err.to_string().contains("`p`"));
    }

    #[test]
    fn predicate_accepts_constant_body() {
        let p = Param::<Item>::new("p");
        let always = Predicate::new(p, Expr::constant(true)).unwrap();
        assert_eq!(always.to_string(), "true");
    }

    #[test]
    fn combine_rebinds_right_operand() {
        let p = Param::<Item>::new("p");
        let q = Param::<Item>::new("q");
        let left = Predicate::new(p.clone(), n_gt(&p, 0)).unwrap();
        let right = Predicate::new(q.clone(), n_gt(&q, 10)).unwrap();

        let both = left.combine(&right, Expr::And);
        assert_eq!(both.param().id(), p.id());
        assert_eq!(both.body().params().into_iter().collect::<Vec<_>>(), vec![p.id()]);
        assert_eq!(both.to_string(), "n > 0 and n > 10");
    }

    #[test]
    fn combine_with_self_shares_tree() {
        let p = Param::<Item>::new("p");
        let pred = Predicate::new(p.clone(), n_gt(&p, 0)).unwrap();
        let doubled = pred.combine(&pred, Expr::Or);

        match doubled.body() {
            Expr::Or(l, r) => assert!(Arc::ptr_eq(l, r)),
            _ => panic!("expected or node"),
        }
    }

    #[test]
    fn clones_share_identity() {
        let pred = Predicate::<Item>::from_fn("positive", |i| i.n > 0);
        assert!(pred.same_tree(&pred.clone()));
        assert!(!pred.same_tree(&pred.negate()));
    }
}
