//! The [`Specification`] type: a described, composable predicate.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};
use std::sync::Arc;

use tracing::trace;

use crate::cache::{self, EvaluatorCache};
use crate::error::{Evaluation, NotSatisfied, Result};
use crate::expr::{Expr, Predicate};
use crate::param::Param;
use crate::query::Queryable;

/// A predicate over `T` paired with a description of its intent.
///
/// Specifications are immutable. Combinators ([`and`](Self::and),
/// [`or`](Self::or), [`not`](Self::not), [`xor`](Self::xor),
/// [`nand`](Self::nand), [`nor`](Self::nor)) and their operator forms
/// (`&`, `|`, `!`, `^`) always build a new specification whose description
/// records how it was assembled.
///
/// # Example
///
/// ```
/// use standout_spec::Specification;
///
/// struct Member {
///     score: u32,
///     active: bool,
/// }
///
/// let high_score = Specification::from_fn("HighScore", |m: &Member| m.score > 50);
/// let is_active = Specification::from_fn("IsActive", |m: &Member| m.active);
///
/// let eligible = &high_score & &is_active;
/// assert_eq!(eligible.description(), "HighScore and IsActive");
/// assert!(eligible.evaluate(&Member { score: 60, active: true }).is_ok());
/// assert!(eligible.evaluate(&Member { score: 60, active: false }).is_err());
/// ```
pub struct Specification<T> {
    predicate: Predicate<T>,
    description: Arc<str>,
}

impl<T: 'static> Specification<T> {
    /// Creates a specification from a validated predicate.
    pub fn new(predicate: Predicate<T>, description: impl Into<Arc<str>>) -> Self {
        Specification {
            predicate,
            description: description.into(),
        }
    }

    /// Creates a specification from a parameter and a body built on it.
    ///
    /// Fails with [`SpecError::InvalidArgument`](crate::SpecError::InvalidArgument)
    /// if `body` reads a parameter other than `param`.
    pub fn try_new(
        param: Param<T>,
        body: Expr<T>,
        description: impl Into<Arc<str>>,
    ) -> Result<Self> {
        Ok(Specification::new(Predicate::new(param, body)?, description))
    }

    /// Creates a specification from a closure. The description also names
    /// the opaque leaf.
    pub fn from_fn<F>(description: impl Into<Arc<str>>, test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let description = description.into();
        Specification {
            predicate: Predicate::from_fn(Arc::clone(&description), test),
            description,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn predicate(&self) -> &Predicate<T> {
        &self.predicate
    }

    /// Evaluates `item` with the process-wide evaluator cache.
    pub fn evaluate(&self, item: &T) -> Evaluation {
        self.evaluate_in(cache::global(), item)
    }

    /// Evaluates `item` with a caller-supplied evaluator cache.
    pub fn evaluate_in(&self, cache: &EvaluatorCache, item: &T) -> Evaluation {
        let evaluator = cache.get_or_compile(&self.predicate);
        let satisfied = evaluator(item);
        trace!(spec = %self.description, satisfied, "evaluated specification");
        outcome(satisfied)
    }

    pub fn is_satisfied_by(&self, item: &T) -> bool {
        self.evaluate(item).is_ok()
    }

    /// Evaluates every item, in order, without stopping at failures.
    pub fn evaluate_all<'a, I>(&self, items: I) -> Vec<Evaluation>
    where
        I: IntoIterator<Item = &'a T>,
    {
        self.evaluate_all_in(cache::global(), items)
    }

    /// Like [`evaluate_all`](Self::evaluate_all), with a caller-supplied
    /// evaluator cache.
    pub fn evaluate_all_in<'a, I>(&self, cache: &EvaluatorCache, items: I) -> Vec<Evaluation>
    where
        I: IntoIterator<Item = &'a T>,
    {
        let evaluator = cache.get_or_compile(&self.predicate);
        items.into_iter().map(|item| outcome(evaluator(item))).collect()
    }

    /// Like [`evaluate_all`](Self::evaluate_all), spread over the rayon pool.
    /// Output order matches input order.
    #[cfg(feature = "parallel")]
    pub fn par_evaluate_all(&self, items: &[T]) -> Vec<Evaluation>
    where
        T: Sync,
    {
        self.par_evaluate_all_in(cache::global(), items)
    }

    #[cfg(feature = "parallel")]
    pub fn par_evaluate_all_in(&self, cache: &EvaluatorCache, items: &[T]) -> Vec<Evaluation>
    where
        T: Sync,
    {
        use rayon::prelude::*;

        let evaluator = cache.get_or_compile(&self.predicate);
        items
            .par_iter()
            .map(|item| outcome(evaluator(item)))
            .collect()
    }

    /// Attaches this specification's predicate to a query as a filter.
    ///
    /// The provider decides when items are tested; the built-in providers
    /// defer all work until the caller iterates or renders the query.
    pub fn apply<Q>(&self, query: Q) -> Q::Filtered
    where
        Q: Queryable<T>,
    {
        query.filter(&self.predicate)
    }

    pub fn and(&self, other: &Specification<T>) -> Specification<T> {
        Specification::new(
            self.predicate.combine(&other.predicate, Expr::And),
            format!("{} and {}", self.description, other.description),
        )
    }

    pub fn or(&self, other: &Specification<T>) -> Specification<T> {
        Specification::new(
            self.predicate.combine(&other.predicate, Expr::Or),
            format!("{} or {}", self.description, other.description),
        )
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(&self) -> Specification<T> {
        Specification::new(
            self.predicate.negate(),
            format!("Not {}", self.description),
        )
    }

    pub fn xor(&self, other: &Specification<T>) -> Specification<T> {
        Specification::new(
            self.predicate.combine(&other.predicate, Expr::Xor),
            format!("{} xor {}", self.description, other.description),
        )
    }

    pub fn nand(&self, other: &Specification<T>) -> Specification<T> {
        Specification::new(
            self.predicate.combine(&other.predicate, Expr::And).negate(),
            format!("{} nand {}", self.description, other.description),
        )
    }

    pub fn nor(&self, other: &Specification<T>) -> Specification<T> {
        Specification::new(
            self.predicate.combine(&other.predicate, Expr::Or).negate(),
            format!("{} nor {}", self.description, other.description),
        )
    }
}

fn outcome(satisfied: bool) -> Evaluation {
    if satisfied {
        Ok(())
    } else {
        Err(NotSatisfied)
    }
}

impl<T> Clone for Specification<T> {
    fn clone(&self) -> Self {
        Specification {
            predicate: self.predicate.clone(),
            description: Arc::clone(&self.description),
        }
    }
}

impl<T> fmt::Display for Specification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl<T> fmt::Debug for Specification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("description", &self.description)
            .field("predicate", &self.predicate)
            .finish()
    }
}

// Operator forms. Each forwards to the named combinator.

impl<T: 'static> BitAnd for &Specification<T> {
    type Output = Specification<T>;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl<T: 'static> BitAnd for Specification<T> {
    type Output = Specification<T>;

    fn bitand(self, rhs: Self) -> Self::Output {
        Specification::and(&self, &rhs)
    }
}

impl<T: 'static> BitOr for &Specification<T> {
    type Output = Specification<T>;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl<T: 'static> BitOr for Specification<T> {
    type Output = Specification<T>;

    fn bitor(self, rhs: Self) -> Self::Output {
        Specification::or(&self, &rhs)
    }
}

impl<T: 'static> BitXor for &Specification<T> {
    type Output = Specification<T>;

    fn bitxor(self, rhs: Self) -> Self::Output {
        self.xor(rhs)
    }
}

impl<T: 'static> BitXor for Specification<T> {
    type Output = Specification<T>;

    fn bitxor(self, rhs: Self) -> Self::Output {
        Specification::xor(&self, &rhs)
    }
}

// Borrowed only: a by-value impl would shadow the `not` combinator whenever
// `std::ops::Not` is in scope.
impl<T: 'static> Not for &Specification<T> {
    type Output = Specification<T>;

    fn not(self) -> Self::Output {
        Specification::not(self)
    }
}
