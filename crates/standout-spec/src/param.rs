//! Symbolic parameters and field references.
//!
//! Every leaf of an expression tree records which [`Param`] it reads. A
//! [`Predicate`](crate::Predicate) binds exactly one parameter, and combinators
//! rebind operands onto a shared one before splicing trees together.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use regex::Regex;

use crate::clause::{Condition, Operand};
use crate::error::Result;
use crate::expr::Expr;
use crate::fields::{Accessor, Fields};
use crate::op::Op;

static NEXT_PARAM_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Param`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(u64);

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A symbolic parameter standing for the item a predicate is applied to.
///
/// Two calls to [`Param::new`] always produce distinct parameters, even with
/// the same name. Clones share the identity of the original.
///
/// # Example
///
/// ```
/// use standout_spec::{Fields, Number, Param, Predicate, Value};
///
/// struct User {
///     age: u32,
/// }
///
/// impl Fields for User {
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "age" => Value::Number(Number::U64(self.age as u64)),
///             _ => Value::None,
///         }
///     }
/// }
///
/// let user = Param::<User>::new("user");
/// let adult = Predicate::new(user.clone(), user.field("age").gte(18)).unwrap();
/// assert_eq!(adult.to_string(), "age >= 18");
/// ```
pub struct Param<T> {
    id: ParamId,
    name: Arc<str>,
    _item: PhantomData<fn(&T)>,
}

impl<T> Param<T> {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Param {
            id: ParamId(NEXT_PARAM_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            _item: PhantomData,
        }
    }

    pub fn id(&self) -> ParamId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// References a field through the item's [`Fields`] implementation.
    pub fn field(&self, field: impl Into<String>) -> FieldRef<T>
    where
        T: Fields,
    {
        self.field_with(field, T::accessor())
    }

    /// References a field through an explicit accessor function.
    pub fn field_with(&self, field: impl Into<String>, accessor: Accessor<T>) -> FieldRef<T> {
        FieldRef {
            param: self.id,
            field: field.into(),
            accessor,
        }
    }

    /// Builds an opaque leaf from a closure.
    ///
    /// Closure leaves evaluate in-process like any other node, but query
    /// providers cannot translate them.
    pub fn test<F>(&self, name: impl Into<Arc<str>>, test: F) -> Expr<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Expr::Test {
            param: self.id,
            name: name.into(),
            test: Arc::new(test),
        }
    }
}

impl<T> Default for Param<T> {
    fn default() -> Self {
        Param::new("item")
    }
}

impl<T> Clone for Param<T> {
    fn clone(&self) -> Self {
        Param {
            id: self.id,
            name: Arc::clone(&self.name),
            _item: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Param<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// A named field of a parameter, ready to be compared.
pub struct FieldRef<T> {
    param: ParamId,
    field: String,
    accessor: Accessor<T>,
}

impl<T> FieldRef<T> {
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Builds a comparison leaf with an arbitrary operator.
    pub fn compare(self, op: Op, operand: impl Into<Operand>) -> Expr<T> {
        Expr::Compare {
            param: self.param,
            condition: Arc::new(Condition::new(self.field, op, operand)),
            accessor: self.accessor,
        }
    }

    pub fn eq(self, operand: impl Into<Operand>) -> Expr<T> {
        self.compare(Op::Eq, operand)
    }

    pub fn ne(self, operand: impl Into<Operand>) -> Expr<T> {
        self.compare(Op::Ne, operand)
    }

    pub fn gt(self, operand: impl Into<Operand>) -> Expr<T> {
        self.compare(Op::Gt, operand)
    }

    pub fn gte(self, operand: impl Into<Operand>) -> Expr<T> {
        self.compare(Op::Gte, operand)
    }

    pub fn lt(self, operand: impl Into<Operand>) -> Expr<T> {
        self.compare(Op::Lt, operand)
    }

    pub fn lte(self, operand: impl Into<Operand>) -> Expr<T> {
        self.compare(Op::Lte, operand)
    }

    pub fn contains(self, needle: &str) -> Expr<T> {
        self.compare(Op::Contains, needle)
    }

    pub fn starts_with(self, prefix: &str) -> Expr<T> {
        self.compare(Op::StartsWith, prefix)
    }

    pub fn ends_with(self, suffix: &str) -> Expr<T> {
        self.compare(Op::EndsWith, suffix)
    }

    /// Enum discriminant is one of `discriminants`.
    pub fn is_in<I>(self, discriminants: I) -> Expr<T>
    where
        I: IntoIterator<Item = u32>,
    {
        let set: Vec<u32> = discriminants.into_iter().collect();
        self.compare(Op::In, set)
    }

    /// Regular expression match. Fails if the pattern doesn't compile.
    pub fn matches(self, pattern: &str) -> Result<Expr<T>> {
        let regex = Regex::new(pattern)?;
        Ok(self.compare(Op::Matches, regex))
    }
}
