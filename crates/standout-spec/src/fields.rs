//! Named field access on item types.
//!
//! Implementing [`Fields`] lets [`Param::field`](crate::Param::field) build
//! inspectable conditions on an item type. Types that don't implement it can
//! still use [`Param::field_with`](crate::Param::field_with) with a plain
//! accessor function, or opaque closures through
//! [`Param::test`](crate::Param::test).

use crate::value::Value;

/// Field accessor used by leaf conditions.
///
/// Returns the value of `field` borrowed from the item.
pub type Accessor<T> = for<'a> fn(&'a T, &str) -> Value<'a>;

/// Types whose fields can be named in conditions.
///
/// # Example
///
/// ```
/// use standout_spec::{Fields, Number, Value};
///
/// struct Account {
///     owner: String,
///     balance: i64,
///     frozen: bool,
/// }
///
/// impl Fields for Account {
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "owner" => Value::String(&self.owner),
///             "balance" => Value::Number(Number::I64(self.balance)),
///             "frozen" => Value::Bool(self.frozen),
///             _ => Value::None,
///         }
///     }
/// }
/// ```
pub trait Fields {
    /// Returns the value of a field, or [`Value::None`] for unknown fields.
    fn field_value(&self, field: &str) -> Value<'_>;

    /// Returns [`Fields::field_value`] as an [`Accessor`].
    fn accessor() -> Accessor<Self>
    where
        Self: Sized,
    {
        Self::field_value
    }
}
