//! Comparison operators for leaf conditions.

use std::cmp::Ordering;

/// Comparison operator of a [`Condition`](crate::Condition).
///
/// - **Ordering**: `Eq`, `Ne`, `Gt`, `Gte`, `Lt`, `Lte` (numbers; `Eq`/`Ne`
///   also strings, bools and enums)
/// - **String**: `StartsWith`, `EndsWith`, `Contains`, `Matches`
/// - **Enum**: `In`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    StartsWith,
    EndsWith,
    Contains,
    /// Regular expression match.
    Matches,
    /// Enum discriminant is one of a set.
    In,
}

impl Op {
    /// Returns `true` for the operators decided by an [`Ordering`].
    pub fn is_ordering_op(self) -> bool {
        matches!(self, Op::Eq | Op::Ne | Op::Gt | Op::Gte | Op::Lt | Op::Lte)
    }

    /// Decides an ordering-based comparison. Non-ordering operators yield
    /// `false`.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Gte => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Lte => ordering != Ordering::Greater,
            _ => false,
        }
    }

    /// Symbol used when rendering expressions.
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Eq => "==",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::StartsWith => "starts with",
            Op::EndsWith => "ends with",
            Op::Contains => "contains",
            Op::Matches => "matches",
            Op::In => "in",
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}
