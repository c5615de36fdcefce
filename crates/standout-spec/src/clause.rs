//! Leaf conditions: a field, an operator and an owned operand.
//!
//! A [`Condition`] is the inspectable leaf of an expression tree. Because it
//! is plain data, a query provider can translate it (see [`crate::SqlQuery`])
//! instead of running it in-process.

use std::fmt;

use regex::Regex;

use crate::op::Op;
use crate::value::{Number, Value};

/// A single comparison against a named field.
///
/// # Example
///
/// ```
/// use standout_spec::{Condition, Op, Value, Number};
///
/// let adult = Condition::new("age", Op::Gte, 18);
/// assert!(adult.matches(&Value::Number(Number::U64(18))));
/// assert!(!adult.matches(&Value::Number(Number::U64(17))));
/// ```
#[derive(Debug, Clone)]
pub struct Condition {
    pub field: String,
    pub op: Op,
    pub operand: Operand,
}

impl Condition {
    pub fn new(field: impl Into<String>, op: Op, operand: impl Into<Operand>) -> Self {
        Condition {
            field: field.into(),
            op,
            operand: operand.into(),
        }
    }

    /// Tests a field value against this condition.
    ///
    /// Missing values and type mismatches never match, for any operator.
    pub fn matches(&self, value: &Value<'_>) -> bool {
        match (&self.operand, value) {
            (_, Value::None) => false,
            (Operand::Regex(regex), Value::String(s)) => {
                self.op == Op::Matches && regex.is_match(s)
            }
            (Operand::String(expected), Value::String(s)) => self.match_string(s, expected),
            (Operand::Number(expected), Value::Number(n)) => n
                .compare(*expected)
                .is_some_and(|ordering| self.op.eval_ordering(ordering)),
            (Operand::Bool(expected), Value::Bool(b)) => match self.op {
                Op::Eq => b == expected,
                Op::Ne => b != expected,
                _ => false,
            },
            (Operand::Enum(expected), Value::Enum(d)) => match self.op {
                Op::Eq => d == expected,
                Op::Ne => d != expected,
                _ => false,
            },
            (Operand::EnumSet(set), Value::Enum(d)) => self.op == Op::In && set.contains(d),
            _ => false,
        }
    }

    fn match_string(&self, field: &str, expected: &str) -> bool {
        match self.op {
            Op::Eq => field == expected,
            Op::Ne => field != expected,
            Op::StartsWith => field.starts_with(expected),
            Op::EndsWith => field.ends_with(expected),
            Op::Contains => field.contains(expected),
            Op::Gt | Op::Gte | Op::Lt | Op::Lte => self.op.eval_ordering(field.cmp(expected)),
            Op::Matches | Op::In => false,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.operand)
    }
}

/// Owned right-hand side of a [`Condition`].
#[derive(Debug, Clone)]
pub enum Operand {
    String(String),
    Number(Number),
    Bool(bool),
    Enum(u32),
    /// Discriminant set for [`Op::In`].
    EnumSet(Vec<u32>),
    /// Compiled pattern for [`Op::Matches`].
    Regex(Regex),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::String(s) => write!(f, "{:?}", s),
            Operand::Number(n) => write!(f, "{}", n),
            Operand::Bool(b) => write!(f, "{}", b),
            Operand::Enum(d) => write!(f, "#{}", d),
            Operand::EnumSet(set) => {
                f.write_str("[")?;
                for (i, d) in set.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "#{}", d)?;
                }
                f.write_str("]")
            }
            Operand::Regex(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Operand::String(s)
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::String(s.to_string())
    }
}

impl From<bool> for Operand {
    fn from(b: bool) -> Self {
        Operand::Bool(b)
    }
}

impl From<Number> for Operand {
    fn from(n: Number) -> Self {
        Operand::Number(n)
    }
}

impl From<Regex> for Operand {
    fn from(r: Regex) -> Self {
        Operand::Regex(r)
    }
}

impl From<Vec<u32>> for Operand {
    fn from(set: Vec<u32>) -> Self {
        Operand::EnumSet(set)
    }
}

macro_rules! operand_from_number {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Operand {
                fn from(n: $ty) -> Self {
                    Operand::Number(Number::from(n))
                }
            }
        )+
    };
}

operand_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);
