//! Spec - Composable specification predicates for Rust types.
//!
//! A [`Specification`] pairs a predicate over some item type with a
//! description of its intent. Specifications combine with `and`, `or`, `not`,
//! `xor`, `nand` and `nor` (or `&`, `|`, `!`, `^`), evaluate against single
//! items or batches, and attach to lazily evaluated queries.
//!
//! Predicates are expression trees rather than opaque closures:
//!
//! - Trees are compiled to closures on first evaluation and cached by
//!   identity, so repeated evaluation never re-walks the tree
//! - Field comparisons stay inspectable, so a query provider can translate
//!   them (see [`SqlQuery`]) instead of running them in-process
//! - Combining trees built on different [`Param`]s rebinds one operand onto
//!   the other's parameter before splicing
//!
//! # Quick Start
//!
//! ```rust
//! use standout_spec::{Fields, NotSatisfied, Number, Param, Specification, Value};
//!
//! struct Member {
//!     name: String,
//!     score: i64,
//!     active: bool,
//! }
//!
//! impl Fields for Member {
//!     fn field_value(&self, field: &str) -> Value<'_> {
//!         match field {
//!             "name" => Value::String(&self.name),
//!             "score" => Value::Number(Number::I64(self.score)),
//!             "active" => Value::Bool(self.active),
//!             _ => Value::None,
//!         }
//!     }
//! }
//!
//! let m = Param::<Member>::new("member");
//! let high_score = Specification::try_new(m.clone(), m.field("score").gt(50), "HighScore").unwrap();
//!
//! // Built on its own parameter; rebound when combined.
//! let is_active = Specification::from_fn("IsActive", |m: &Member| m.active);
//!
//! let eligible = high_score.and(&is_active);
//! assert_eq!(eligible.description(), "HighScore and IsActive");
//!
//! let ann = Member { name: "Ann".into(), score: 60, active: false };
//! assert_eq!(eligible.evaluate(&ann), Err(NotSatisfied));
//! assert!(eligible.evaluate(&Member { active: true, ..ann }).is_ok());
//! ```
//!
//! # Evaluation
//!
//! [`Specification::evaluate`] returns an [`Evaluation`]: `Ok(())` when the
//! item satisfies the predicate, `Err(NotSatisfied)` otherwise. A false
//! predicate is a normal outcome, not an error; the failure carries no
//! message, and [`Specification::description`] says what was required.
//!
//! Compiled evaluators live in a process-wide [`EvaluatorCache`] (see
//! [`cache::global`]). Pass your own cache to
//! [`Specification::evaluate_in`] to keep entries scoped.
//!
//! # Leaf Conditions
//!
//! | Operand | Operators |
//! |---------|-----------|
//! | String | `Eq`, `Ne`, `Gt`, `Gte`, `Lt`, `Lte`, `StartsWith`, `EndsWith`, `Contains` |
//! | Regex | `Matches` |
//! | Number | `Eq`, `Ne`, `Gt`, `Gte`, `Lt`, `Lte` |
//! | Bool | `Eq`, `Ne` |
//! | Enum | `Eq`, `Ne`, `In` |
//!
//! A missing field ([`Value::None`]) or a type mismatch never matches.
//!
//! # Features
//!
//! - `parallel`: adds [`Specification::par_evaluate_all`], backed by rayon.

pub mod cache;
mod clause;
mod compile;
mod error;
mod expr;
mod fields;
mod op;
mod param;
mod query;
mod spec;
mod sql;
mod value;

pub use cache::{CacheStats, EvaluatorCache};
pub use clause::{Condition, Operand};
pub use compile::{compile, Evaluator};
pub use error::{Evaluation, NotSatisfied, Result, SpecError};
pub use expr::{Expr, Predicate, TestFn};
pub use fields::{Accessor, Fields};
pub use op::Op;
pub use param::{FieldRef, Param, ParamId};
pub use query::{InMemory, Matches, Queryable};
pub use spec::Specification;
pub use sql::{translate, SqlFragment, SqlParam, SqlQuery};
pub use value::{Number, Value};
