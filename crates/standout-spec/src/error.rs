//! Error types for building, evaluating and translating specifications.

use thiserror::Error;

/// Errors raised while building predicates or handing them to a query
/// provider.
#[derive(Debug, Error)]
pub enum SpecError {
    /// A constructor received an unusable argument, such as a predicate body
    /// that reads a parameter the predicate does not bind.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid regular expression pattern.
    #[error("invalid regex pattern: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// A query provider met a leaf it cannot express, typically a closure.
    #[error("predicate leaf `{0}` cannot be translated into a query filter")]
    Untranslatable(String),
}

/// Result type for fallible construction and translation.
pub type Result<T> = std::result::Result<T, SpecError>;

/// Failure side of an [`Evaluation`]: the item does not satisfy the
/// specification.
///
/// Carries nothing else. Use
/// [`Specification::description`](crate::Specification::description) for a
/// human-readable account of what was required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("specification not satisfied")]
pub struct NotSatisfied;

/// Outcome of evaluating a specification against one item.
pub type Evaluation = std::result::Result<(), NotSatisfied>;
