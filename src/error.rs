//! Error types for the Logpoint backend crate.

use std::fmt;

pub type Result<T> = std::result::Result<T, BackendError>;

/// Rule-scoped compilation failures.
///
/// Every variant is non-fatal to a batch: callers compile N rules and
/// collect per-rule success/failure independently. Within one rule, any
/// leaf-level failure fails the whole rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The condition references a selection that does not exist.
    UnresolvedSelection(String),
    /// A modifier combination has no defined Logpoint translation.
    UnsupportedModifier(String),
    /// A raw value is malformed for its modifier (bad CIDR, bad regex,
    /// empty value list).
    InvalidValue(String),
    /// A quantifier glob matched no selection names.
    NoMatchingSelections(String),
    /// The rule cannot be decomposed into expressible Logpoint queries.
    UnsupportedRule(String),
    /// The condition expression could not be tokenized or parsed.
    ConditionError(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::UnresolvedSelection(name) => {
                write!(f, "Unresolved selection reference: {name}")
            }
            BackendError::UnsupportedModifier(msg) => {
                write!(f, "Unsupported modifier combination: {msg}")
            }
            BackendError::InvalidValue(msg) => write!(f, "Invalid value: {msg}"),
            BackendError::NoMatchingSelections(pattern) => {
                write!(f, "No selections match pattern: {pattern}")
            }
            BackendError::UnsupportedRule(msg) => write!(f, "Unsupported rule: {msg}"),
            BackendError::ConditionError(msg) => write!(f, "Condition error: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}
