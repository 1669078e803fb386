//! # Boundary Errors
//!
//! Errors raised when a caller hands the core a value outside a closed set
//! (policy types, tool names). Built with `thiserror`.

use thiserror::Error;

/// A caller passed a name that does not match any variant of a closed set.
///
/// Carries the kind of set, the rejected value, and the accepted values so
/// that the surrounding shell can report something actionable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} \"{value}\" (expected one of: {})", expected.join(", "))]
pub struct UnknownVariantError {
    /// What was being parsed, e.g. `"policy type"` or `"tool"`.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
    /// The accepted spellings.
    pub expected: Vec<&'static str>,
}

impl UnknownVariantError {
    /// Build an error for `value` rejected from the set `expected`.
    pub fn new(kind: &'static str, value: impl Into<String>, expected: &[&'static str]) -> Self {
        Self {
            kind,
            value: value.into(),
            expected: expected.to_vec(),
        }
    }
}
