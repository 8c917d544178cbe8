//! Calculation error types

use thiserror::Error;

/// Errors raised while evaluating the buffer
///
/// These never reach the caller of `handle_key` as `Err`; the core turns
/// them into the `"Error"` sentinel and reports them in the outcome.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CalcError {
    /// Malformed numeric token, empty operand or stray character
    #[error("Parse error: {0}")]
    Parse(String),

    /// Division, fraction denominator or root index of zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Even root of a negative number and similar
    #[error("Domain error: {0}")]
    Domain(String),

    /// NaN or non-finite result
    #[error("Result out of range")]
    Range,
}

impl CalcError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        CalcError::Parse(message.into())
    }

    pub(crate) fn domain(message: impl Into<String>) -> Self {
        CalcError::Domain(message.into())
    }
}
