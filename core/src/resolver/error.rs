//! Folding errors.
//!
//! # Error Categories
//!
//! - **Hard errors** (`FoldError`): malformed input or a defect in the folder.
//!   These abort the fold and reach the caller.
//!
//! - **Evaluation failures** (`EvaluationFailure`): an operator, native function
//!   or lookup rejected its operands. The resolver logs these and returns the
//!   node unresolved; they never escape `resolve_literal`.

use thiserror::Error;

/// Hard error returned from the folding entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FoldError {
    /// A value has no literal syntax and cannot be turned into a node.
    #[error("cannot wrap {type_name} value `{value}` as a syntax node")]
    NotWrappable { value: String, type_name: &'static str },

    /// The node kind cannot be folded on its own (e.g. a bare slice).
    #[error("unsupported construct: {construct}")]
    UnsupportedConstruct { construct: &'static str },

    /// An internal invariant did not hold.
    #[error("internal consistency error: {detail}")]
    InternalConsistency { detail: String },

    /// Folding recursion went deeper than allowed.
    #[error("folding depth {depth} exceeds maximum of {max_depth}")]
    DepthExceeded { depth: usize, max_depth: usize },
}

/// Recoverable failure while evaluating an operation on literal values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationFailure {
    #[error("unsupported operand type(s) for {operation}: {detail}")]
    TypeMismatch { operation: String, detail: String },

    #[error("division by zero")]
    ZeroDivision,

    #[error("{operation} overflowed")]
    Overflow { operation: String },

    #[error("unhashable type: '{type_name}'")]
    Unhashable { type_name: &'static str },

    #[error("key {key} not found")]
    KeyMissing { key: String },

    #[error("index {index} out of range (length: {len})")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("{function}: {message}")]
    InvalidArgument { function: String, message: String },
}

impl EvaluationFailure {
    pub fn type_mismatch(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        EvaluationFailure::TypeMismatch {
            operation: operation.into(),
            detail: detail.into(),
        }
    }

    pub fn overflow(operation: impl Into<String>) -> Self {
        EvaluationFailure::Overflow {
            operation: operation.into(),
        }
    }

    pub fn invalid_argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        EvaluationFailure::InvalidArgument {
            function: function.into(),
            message: message.into(),
        }
    }
}
