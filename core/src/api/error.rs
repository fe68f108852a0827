//! Public error type for the `Folder` API.

use thiserror::Error;

use crate::resolver::FoldError;
use crate::scope_stack::DuplicateError;
use crate::syntax::ParseError;

/// Error returned by [`Folder`](super::Folder) operations.
///
/// Recoverable evaluation failures never show up here: the folder logs them
/// and leaves the affected subexpression unfolded.
#[derive(Debug, Error)]
pub enum Error {
    /// The source text is not a valid expression.
    #[error("Parse error: {0}")]
    Parse(Box<ParseError>),

    /// The fold itself failed (malformed input or a resource limit).
    #[error("Fold error: {0}")]
    Fold(#[from] FoldError),

    /// Two bindings with the same name were registered.
    #[error("Environment error: {0}")]
    Environment(#[from] DuplicateError),
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(Box::new(err))
    }
}

impl Error {
    pub fn is_depth_exceeded(&self) -> bool {
        matches!(self, Error::Fold(FoldError::DepthExceeded { .. }))
    }
}
