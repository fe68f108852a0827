//! Configuration options for folding.

/// Resource limits for a fold.
///
/// # Example
///
/// ```
/// use litfold_core::api::FoldOptions;
///
/// let options = FoldOptions { max_depth: 50 };
/// assert_eq!(FoldOptions::default().max_depth, 100);
/// # let _ = options;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldOptions {
    /// Maximum recursion depth of the resolver.
    ///
    /// Deeper trees, and bindings that refer back to themselves, fail with
    /// `FoldError::DepthExceeded` instead of exhausting the stack. The
    /// default leaves room on a 2 MiB thread stack in unoptimized builds;
    /// raise it only on threads with a larger stack.
    ///
    /// Default: 100
    pub max_depth: usize,
}

impl Default for FoldOptions {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}
