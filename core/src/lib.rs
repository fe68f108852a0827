//! Literal folding for a Python-like expression language.
//!
//! Given an expression tree and the names visible to it, the resolver
//! reduces every subexpression it can prove constant to a value and leaves
//! the rest as a simplified tree. See [`api::Folder`] for the one-call entry
//! point and [`resolver`] for the building blocks.

pub mod api;
pub mod registry;
pub mod resolver;
pub mod scope_stack;
pub mod stdlib;
pub mod syntax;
pub mod values;

pub use api::{Error, FoldOptions, Folder};
pub use resolver::{FoldContext, FoldError, resolve_literal, resolve_literal_raw};

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_subscript_folding() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
