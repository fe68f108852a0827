//! Literal folding over expression trees.
//!
//! The resolver reduces every subexpression it can prove constant to a
//! value, and leaves everything else as a (possibly simplified) node.
//!
//! ## Design Principles
//!
//! - **Never emit a wrong literal**: when an operation fails, or its operands
//!   are not all known, the node is kept as it was.
//! - **No side effects**: only functions in the pure-function registry are
//!   called.
//! - **Stack-safe**: depth tracking turns runaway recursion into
//!   `FoldError::DepthExceeded`.
//!
//! ## Example
//!
//! ```
//! use litfold_core::resolver::{FoldContext, resolve_literal};
//! use litfold_core::scope_stack::ScopeStack;
//! use litfold_core::registry::PureFunctionRegistry;
//! use litfold_core::syntax::parse;
//!
//! let scopes = ScopeStack::new();
//! let registry = PureFunctionRegistry::new();
//! let ctx = FoldContext::new(&scopes, &registry);
//!
//! let folded = resolve_literal(&parse("x * 1 + 2 * 3").unwrap(), &ctx).unwrap();
//! assert_eq!(folded.to_string(), "x + 6");
//! ```

mod bridge;
mod error;
mod indexable;
mod literal;
mod names;
pub mod operators;

#[cfg(test)]
mod literal_test;

pub use bridge::{is_value_wrappable, is_wrappable, narrow_number, to_node, value_to_node};
pub use error::{EvaluationFailure, FoldError};
pub use indexable::{Indexable, SequenceKind, resolve_indexable};
pub use literal::{resolve_literal, resolve_literal_raw};
pub use names::resolve_name_or_attribute;

use core::cell::Cell;

use crate::api::FoldOptions;
use crate::registry::PureFunctionRegistry;
use crate::scope_stack::ScopeStack;
use crate::values::Resolution;

/// Everything a fold reads: name bindings, the pure-function registry and
/// resource limits.
///
/// A context is read-only for the duration of a fold. The depth counter is
/// private to each entry-point call, so one context may be shared by folds
/// running on several threads.
pub struct FoldContext<'a> {
    scopes: &'a ScopeStack<'a, Resolution>,
    pure_functions: &'a PureFunctionRegistry,
    options: FoldOptions,
}

impl<'a> FoldContext<'a> {
    pub fn new(
        scopes: &'a ScopeStack<'a, Resolution>,
        pure_functions: &'a PureFunctionRegistry,
    ) -> Self {
        Self::with_options(scopes, pure_functions, FoldOptions::default())
    }

    pub fn with_options(
        scopes: &'a ScopeStack<'a, Resolution>,
        pure_functions: &'a PureFunctionRegistry,
        options: FoldOptions,
    ) -> Self {
        Self {
            scopes,
            pure_functions,
            options,
        }
    }

    pub fn scopes(&self) -> &ScopeStack<'a, Resolution> {
        self.scopes
    }

    pub fn pure_functions(&self) -> &PureFunctionRegistry {
        self.pure_functions
    }

    pub fn options(&self) -> &FoldOptions {
        &self.options
    }
}

/// Per-call recursion bookkeeping threaded through the handlers.
pub(crate) struct Resolver<'c, 'a> {
    pub(crate) ctx: &'c FoldContext<'a>,
    depth: Cell<usize>,
}

impl<'c, 'a> Resolver<'c, 'a> {
    pub(crate) fn new(ctx: &'c FoldContext<'a>) -> Self {
        Self {
            ctx,
            depth: Cell::new(0),
        }
    }

    /// Run `f` one level deeper, failing once the configured limit is reached.
    pub(crate) fn descend<T>(
        &self,
        f: impl FnOnce() -> Result<T, FoldError>,
    ) -> Result<T, FoldError> {
        let depth = self.depth.get();
        let max_depth = self.ctx.options.max_depth;
        if depth >= max_depth {
            return Err(FoldError::DepthExceeded { depth, max_depth });
        }
        self.depth.set(depth + 1);
        let result = f();
        self.depth.set(depth);
        result
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth.get()
    }
}
