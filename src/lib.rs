//! litfold - literal folding for Python-like expressions
//!
//! # Overview
//!
//! litfold takes an expression and the names visible to it, computes every
//! part that is provably constant, and hands back the simplified
//! expression. Common use cases include:
//!
//! - Pre-computing configuration expressions before they are stored
//! - Simplifying generated filter expressions
//! - Inspecting which parts of a rule depend on runtime input
//!
//! # Quick Start
//!
//! ```
//! use litfold::{Folder, FoldOptions, Value};
//!
//! let folder = Folder::new(FoldOptions::default(), |env| {
//!     env.register("threshold", Value::Int(10));
//! })
//! .unwrap();
//!
//! let folded = folder.fold("score * (threshold + 5) + 0 or False").unwrap();
//! assert_eq!(folded.to_string(), "score * 15");
//! ```
//!
//! # Safety of folding
//!
//! Folding never produces a literal that evaluation would not. Operations
//! that would fail at runtime (`1 / 0`, `len(1)`) are left in place, and only
//! functions registered as pure are ever called.
//!
//! # Native functions
//!
//! ```
//! use litfold::{EvaluationFailure, Folder, FoldOptions, Value};
//!
//! fn double(args: &[Value], _kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
//!     match args {
//!         [Value::Int(i)] => i
//!             .checked_mul(2)
//!             .map(Value::Int)
//!             .ok_or_else(|| EvaluationFailure::overflow("double")),
//!         _ => Err(EvaluationFailure::invalid_argument("double", "expected one int")),
//!     }
//! }
//!
//! let folder = Folder::new(FoldOptions::default(), |env| {
//!     env.register_pure("double", double);
//! })
//! .unwrap();
//! assert_eq!(folder.fold("double(21)").unwrap().to_string(), "42");
//! ```

// Re-export public API from litfold_core
pub use litfold_core::api::{EnvironmentBuilder, Error, FoldOptions, Folder};

// Re-export the building blocks
pub use litfold_core::registry::PureFunctionRegistry;
pub use litfold_core::resolver::{
    self, EvaluationFailure, FoldContext, FoldError, is_wrappable, resolve_indexable,
    resolve_literal, resolve_literal_raw, resolve_name_or_attribute, to_node, value_to_node,
};
pub use litfold_core::scope_stack::{self, CompleteScope, MutableScope, Scope, ScopeStack};
pub use litfold_core::stdlib::{self, Builtins};
pub use litfold_core::syntax::{self, Expr, parse};
pub use litfold_core::values::{
    self, Function, FunctionRef, NativeFn, NativeFunction, Namespace, Resolution, Value,
};
