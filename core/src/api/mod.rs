//! Public API for literal folding.
//!
//! [`Folder`] bundles the builtins, caller-registered globals and the
//! pure-function registry, and folds source text or trees in one call.
//! The lower-level entry points live in [`crate::resolver`].
//!
//! # Example
//!
//! ```
//! use litfold_core::api::{Folder, FoldOptions};
//!
//! let folder = Folder::new(FoldOptions::default(), |_env| {}).unwrap();
//! assert_eq!(folder.fold("len('abc') + n").unwrap().to_string(), "3 + n");
//! ```

pub mod environment;
pub mod error;
pub mod folder;
pub mod options;

pub use environment::EnvironmentBuilder;
pub use error::Error;
pub use folder::Folder;
pub use options::FoldOptions;
