//! Runtime values produced by folding.

mod function;
mod namespace;
mod value;

pub use function::{Function, FunctionRef, NativeFn, NativeFunction};
pub use namespace::Namespace;
pub use value::{Resolution, Value};
