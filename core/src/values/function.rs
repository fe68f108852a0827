//! Callable values.
//!
//! Functions are compared by identity: two `FunctionRef`s are equal only when
//! they point at the same allocation. The pure-function registry relies on
//! this to recognise the functions it was built from.

use std::sync::Arc;
use std::fmt;

use super::Value;
use crate::resolver::EvaluationFailure;

/// Trait for callable host functions.
pub trait Function {
    /// Name used in diagnostics and in the value's `repr`.
    fn name(&self) -> &str;

    /// Call the function with already-folded arguments.
    fn call(&self, args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure>;
}

/// Type alias for native function pointers.
///
/// # Example
///
/// ```ignore
/// fn builtin_len(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
///     let [value] = args else { return Err(arity("len", "1", args.len())) };
///     ...
/// }
/// ```
pub type NativeFn =
    fn(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure>;

/// Wrapper for native Rust function pointers.
pub struct NativeFunction {
    name: &'static str,
    func: NativeFn,
}

impl NativeFunction {
    pub fn new(name: &'static str, func: NativeFn) -> Self {
        Self { name, func }
    }
}

impl Function for NativeFunction {
    fn name(&self) -> &str {
        self.name
    }

    fn call(&self, args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
        (self.func)(args, kwargs)
    }
}

/// Shared handle to a function, with identity semantics.
#[derive(Clone)]
pub struct FunctionRef(Arc<dyn Function + Send + Sync>);

impl FunctionRef {
    pub fn new(function: impl Function + Send + Sync + 'static) -> Self {
        Self(Arc::new(function))
    }

    pub fn native(name: &'static str, func: NativeFn) -> Self {
        Self::new(NativeFunction::new(name, func))
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn call(&self, args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
        self.0.call(args, kwargs)
    }

    /// Address of the shared allocation, used as the function's identity.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for FunctionRef {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl fmt::Debug for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionRef({})", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(_args: &[Value], _kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
        Ok(Value::Int(42))
    }

    #[test]
    fn test_native_call() {
        let f = FunctionRef::native("answer", answer);
        assert_eq!(f.name(), "answer");
        assert_eq!(f.call(&[], &[]), Ok(Value::Int(42)));
    }

    #[test]
    fn test_identity_equality() {
        let f = FunctionRef::native("answer", answer);
        let g = FunctionRef::native("answer", answer);
        assert_eq!(f, f.clone());
        assert_ne!(f, g);
    }
}
