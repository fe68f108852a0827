//! Environment builder for registering global bindings.

use crate::values::{FunctionRef, NativeFn, Namespace, Resolution, Value};

/// Builder for the global bindings of a [`Folder`](super::Folder).
///
/// Globals sit in a scope above the builtins, so a global may shadow a
/// builtin of the same name. Functions only fold when registered as pure.
///
/// # Example
///
/// ```
/// use litfold_core::api::{Folder, FoldOptions};
/// use litfold_core::values::Value;
///
/// let folder = Folder::new(FoldOptions::default(), |env| {
///     env.register("limit", Value::Int(10));
/// })
/// .unwrap();
/// assert_eq!(folder.fold("limit * 2").unwrap().to_string(), "20");
/// ```
#[derive(Default)]
pub struct EnvironmentBuilder {
    entries: Vec<(String, Resolution)>,
    pure_functions: Vec<FunctionRef>,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a global value or residual expression.
    pub fn register(&mut self, name: &str, value: impl Into<Resolution>) {
        self.entries.push((name.to_string(), value.into()));
    }

    /// Register a native function that folding is allowed to call.
    pub fn register_pure(&mut self, name: &'static str, func: NativeFn) -> FunctionRef {
        let function = FunctionRef::native(name, func);
        self.register_pure_ref(name, function.clone());
        function
    }

    /// Register an existing function as pure under `name`.
    pub fn register_pure_ref(&mut self, name: &str, function: FunctionRef) {
        self.pure_functions.push(function.clone());
        self.register(name, Value::Function(function));
    }

    /// Register a function folding must never call.
    pub fn register_impure(&mut self, name: &'static str, func: NativeFn) {
        self.register(name, Value::Function(FunctionRef::native(name, func)));
    }

    /// Register a namespace; `pure` lists the member functions that may be
    /// called during folding.
    pub fn register_namespace(
        &mut self,
        namespace: Namespace,
        pure: impl IntoIterator<Item = FunctionRef>,
    ) {
        self.pure_functions.extend(pure);
        let name = namespace.name().to_string();
        self.register(&name, Value::Namespace(namespace));
    }

    pub(crate) fn build(self) -> (Vec<(String, Resolution)>, Vec<FunctionRef>) {
        (self.entries, self.pure_functions)
    }
}
