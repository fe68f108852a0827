//! Standard library available to folded expressions.
//!
//! This module provides the Python-style builtins (`abs`, `len`, `sorted`,
//! ...) and a `math` namespace. Everything except `print` is registered as
//! pure, so calls to these functions fold when their arguments do.
//!
//! # Example
//!
//! ```
//! use litfold_core::stdlib::Builtins;
//! use litfold_core::scope_stack::ScopeStack;
//!
//! let builtins = Builtins::new();
//! let mut scopes = ScopeStack::new();
//! scopes.push(builtins.scope());
//! assert!(scopes.lookup("len").is_some());
//! ```

use crate::registry::PureFunctionRegistry;
use crate::resolver::EvaluationFailure;
use crate::scope_stack::CompleteScope;
use crate::values::{FunctionRef, Resolution, Value};

pub mod builtins;
pub mod math;

pub use math::build_math_package;

/// The builtin scope together with the registry of its pure functions.
pub struct Builtins {
    scope: CompleteScope<Resolution>,
    registry: PureFunctionRegistry,
}

impl Builtins {
    pub fn new() -> Self {
        let (math, math_functions) = build_math_package();

        let mut bindings: Vec<(String, Resolution)> = Vec::new();
        let mut registry = PureFunctionRegistry::new();
        for &(name, func) in builtins::FUNCTIONS {
            let function = FunctionRef::native(name, func);
            registry.register(function.clone());
            bindings.push((name.to_string(), Resolution::Literal(Value::Function(function))));
        }
        registry.extend(math_functions);
        bindings.push((
            "math".to_string(),
            Resolution::Literal(Value::Namespace(math)),
        ));

        // Not pure: folding must never call it.
        let print = FunctionRef::native("print", builtins::builtin_print);
        bindings.push(("print".to_string(), Resolution::Literal(Value::Function(print))));

        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            scope: CompleteScope::from_sorted(bindings),
            registry,
        }
    }

    pub fn scope(&self) -> &CompleteScope<Resolution> {
        &self.scope
    }

    pub fn registry(&self) -> &PureFunctionRegistry {
        &self.registry
    }

    pub fn into_parts(self) -> (CompleteScope<Resolution>, PureFunctionRegistry) {
        (self.scope, self.registry)
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Argument helpers shared by the packages
// ============================================================================

pub(crate) fn arity(function: &str, expected: &str, got: usize) -> EvaluationFailure {
    EvaluationFailure::invalid_argument(
        function,
        format!("expected {expected} argument(s), got {got}"),
    )
}

pub(crate) fn no_keywords(
    function: &str,
    kwargs: &[(String, Value)],
) -> Result<(), EvaluationFailure> {
    match kwargs.first() {
        None => Ok(()),
        Some((name, _)) => Err(EvaluationFailure::invalid_argument(
            function,
            format!("unexpected keyword argument '{name}'"),
        )),
    }
}

/// Exactly `N` positional arguments and no keywords.
pub(crate) fn exact_args<'v, const N: usize>(
    function: &str,
    args: &'v [Value],
    kwargs: &[(String, Value)],
) -> Result<&'v [Value; N], EvaluationFailure> {
    no_keywords(function, kwargs)?;
    args.try_into()
        .map_err(|_| arity(function, &N.to_string(), args.len()))
}

pub(crate) fn to_f64(function: &str, value: &Value) -> Result<f64, EvaluationFailure> {
    match value {
        Value::Bool(b) => Ok(f64::from(u8::from(*b))),
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        other => Err(EvaluationFailure::type_mismatch(
            function,
            format!("must be real number, not {}", other.type_name()),
        )),
    }
}

/// Convert an integral float to `i64`, as `int()`/`floor()` do.
pub(crate) fn float_to_int(function: &str, value: f64) -> Result<i64, EvaluationFailure> {
    if value.is_nan() {
        return Err(EvaluationFailure::invalid_argument(
            function,
            "cannot convert float NaN to integer",
        ));
    }
    // 2^63 is the first float above i64::MAX.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if value.is_infinite() || value >= LIMIT || value < -LIMIT {
        return Err(EvaluationFailure::overflow(format!("{function}: float to integer")));
    }
    Ok(value as i64)
}
