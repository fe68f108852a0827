//! Math Package
//!
//! Constants: pi, e, tau, inf
//! Functions: sqrt, floor, ceil, fabs, exp, log

use super::{arity, exact_args, float_to_int, no_keywords, to_f64};
use crate::resolver::EvaluationFailure;
use crate::values::{FunctionRef, Namespace, Resolution, Value};

fn domain_error(function: &str) -> EvaluationFailure {
    EvaluationFailure::invalid_argument(function, "math domain error")
}

fn math_sqrt(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    let [x] = exact_args::<1>("sqrt", args, kwargs)?;
    let x = to_f64("sqrt", x)?;
    if x < 0.0 {
        return Err(domain_error("sqrt"));
    }
    Ok(Value::Float(x.sqrt()))
}

/// Floor function - returns largest integer <= x
fn math_floor(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    let [x] = exact_args::<1>("floor", args, kwargs)?;
    match x {
        Value::Int(_) | Value::Bool(_) => Ok(Value::Int(x.as_int().unwrap_or_default())),
        other => Ok(Value::Int(float_to_int("floor", to_f64("floor", other)?.floor())?)),
    }
}

/// Ceiling function - returns smallest integer >= x
fn math_ceil(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    let [x] = exact_args::<1>("ceil", args, kwargs)?;
    match x {
        Value::Int(_) | Value::Bool(_) => Ok(Value::Int(x.as_int().unwrap_or_default())),
        other => Ok(Value::Int(float_to_int("ceil", to_f64("ceil", other)?.ceil())?)),
    }
}

fn math_fabs(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    let [x] = exact_args::<1>("fabs", args, kwargs)?;
    Ok(Value::Float(to_f64("fabs", x)?.abs()))
}

fn math_exp(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    let [x] = exact_args::<1>("exp", args, kwargs)?;
    let x = to_f64("exp", x)?;
    let result = x.exp();
    if result.is_infinite() && x.is_finite() {
        return Err(EvaluationFailure::overflow("exp"));
    }
    Ok(Value::Float(result))
}

/// Natural logarithm, or logarithm to `base` when given.
fn math_log(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    no_keywords("log", kwargs)?;
    let ln = |value: &Value| -> Result<f64, EvaluationFailure> {
        let x = to_f64("log", value)?;
        if x <= 0.0 {
            return Err(domain_error("log"));
        }
        Ok(x.ln())
    };
    match args {
        [x] => Ok(Value::Float(ln(x)?)),
        [x, base] => {
            let denominator = ln(base)?;
            if denominator == 0.0 {
                return Err(EvaluationFailure::ZeroDivision);
            }
            Ok(Value::Float(ln(x)? / denominator))
        }
        _ => Err(arity("log", "1 or 2", args.len())),
    }
}

/// Build the `math` namespace.
///
/// Returns the namespace and its functions, so callers can register them as
/// pure.
pub fn build_math_package() -> (Namespace, Vec<FunctionRef>) {
    let functions = vec![
        FunctionRef::native("sqrt", math_sqrt),
        FunctionRef::native("floor", math_floor),
        FunctionRef::native("ceil", math_ceil),
        FunctionRef::native("fabs", math_fabs),
        FunctionRef::native("exp", math_exp),
        FunctionRef::native("log", math_log),
    ];

    let constants = [
        ("pi", std::f64::consts::PI),
        ("e", std::f64::consts::E),
        ("tau", std::f64::consts::TAU),
        ("inf", f64::INFINITY),
    ];

    let members = constants
        .into_iter()
        .map(|(name, value)| (name.to_string(), Resolution::Literal(Value::Float(value))))
        .chain(functions.iter().map(|f| {
            (
                f.name().to_string(),
                Resolution::Literal(Value::Function(f.clone())),
            )
        }));

    (Namespace::new("math", members), functions)
}
