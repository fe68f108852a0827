//! Conversion from folded values back to syntax nodes.

use super::FoldError;
use crate::syntax::{Constant, Expr, Number};
use crate::values::{Resolution, Value};

/// Turn a folding outcome into a node.
///
/// Residual nodes come back unchanged, so calling this on an already
/// converted result is harmless.
pub fn to_node(resolution: &Resolution) -> Result<Expr, FoldError> {
    match resolution {
        Resolution::Literal(value) => value_to_node(value),
        Resolution::Residual(expr) => Ok(expr.clone()),
    }
}

/// Build the literal node spelling `value`.
pub fn value_to_node(value: &Value) -> Result<Expr, FoldError> {
    Ok(match value {
        Value::None => Expr::Constant(Constant::None),
        Value::Bool(b) => Expr::Constant(Constant::Bool(*b)),
        Value::Int(_) | Value::Float(_) => Expr::Num(narrow_number(value)?),
        Value::Str(s) => Expr::Str(s.clone()),
        Value::List(items) => Expr::List(values_to_nodes(items)?),
        Value::Tuple(items) => Expr::Tuple(values_to_nodes(items)?),
        // `{}` is a dict; an empty set has no literal spelling.
        Value::Set(items) if items.is_empty() => return Err(not_wrappable(value)),
        Value::Set(items) => Expr::Set(values_to_nodes(items)?),
        Value::Map(entries) => Expr::Dict(
            entries
                .iter()
                .map(|(key, value)| Ok((value_to_node(key)?, to_node(value)?)))
                .collect::<Result<_, FoldError>>()?,
        ),
        Value::Function(_) | Value::Namespace(_) | Value::Object { .. } => {
            return Err(not_wrappable(value));
        }
    })
}

fn values_to_nodes(items: &[Value]) -> Result<Vec<Expr>, FoldError> {
    items.iter().map(value_to_node).collect()
}

fn not_wrappable(value: &Value) -> FoldError {
    FoldError::NotWrappable {
        value: value.to_string(),
        type_name: value.type_name(),
    }
}

/// Pick the numeric node representation for a number value.
///
/// The chosen representation must hold exactly the same number; anything
/// else is an internal error.
pub fn narrow_number(value: &Value) -> Result<Number, FoldError> {
    let (number, round_trip) = match value {
        Value::Int(i) => (Number::Int(*i), Value::Int(*i)),
        Value::Float(f) => (Number::Float(*f), Value::Float(*f)),
        other => {
            return Err(FoldError::InternalConsistency {
                detail: format!("{} is not a number", other.type_name()),
            });
        }
    };
    // NaN is the one value that does not survive this check.
    if &round_trip != value {
        return Err(FoldError::InternalConsistency {
            detail: format!("cannot represent {} exactly as a number node", value),
        });
    }
    Ok(number)
}

/// Whether `to_node` would succeed. Never fails.
pub fn is_wrappable(resolution: &Resolution) -> bool {
    match resolution {
        Resolution::Literal(value) => is_value_wrappable(value),
        Resolution::Residual(_) => true,
    }
}

pub fn is_value_wrappable(value: &Value) -> bool {
    value_to_node(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::{FunctionRef, Namespace};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_primitives() {
        assert_eq!(value_to_node(&Value::Int(3)), Ok(Expr::int(3)));
        assert_eq!(value_to_node(&Value::Float(0.5)), Ok(Expr::float(0.5)));
        assert_eq!(value_to_node(&Value::Bool(true)), Ok(Expr::bool(true)));
        assert_eq!(value_to_node(&Value::None), Ok(Expr::none()));
        assert_eq!(value_to_node(&Value::str("s")), Ok(Expr::str("s")));
    }

    #[test]
    fn test_containers() {
        let map = Value::Map(vec![
            (Value::Int(1), Resolution::Literal(Value::str("a"))),
            (Value::Int(2), Resolution::Residual(Expr::name("x"))),
        ]);
        assert_eq!(
            value_to_node(&map),
            Ok(Expr::Dict(vec![
                (Expr::int(1), Expr::str("a")),
                (Expr::int(2), Expr::name("x")),
            ]))
        );
        assert_eq!(
            value_to_node(&Value::Tuple(vec![Value::List(vec![]), Value::Int(1)])),
            Ok(Expr::Tuple(vec![Expr::List(vec![]), Expr::int(1)]))
        );
        assert_eq!(
            value_to_node(&Value::Set(vec![Value::Int(1)])),
            Ok(Expr::Set(vec![Expr::int(1)]))
        );
    }

    #[test]
    fn test_residual_is_returned_unchanged() {
        let node = Expr::binary(Expr::name("a"), crate::syntax::BinaryOp::Add, Expr::int(1));
        assert_eq!(to_node(&Resolution::Residual(node.clone())), Ok(node));
    }

    #[test]
    fn test_not_wrappable() {
        fn noop(_: &[Value], _: &[(String, Value)]) -> Result<Value, super::super::EvaluationFailure> {
            Ok(Value::None)
        }
        let function = Value::Function(FunctionRef::native("noop", noop));
        let namespace = Value::Namespace(Namespace::new("m", Vec::<(String, Resolution)>::new()));
        for value in [
            function,
            namespace,
            Value::Object { type_name: "Session" },
            Value::Set(vec![]),
            Value::List(vec![Value::Object { type_name: "Session" }]),
        ] {
            assert!(!is_value_wrappable(&value), "{value} should not be wrappable");
            assert!(matches!(
                value_to_node(&value),
                Err(FoldError::NotWrappable { .. })
            ));
        }
    }

    #[test]
    fn test_nan_fails_narrowing() {
        assert!(matches!(
            narrow_number(&Value::Float(f64::NAN)),
            Err(FoldError::InternalConsistency { .. })
        ));
        assert!(!is_value_wrappable(&Value::Float(f64::NAN)));
        assert_eq!(narrow_number(&Value::Float(f64::INFINITY)), Ok(Number::Float(f64::INFINITY)));
    }
}
