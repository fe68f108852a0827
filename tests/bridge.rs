mod cases;

use litfold::{
    Expr, FoldError, FunctionRef, Namespace, Resolution, Value, is_wrappable, to_node,
    value_to_node,
};
use pretty_assertions::assert_eq;

fn identity(args: &[Value], _: &[(String, Value)]) -> Result<Value, litfold::EvaluationFailure> {
    Ok(args.first().cloned().unwrap_or(Value::None))
}

#[test]
fn test_wrapped_literals_fold_back() {
    let values = [
        Value::Int(i64::MIN),
        Value::Float(-0.5),
        Value::str("line\nbreak"),
        Value::Tuple(vec![Value::None, Value::Bool(true)]),
        Value::Map(vec![(
            Value::Tuple(vec![Value::Int(1), Value::Int(2)]),
            Value::str("a").into(),
        )]),
    ];
    for value in values {
        let node = value_to_node(&value).unwrap();
        let folded = cases::FOLDER.fold_expr_raw(&node).unwrap();
        assert_eq!(folded, Resolution::Literal(value));
    }
}

#[test]
fn test_printed_literals_parse_back() {
    let value = Value::List(vec![
        Value::Float(1e20),
        Value::Float(f64::NEG_INFINITY),
        Value::str("it's \"quoted\""),
        Value::Int(-3),
    ]);
    let source = value_to_node(&value).unwrap().to_string();
    let folded = cases::FOLDER.fold_raw(&source).unwrap();
    assert_eq!(folded, Resolution::Literal(value));
}

#[test]
fn test_host_values_are_not_wrappable() {
    let function = Value::Function(FunctionRef::native("identity", identity));
    let namespace = Value::Namespace(Namespace::new("empty", Vec::<(String, Resolution)>::new()));
    for value in [
        function,
        namespace,
        Value::Object { type_name: "Socket" },
        Value::Set(vec![]),
        Value::List(vec![Value::Object { type_name: "Socket" }]),
    ] {
        let resolution = Resolution::Literal(value);
        assert!(!is_wrappable(&resolution), "{resolution} should not be wrappable");
        assert!(matches!(
            to_node(&resolution),
            Err(FoldError::NotWrappable { .. })
        ));
    }
}

#[test]
fn test_residuals_are_returned_as_is() {
    let node = cases::parse("f(x) + 1");
    let resolution = Resolution::Residual(node.clone());
    assert!(is_wrappable(&resolution));
    assert_eq!(to_node(&resolution).unwrap(), node);
}

#[test]
fn test_nan_fails_narrowing() {
    let err = value_to_node(&Value::Float(f64::NAN)).unwrap_err();
    assert!(matches!(err, FoldError::InternalConsistency { .. }));
    assert!(!is_wrappable(&Resolution::Literal(Value::Float(f64::NAN))));
}

#[test]
fn test_folded_trees_are_plain_nodes() {
    let folded = cases::FOLDER.fold("(1, limit)").unwrap();
    assert_eq!(folded, Expr::Tuple(vec![Expr::int(1), Expr::int(10)]));
}
