#![allow(dead_code)]

use litfold::{EvaluationFailure, Expr, Folder, FoldOptions, Namespace, Resolution, Value};
use once_cell::sync::Lazy;

fn clamp(args: &[Value], _: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    match args {
        [Value::Int(v), Value::Int(lo), Value::Int(hi)] if lo <= hi => {
            Ok(Value::Int(*v.max(lo).min(hi)))
        }
        _ => Err(EvaluationFailure::invalid_argument(
            "clamp",
            "expected value, low and high ints",
        )),
    }
}

fn random(_: &[Value], _: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    Ok(Value::Int(4))
}

/// Bindings shared by the integration tests.
///
/// - `limit`, `name`, `tags`, `config`: plain values
/// - `offset`: an expression over the unbound name `base`
/// - `units`: a namespace with constants and a pure function
/// - `clamp` is pure, `random` is not
pub static FOLDER: Lazy<Folder> = Lazy::new(|| {
    Folder::new(FoldOptions { max_depth: 64 }, |env| {
        env.register("limit", Value::Int(10));
        env.register("name", Value::str("litfold"));
        env.register(
            "tags",
            Value::List(vec![Value::str("fast"), Value::str("safe")]),
        );
        env.register(
            "config",
            Value::Map(vec![
                (Value::str("retries"), Value::Int(3).into()),
                (Value::str("timeout"), Resolution::Residual(parse("base * 2"))),
            ]),
        );
        env.register("offset", Resolution::Residual(parse("base + 1")));
        env.register("cycle", Resolution::Residual(parse("cycle * 2")));

        let clamp = env.register_pure("clamp", clamp);
        env.register_impure("random", random);
        env.register_namespace(
            Namespace::new(
                "units",
                [
                    ("km", Value::Int(1000).into()),
                    ("clamp", Value::Function(clamp.clone()).into()),
                ],
            ),
            [clamp],
        );
    })
    .expect("fixture bindings are unique")
});

pub fn parse(source: &str) -> Expr {
    litfold::parse(source).unwrap_or_else(|e| panic!("failed to parse {source}: {e}"))
}

/// Declares a test folding `input` with the shared fixture.
///
/// - `folded:` compares the folded tree in source form
/// - `value:` compares the raw folded value
/// - `unchanged` asserts the source comes back as it was written
/// - `error:` matches the returned error
macro_rules! test_case {
    ($name:ident, input: $input:expr, folded: $folded:expr $(,)?) => {
        #[test]
        fn $name() {
            let folded = crate::cases::FOLDER
                .fold($input)
                .unwrap_or_else(|e| panic!("failed to fold {}: {e}", $input));
            pretty_assertions::assert_eq!(folded.to_string(), $folded);
        }
    };
    ($name:ident, input: $input:expr, value: $value:expr $(,)?) => {
        #[test]
        fn $name() {
            let folded = crate::cases::FOLDER
                .fold_raw($input)
                .unwrap_or_else(|e| panic!("failed to fold {}: {e}", $input));
            pretty_assertions::assert_eq!(folded, litfold::Resolution::Literal($value));
        }
    };
    ($name:ident, input: $input:expr, unchanged $(,)?) => {
        test_case!($name, input: $input, folded: $input);
    };
    ($name:ident, input: $input:expr, error: $pattern:pat $(,)?) => {
        #[test]
        fn $name() {
            let result = crate::cases::FOLDER.fold($input);
            assert!(matches!(result, $pattern), "unexpected result: {result:?}");
        }
    };
}
