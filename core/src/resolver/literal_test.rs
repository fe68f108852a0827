use pretty_assertions::assert_eq;

use super::*;
use crate::api::FoldOptions;
use crate::scope_stack::{CompleteScope, ScopeStack};
use crate::stdlib::Builtins;
use crate::syntax::{BinaryOp, Expr, parse};
use crate::test_utils::init_test_logging;
use crate::values::{FunctionRef, Resolution, Value};

fn now(_: &[Value], _: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    Ok(Value::Int(1_700_000_000))
}

fn ast(source: &str) -> Expr {
    parse(source).unwrap_or_else(|e| panic!("failed to parse {source}: {e}"))
}

fn globals() -> CompleteScope<Resolution> {
    CompleteScope::new([
        ("n", Value::Int(5).into()),
        ("word", Value::str("abc").into()),
        ("pair", Value::Tuple(vec![Value::Int(1), Value::Int(2)]).into()),
        ("alias", Resolution::Residual(Expr::name("n"))),
        ("total", Resolution::Residual(ast("n + 1"))),
        ("loop_", Resolution::Residual(ast("loop_ + 1"))),
        ("opaque", Value::Object { type_name: "Widget" }.into()),
        (
            "settings",
            Value::Map(vec![
                (Value::str("debug"), Value::Bool(true).into()),
                (Value::str("level"), Resolution::Residual(ast("y + 1"))),
            ])
            .into(),
        ),
        ("now", Value::Function(FunctionRef::native("now", now)).into()),
    ])
    .unwrap()
}

fn with_context<T>(options: FoldOptions, f: impl FnOnce(&FoldContext<'_>) -> T) -> T {
    let builtins = Builtins::new();
    let globals = globals();
    let mut scopes = ScopeStack::new();
    scopes.push(builtins.scope());
    scopes.push(&globals);
    let ctx = FoldContext::with_options(&scopes, builtins.registry(), options);
    f(&ctx)
}

// Small enough that the deepest allowed recursion fits a test thread's stack.
const TEST_OPTIONS: FoldOptions = FoldOptions { max_depth: 64 };

fn try_fold(source: &str) -> Result<Expr, FoldError> {
    let expr = ast(source);
    with_context(TEST_OPTIONS, |ctx| resolve_literal(&expr, ctx))
}

/// Folds `source` and prints the result in source form.
fn fold(source: &str) -> String {
    try_fold(source)
        .unwrap_or_else(|e| panic!("failed to fold {source}: {e}"))
        .to_string()
}

fn fold_raw(source: &str) -> Resolution {
    let expr = ast(source);
    with_context(TEST_OPTIONS, |ctx| resolve_literal_raw(&expr, ctx))
        .unwrap_or_else(|e| panic!("failed to fold {source}: {e}"))
}

fn assert_unchanged(source: &str) {
    assert_eq!(fold(source), source);
}

// ============================================================================
// Literals and the bridge
// ============================================================================

#[test]
fn test_literals_fold_to_themselves() {
    assert_eq!(fold_raw("42"), Resolution::Literal(Value::Int(42)));
    assert_eq!(fold_raw("'hi'"), Resolution::Literal(Value::str("hi")));
    assert_eq!(fold_raw("None"), Resolution::Literal(Value::None));
    assert_eq!(
        fold_raw("[1, (2.5, 'a'), {3}]"),
        Resolution::Literal(Value::List(vec![
            Value::Int(1),
            Value::Tuple(vec![Value::Float(2.5), Value::str("a")]),
            Value::Set(vec![Value::Int(3)]),
        ]))
    );
}

#[test]
fn test_wrapped_values_fold_back_to_the_same_value() {
    let values = [
        Value::None,
        Value::Bool(false),
        Value::Int(-7),
        Value::Float(0.1),
        Value::Float(f64::INFINITY),
        Value::str("it's"),
        Value::Tuple(vec![Value::Int(1)]),
        Value::List(vec![]),
        Value::Set(vec![Value::Int(1), Value::str("x")]),
        Value::Map(vec![(Value::Int(1), Value::Bool(true).into())]),
    ];
    for value in values {
        let node = value_to_node(&value).unwrap();
        let folded = with_context(TEST_OPTIONS, |ctx| resolve_literal_raw(&node, ctx)).unwrap();
        assert_eq!(folded, Resolution::Literal(value));
    }
}

#[test]
fn test_values_without_literal_form_keep_the_node() {
    assert_eq!(fold("len"), "len");
    assert_eq!(fold("opaque"), "opaque");
    assert_eq!(fold("math"), "math");
    assert!(matches!(
        fold_raw("len"),
        Resolution::Literal(Value::Function(_))
    ));
}

#[test]
fn test_index_wrapper_folds_its_expression() {
    let node = Expr::Index(Box::new(ast("1 + 1")));
    let folded = with_context(TEST_OPTIONS, |ctx| resolve_literal_raw(&node, ctx)).unwrap();
    assert_eq!(folded, Resolution::Literal(Value::Int(2)));
}

#[test]
fn test_bare_slice_is_unsupported() {
    let node = Expr::Slice {
        lower: Some(Box::new(Expr::int(1))),
        upper: None,
        step: None,
    };
    let err = with_context(TEST_OPTIONS, |ctx| resolve_literal(&node, ctx)).unwrap_err();
    assert_eq!(err, FoldError::UnsupportedConstruct { construct: "Slice" });
}

#[test]
fn test_unhandled_kinds_are_returned_unchanged() {
    assert_unchanged("1 if x else 2");
    assert_unchanged("lambda a: a + 0");
    let starred = Expr::Starred(Box::new(ast("[1, 2]")));
    let folded = with_context(TEST_OPTIONS, |ctx| resolve_literal(&starred, ctx)).unwrap();
    assert_eq!(folded, starred);
}

// ============================================================================
// Names
// ============================================================================

#[test]
fn test_bound_values_replace_names() {
    assert_eq!(fold("n"), "5");
    assert_eq!(fold("word"), "'abc'");
    assert_eq!(fold("pair"), "(1, 2)");
    assert_eq!(fold("unknown"), "unknown");
}

#[test]
fn test_bound_expressions_are_folded() {
    assert_eq!(fold("total"), "6");
    assert_eq!(fold("total * 2"), "12");
}

#[test]
fn test_name_to_name_bindings_are_not_followed() {
    assert_eq!(fold("alias"), "n");
}

#[test]
fn test_namespace_attributes() {
    assert_eq!(fold("math.pi"), "3.141592653589793");
    assert_eq!(fold("math.tau / 2 == math.pi"), "True");
    assert_eq!(fold("math.missing"), "math.missing");
}

// ============================================================================
// Algebraic simplification
// ============================================================================

#[test]
fn test_additive_identities() {
    assert_eq!(fold("x + 0"), "x");
    assert_eq!(fold("0 + x"), "x");
    assert_eq!(fold("x - 0"), "x");
    assert_eq!(fold("0 - x"), "-x");
    assert_eq!(fold("x + False"), "x");
}

#[test]
fn test_multiplicative_identities() {
    assert_eq!(fold("x * 0"), "0");
    assert_eq!(fold("0 * x"), "0");
    assert_eq!(fold("x * 0.0"), "0");
    assert_eq!(fold("x * 1"), "x");
    assert_eq!(fold("1.0 * x"), "x");
    assert_eq!(fold("x * -1"), "-x");
    assert_eq!(fold("x / 1"), "x");
    assert_eq!(fold("x ** 1"), "x");
}

#[test]
fn test_zero_on_the_left() {
    assert_eq!(fold("0 / x"), "0");
    assert_eq!(fold("0 // x"), "0");
    assert_eq!(fold("0 % x"), "0");
    assert_eq!(fold("0 ** x"), "0");
}

#[test]
fn test_structural_equality_is_not_simplified() {
    assert_eq!(fold("x - x"), "x - x");
    assert_eq!(fold("x * 2"), "x * 2");
    assert_eq!(fold("1 / x"), "1 / x");
    assert_eq!(fold("x // 1"), "x // 1");
}

#[test]
fn test_partial_folding_rebuilds_operands() {
    assert_eq!(fold("x * 1 + 2 * 3"), "x + 6");
    assert_eq!(fold("(1 + 2) * x"), "3 * x");
    assert_eq!(fold("x + y * (2 - 2)"), "x");
    assert_eq!(fold("y - (1 + 1)"), "y - 2");
}

#[test]
fn test_arithmetic_on_literals() {
    assert_eq!(fold("2 ** 10 - 24"), "1000");
    assert_eq!(fold("7 // -2"), "-4");
    assert_eq!(fold("7 / 2"), "3.5");
    assert_eq!(fold("'ab' * 2"), "'abab'");
    assert_eq!(fold("[1] + [2]"), "[1, 2]");
    assert_eq!(fold("{1, 2} & {2, 3}"), "{2}");
}

#[test]
fn test_failing_operations_are_left_unfolded() {
    init_test_logging();
    assert_unchanged("1 / 0");
    assert_unchanged("'a' + 1");
    assert_unchanged("9223372036854775807 + 1");
    assert_unchanged("-'a'");
    assert_unchanged("1 << -1");
}

#[test]
fn test_unary_operators() {
    assert_eq!(fold("-(3)"), "-3");
    assert_eq!(fold("~5"), "-6");
    assert_eq!(fold("not 0"), "True");
    assert_eq!(fold("not x"), "not x");
    assert_eq!(fold("-(x + 0)"), "-(x + 0)");
}

// ============================================================================
// Boolean operators
// ============================================================================

#[test]
fn test_short_circuit() {
    assert_eq!(fold("True or x"), "True");
    assert_eq!(fold("False and x"), "False");
    assert_eq!(fold("x or 1"), "True");
    assert_eq!(fold("x and 0"), "False");
}

#[test]
fn test_neutral_operands_are_dropped() {
    assert_eq!(fold("x or False"), "x");
    assert_eq!(fold("x and True"), "x");
    assert_eq!(fold("False or x or 0"), "x");
    assert_eq!(fold("x and 1 and y"), "x and y");
}

#[test]
fn test_all_operands_eliminated() {
    assert_eq!(fold("False or 0"), "False");
    assert_eq!(fold("True and 1"), "True");
}

#[test]
fn test_duplicate_names_are_dropped() {
    assert_eq!(fold("x or x"), "x");
    assert_eq!(fold("x or y or x"), "x or y");
    assert_eq!(fold("f(x) or f(x)"), "f(x) or f(x)");
}

#[test]
fn test_other_literals_are_kept_as_operands() {
    assert_eq!(fold("'' or x"), "'' or x");
    assert_eq!(fold("x and None"), "x and None");
    assert_eq!(fold("x or (1 + 1 == 2)"), "True");
}

// ============================================================================
// Containers
// ============================================================================

#[test]
fn test_sequences_are_all_or_nothing() {
    assert_unchanged("[1, 2, unknown]");
    assert_unchanged("(x, 1 + 1)");
    assert_eq!(fold("[1 + 1, (n,)]"), "[2, (5,)]");
}

#[test]
fn test_sets() {
    assert_eq!(fold("{1, 1.0, True, 2}"), "{1, 2}");
    assert_unchanged("{1, [2]}");
    assert_unchanged("{1, x}");
}

#[test]
fn test_mapping_keys_must_fold() {
    assert_unchanged("{unknown: 1}");
    assert_unchanged("{[1]: 2}");
    assert_eq!(fold("{1: 'a', 1: 'b'}"), "{1: 'b'}");
}

#[test]
fn test_mapping_values_may_stay_residual() {
    assert_eq!(
        fold_raw("{1: unknown}"),
        Resolution::Literal(Value::Map(vec![(
            Value::Int(1),
            Resolution::Residual(Expr::name("unknown"))
        )]))
    );
    // Folded values do not replace the source; literal-shaped nodes do.
    assert_eq!(fold("{'a': n + 1}"), "{'a': n + 1}");
    assert_eq!(fold("{'a': n}"), "{'a': n}");
    assert_eq!(fold("{'a': 2 + 3, 'b': True}"), "{'a': 2 + 3, 'b': True}");
    assert_eq!(fold("{'a': x + 0}"), "{'a': x + 0}");
    assert_eq!(fold("{'a': [x, 1 + 1]}"), "{'a': [x, 1 + 1]}");
    assert_eq!(
        fold_raw("{'t': total}"),
        Resolution::Literal(Value::Map(vec![(
            Value::str("t"),
            Resolution::Residual(Expr::name("total"))
        )]))
    );
    assert_eq!(fold("{'a': len}"), "{'a': len}");
}

// ============================================================================
// Subscripts
// ============================================================================

#[test]
fn test_subscript_of_displays() {
    assert_eq!(fold("[1, 2, 3][-1]"), "3");
    assert_eq!(fold("[1, x][0]"), "1");
    assert_eq!(fold("(10, 20)[True]"), "20");
    assert_eq!(fold("{'a': 1, 'b': x}['a']"), "1");
    assert_eq!(fold("'abc'[1]"), "'b'");
}

#[test]
fn test_subscript_misses_are_left_unfolded() {
    init_test_logging();
    assert_unchanged("[1, 2, 3][5]");
    assert_unchanged("(1, 2)[x]");
    assert_unchanged("(1, 2)['a']");
    assert_unchanged("unknown[0]");
    assert_unchanged("settings['missing']");
}

#[test]
fn test_subscript_of_bindings() {
    assert_eq!(fold("settings['debug']"), "True");
    assert_eq!(fold("settings['level']"), "y + 1");
    assert_eq!(fold("pair[1] * 3"), "6");
    assert_eq!(fold("word[-1]"), "'c'");
}

#[test]
fn test_slices_inside_subscripts_are_absorbed() {
    assert_unchanged("[1, 2][1:]");
    assert_unchanged("word[::2]");
}

#[test]
fn test_nested_and_computed_indexables() {
    assert_eq!(fold("[[1, 2], [3]][0][1]"), "2");
    assert_eq!(fold("([1] + [2, 3])[2]"), "3");
    assert_eq!(fold("dict(a=1)['a']"), "1");
    assert_eq!(fold("dict(a=x)['a']"), "x");
    assert_eq!(fold("sorted([3, 1, 2])[0]"), "1");
}

#[test]
fn test_container_items_are_returned_raw() {
    assert_eq!(fold("[[1, x]][0]"), "[1, x]");
    assert_eq!(fold("[(1, 2)][0]"), "(1, 2)");
}

// ============================================================================
// Comparisons
// ============================================================================

#[test]
fn test_comparison_chains() {
    assert_eq!(fold("1 < 2 < 3"), "True");
    assert_eq!(fold("1 < 2 > 3"), "False");
    assert_eq!(fold("3 > 2 == 2.0"), "True");
    assert_eq!(fold("2 in [1, 2]"), "True");
    assert_eq!(fold("'b' not in 'abc'"), "False");
    assert_eq!(fold("None is None"), "True");
    assert_eq!(fold("(1, 2) < (1, 3)"), "True");
}

#[test]
fn test_comparisons_with_residuals_or_failures() {
    assert_unchanged("1 < x");
    assert_unchanged("x == x");
    assert_unchanged("1 < 'a'");
}

// ============================================================================
// Calls
// ============================================================================

#[test]
fn test_pure_calls_fold() {
    assert_eq!(fold("abs(-3)"), "3");
    assert_eq!(fold("len(word) + n"), "8");
    assert_eq!(fold("int('ff', base=16)"), "255");
    assert_eq!(fold("sorted([3, 1], reverse=True)"), "[3, 1]");
    assert_eq!(fold("math.sqrt(16.0)"), "4.0");
    assert_eq!(fold("str(1.5)"), "'1.5'");
}

#[test]
fn test_impure_calls_are_not_made() {
    init_test_logging();
    assert_unchanged("now()");
    assert_unchanged("print(1)");
}

#[test]
fn test_calls_with_residual_arguments() {
    assert_unchanged("len(x)");
    assert_unchanged("max(1, x)");
    assert_unchanged("f(1)");
    assert_unchanged("n(1)");
}

#[test]
fn test_failing_calls_are_left_unfolded() {
    assert_unchanged("len(1)");
    assert_unchanged("chr(-1)");
    assert_unchanged("int('x')");
}

#[test]
fn test_unpacked_arguments() {
    assert_eq!(fold("max(*[1, 5, 2])"), "5");
    assert_eq!(fold("max(0, *(7, 3))"), "7");
    assert_eq!(fold("dict(**{'a': 1}, b=2)"), "{'a': 1, 'b': 2}");
    assert_unchanged("max(*x)");
    assert_unchanged("dict(**{1: 2})");
}

#[test]
fn test_duplicate_keywords_are_not_folded() {
    assert_unchanged("dict(a=1, **{'a': 2})");
}

#[test]
fn test_nan_results_are_left_unfolded() {
    assert_unchanged("float('nan')");
    assert_eq!(fold("float('inf')"), "1e309");
}

// ============================================================================
// Depth limit
// ============================================================================

#[test]
fn test_deep_trees_exceed_the_limit() {
    let mut expr = Expr::int(1);
    for _ in 0..80 {
        expr = Expr::binary(expr, BinaryOp::Add, Expr::int(1));
    }
    let err = with_context(TEST_OPTIONS, |ctx| resolve_literal(&expr, ctx)).unwrap_err();
    assert_eq!(
        err,
        FoldError::DepthExceeded {
            depth: 64,
            max_depth: 64
        }
    );

    let folded = with_context(FoldOptions::default(), |ctx| resolve_literal(&expr, ctx)).unwrap();
    assert_eq!(folded, Expr::int(81));
}

#[test]
fn test_self_referential_binding() {
    assert!(matches!(
        try_fold("loop_"),
        Err(FoldError::DepthExceeded { .. })
    ));
    assert!(matches!(
        try_fold("[loop_][0]"),
        Err(FoldError::DepthExceeded { .. })
    ));
}

#[test]
fn test_input_is_not_modified() {
    let expr = ast("x * 1 + [1, 2][0]");
    let before = expr.clone();
    let folded = with_context(TEST_OPTIONS, |ctx| resolve_literal(&expr, ctx)).unwrap();
    assert_eq!(expr, before);
    assert_eq!(folded.to_string(), "x + 1");
}
