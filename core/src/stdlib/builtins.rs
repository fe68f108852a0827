//! Python-style builtin functions.

use core::cmp::Ordering;

use super::{arity, exact_args, float_to_int, no_keywords, to_f64};
use crate::resolver::EvaluationFailure;
use crate::resolver::operators::{apply_binary, map_insert, py_cmp, truthy};
use crate::syntax::BinaryOp;
use crate::values::{NativeFn, Resolution, Value};

/// Pure builtins, bound by name in the builtin scope.
pub const FUNCTIONS: &[(&str, NativeFn)] = &[
    ("abs", builtin_abs),
    ("bool", builtin_bool),
    ("chr", builtin_chr),
    ("dict", builtin_dict),
    ("divmod", builtin_divmod),
    ("float", builtin_float),
    ("int", builtin_int),
    ("len", builtin_len),
    ("list", builtin_list),
    ("max", builtin_max),
    ("min", builtin_min),
    ("ord", builtin_ord),
    ("pow", builtin_pow),
    ("round", builtin_round),
    ("sorted", builtin_sorted),
    ("str", builtin_str),
    ("sum", builtin_sum),
    ("tuple", builtin_tuple),
];

fn keyword<'v>(kwargs: &'v [(String, Value)], name: &str) -> Option<&'v Value> {
    kwargs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
}

/// Reject keywords other than `allowed`.
fn only_keywords(
    function: &str,
    kwargs: &[(String, Value)],
    allowed: &[&str],
) -> Result<(), EvaluationFailure> {
    match kwargs.iter().find(|(n, _)| !allowed.contains(&n.as_str())) {
        None => Ok(()),
        Some((name, _)) => Err(EvaluationFailure::invalid_argument(
            function,
            format!("unexpected keyword argument '{name}'"),
        )),
    }
}

/// Elements produced by iterating `value`.
fn iterate(function: &str, value: &Value) -> Result<Vec<Value>, EvaluationFailure> {
    match value {
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => Ok(items.clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        Value::Map(entries) => Ok(entries.iter().map(|(k, _)| k.clone()).collect()),
        other => Err(EvaluationFailure::type_mismatch(
            function,
            format!("'{}' object is not iterable", other.type_name()),
        )),
    }
}

/// Optional single iterable argument, as taken by `list()` and `tuple()`.
fn optional_iterable(
    function: &str,
    args: &[Value],
    kwargs: &[(String, Value)],
) -> Result<Vec<Value>, EvaluationFailure> {
    no_keywords(function, kwargs)?;
    match args {
        [] => Ok(Vec::new()),
        [iterable] => iterate(function, iterable),
        _ => Err(arity(function, "0 or 1", args.len())),
    }
}

pub(crate) fn builtin_print(
    args: &[Value],
    _kwargs: &[(String, Value)],
) -> Result<Value, EvaluationFailure> {
    let line: Vec<String> = args.iter().map(display_str).collect();
    println!("{}", line.join(" "));
    Ok(Value::None)
}

fn builtin_abs(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    let [x] = exact_args::<1>("abs", args, kwargs)?;
    match x {
        Value::Float(f) => Ok(Value::Float(f.abs())),
        Value::Int(_) | Value::Bool(_) => x
            .as_int()
            .and_then(i64::checked_abs)
            .map(Value::Int)
            .ok_or_else(|| EvaluationFailure::overflow("abs")),
        other => Err(EvaluationFailure::type_mismatch(
            "abs",
            format!("bad operand type: '{}'", other.type_name()),
        )),
    }
}

fn builtin_bool(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    no_keywords("bool", kwargs)?;
    match args {
        [] => Ok(Value::Bool(false)),
        [x] => Ok(Value::Bool(truthy(x))),
        _ => Err(arity("bool", "0 or 1", args.len())),
    }
}

fn builtin_chr(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    let [x] = exact_args::<1>("chr", args, kwargs)?;
    let Some(code) = x.as_int() else {
        return Err(EvaluationFailure::type_mismatch(
            "chr",
            format!("an integer is required, not {}", x.type_name()),
        ));
    };
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .map(|c| Value::Str(c.to_string()))
        .ok_or_else(|| EvaluationFailure::invalid_argument("chr", "arg not in range(0x110000)"))
}

fn builtin_dict(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    let mut entries = Vec::new();
    match args {
        [] => {}
        [Value::Map(source)] => entries = source.clone(),
        [iterable] => {
            for pair in iterate("dict", iterable)? {
                let kv = match pair {
                    Value::List(kv) | Value::Tuple(kv) => kv,
                    other => {
                        return Err(EvaluationFailure::type_mismatch(
                            "dict",
                            format!("cannot convert '{}' element to a pair", other.type_name()),
                        ));
                    }
                };
                let [key, value] = <[Value; 2]>::try_from(kv).map_err(|kv| {
                    EvaluationFailure::invalid_argument(
                        "dict",
                        format!("sequence element has length {}; 2 is required", kv.len()),
                    )
                })?;
                map_insert(&mut entries, key, Resolution::Literal(value))?;
            }
        }
        _ => return Err(arity("dict", "at most 1", args.len())),
    }
    for (name, value) in kwargs {
        map_insert(
            &mut entries,
            Value::Str(name.clone()),
            Resolution::Literal(value.clone()),
        )?;
    }
    Ok(Value::Map(entries))
}

fn builtin_divmod(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    let [a, b] = exact_args::<2>("divmod", args, kwargs)?;
    Ok(Value::Tuple(vec![
        apply_binary(BinaryOp::FloorDiv, a, b)?,
        apply_binary(BinaryOp::Mod, a, b)?,
    ]))
}

fn builtin_float(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    no_keywords("float", kwargs)?;
    match args {
        [] => Ok(Value::Float(0.0)),
        [Value::Str(s)] => parse_float(s)
            .map(Value::Float)
            .ok_or_else(|| {
                EvaluationFailure::invalid_argument(
                    "float",
                    format!("could not convert string to float: {}", Value::str(s.as_str())),
                )
            }),
        [x] => to_f64("float", x).map(Value::Float),
        _ => Err(arity("float", "0 or 1", args.len())),
    }
}

fn parse_float(text: &str) -> Option<f64> {
    let text = text.trim();
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text.strip_prefix('+').unwrap_or(text)),
    };
    match unsigned.to_ascii_lowercase().as_str() {
        "inf" | "infinity" => Some(sign * f64::INFINITY),
        "nan" => Some(f64::NAN),
        lowered if lowered.chars().any(|c| c.is_ascii_alphabetic() && c != 'e') => None,
        _ => unsigned.replace('_', "").parse::<f64>().ok().map(|f| sign * f),
    }
}

fn builtin_int(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    only_keywords("int", kwargs, &["base"])?;
    let base = match (args.get(1), keyword(kwargs, "base")) {
        (Some(_), Some(_)) => {
            return Err(EvaluationFailure::invalid_argument(
                "int",
                "argument for int() given by name ('base') and position (2)",
            ));
        }
        (Some(base), None) | (None, Some(base)) => Some(base),
        (None, None) => None,
    };
    match (args, base) {
        ([], None) => Ok(Value::Int(0)),
        ([Value::Str(s)] | [Value::Str(s), _], base) => {
            let radix = match base {
                None => 10,
                Some(b) => match b.as_int() {
                    Some(r @ 2..=36) => r as u32,
                    _ => {
                        return Err(EvaluationFailure::invalid_argument(
                            "int",
                            "base must be >= 2 and <= 36",
                        ));
                    }
                },
            };
            parse_int(s, radix).map(Value::Int).ok_or_else(|| {
                EvaluationFailure::invalid_argument(
                    "int",
                    format!(
                        "invalid literal for int() with base {radix}: {}",
                        Value::str(s.as_str())
                    ),
                )
            })
        }
        ([_, ..], Some(_)) => Err(EvaluationFailure::type_mismatch(
            "int",
            "can't convert non-string with explicit base",
        )),
        ([Value::Float(f)], None) => float_to_int("int", f.trunc()).map(Value::Int),
        ([x], None) => x.as_int().map(Value::Int).ok_or_else(|| {
            EvaluationFailure::type_mismatch(
                "int",
                format!("argument must be a string or a number, not '{}'", x.type_name()),
            )
        }),
        _ => Err(arity("int", "0 to 2", args.len())),
    }
}

fn parse_int(text: &str, radix: u32) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let digits = digits.replace('_', "");
    if digits.is_empty() || digits.starts_with('+') || digits.starts_with('-') {
        return None;
    }
    let magnitude = i128::from_str_radix(&digits, radix).ok()?;
    i64::try_from(if negative { -magnitude } else { magnitude }).ok()
}

fn builtin_len(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    let [x] = exact_args::<1>("len", args, kwargs)?;
    let len = match x {
        Value::Str(s) => s.chars().count(),
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => items.len(),
        Value::Map(entries) => entries.len(),
        other => {
            return Err(EvaluationFailure::type_mismatch(
                "len",
                format!("object of type '{}' has no len()", other.type_name()),
            ));
        }
    };
    Ok(Value::Int(len as i64))
}

fn builtin_list(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    optional_iterable("list", args, kwargs).map(Value::List)
}

fn builtin_tuple(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    optional_iterable("tuple", args, kwargs).map(Value::Tuple)
}

/// Shared body of `max` and `min`; `wanted` is the ordering that replaces
/// the current best.
fn extreme(
    function: &str,
    wanted: Ordering,
    args: &[Value],
    kwargs: &[(String, Value)],
) -> Result<Value, EvaluationFailure> {
    only_keywords(function, kwargs, &["default"])?;
    let default = keyword(kwargs, "default");
    let candidates = match args {
        [] => return Err(arity(function, "at least 1", 0)),
        [iterable] => iterate(function, iterable)?,
        _ if default.is_some() => {
            return Err(EvaluationFailure::invalid_argument(
                function,
                "cannot specify a default with multiple positional arguments",
            ));
        }
        _ => args.to_vec(),
    };
    let mut best: Option<Value> = None;
    for candidate in candidates {
        best = match best {
            None => Some(candidate),
            Some(current) => {
                if py_cmp(&candidate, &current)? == Some(wanted) {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        };
    }
    best.or_else(|| default.cloned()).ok_or_else(|| {
        EvaluationFailure::invalid_argument(function, "iterable argument is empty")
    })
}

fn builtin_max(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    extreme("max", Ordering::Greater, args, kwargs)
}

fn builtin_min(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    extreme("min", Ordering::Less, args, kwargs)
}

fn builtin_ord(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    let [x] = exact_args::<1>("ord", args, kwargs)?;
    let mut chars = x.as_str().map(str::chars).ok_or_else(|| {
        EvaluationFailure::type_mismatch(
            "ord",
            format!("expected string of length 1, but {} found", x.type_name()),
        )
    })?;
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::Int(i64::from(u32::from(c)))),
        _ => Err(EvaluationFailure::invalid_argument(
            "ord",
            "expected a character",
        )),
    }
}

fn builtin_pow(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    only_keywords("pow", kwargs, &[])?;
    match args {
        [base, exp] => apply_binary(BinaryOp::Pow, base, exp),
        [base, exp, modulus] => {
            let (Some(b), Some(e), Some(m)) = (base.as_int(), exp.as_int(), modulus.as_int())
            else {
                return Err(EvaluationFailure::type_mismatch(
                    "pow",
                    "3-argument pow() requires all arguments be integers",
                ));
            };
            if m == 0 {
                return Err(EvaluationFailure::invalid_argument(
                    "pow",
                    "3rd argument cannot be 0",
                ));
            }
            if e < 0 {
                return Err(EvaluationFailure::invalid_argument(
                    "pow",
                    "negative exponent with modulus is not supported",
                ));
            }
            Ok(Value::Int(mod_pow(b, e, m)))
        }
        _ => Err(arity("pow", "2 or 3", args.len())),
    }
}

/// `base ** exp % modulus` with Python's sign rules for the result.
fn mod_pow(base: i64, mut exp: i64, modulus: i64) -> i64 {
    let m = i128::from(modulus);
    let mut result: i128 = 1 % m.abs();
    let mut b = i128::from(base).rem_euclid(m.abs());
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * b % m.abs();
        }
        b = b * b % m.abs();
        exp >>= 1;
    }
    // The result takes the sign of the modulus.
    if m < 0 && result != 0 {
        result += m;
    }
    result as i64
}

fn builtin_round(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    only_keywords("round", kwargs, &["ndigits"])?;
    let (x, ndigits) = match (args, keyword(kwargs, "ndigits")) {
        ([x], nd) => (x, nd),
        ([x, nd], None) => (x, Some(nd)),
        _ => return Err(arity("round", "1 or 2", args.len())),
    };
    let ndigits = match ndigits {
        None | Some(Value::None) => None,
        Some(nd) => Some(nd.as_int().ok_or_else(|| {
            EvaluationFailure::type_mismatch("round", "ndigits must be an integer")
        })?),
    };
    match (x, ndigits) {
        (Value::Float(f), None) => float_to_int("round", f.round_ties_even()).map(Value::Int),
        (Value::Float(f), Some(nd)) => {
            let scale = 10f64.powi(nd.clamp(-308, 308) as i32);
            let rounded = (f * scale).round_ties_even() / scale;
            Ok(Value::Float(if rounded.is_finite() { rounded } else { *f }))
        }
        (Value::Int(_) | Value::Bool(_), nd) => {
            let i = x.as_int().unwrap_or_default();
            match nd {
                Some(nd) if nd < 0 => round_int(i, nd).map(Value::Int),
                _ => Ok(Value::Int(i)),
            }
        }
        (other, _) => Err(EvaluationFailure::type_mismatch(
            "round",
            format!("type {} doesn't define __round__ method", other.type_name()),
        )),
    }
}

/// Round an integer to a negative number of digits, halves to even.
fn round_int(value: i64, ndigits: i64) -> Result<i64, EvaluationFailure> {
    let Some(scale) = u32::try_from(-ndigits).ok().and_then(|p| 10i128.checked_pow(p)) else {
        return Ok(0);
    };
    let v = i128::from(value);
    let quotient = v.div_euclid(scale);
    let remainder = v.rem_euclid(scale);
    let rounded = match (2 * remainder).cmp(&scale) {
        Ordering::Greater => quotient + 1,
        Ordering::Equal if quotient % 2 != 0 => quotient + 1,
        _ => quotient,
    };
    i64::try_from(rounded * scale).map_err(|_| EvaluationFailure::overflow("round"))
}

fn builtin_sorted(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    only_keywords("sorted", kwargs, &["reverse"])?;
    let [iterable] = args else {
        return Err(arity("sorted", "1", args.len()));
    };
    let reverse = keyword(kwargs, "reverse").is_some_and(truthy);
    let mut items = iterate("sorted", iterable)?;

    let mut failure = None;
    items.sort_by(|a, b| {
        let (a, b) = if reverse { (b, a) } else { (a, b) };
        match py_cmp(a, b) {
            Ok(ordering) => ordering.unwrap_or(Ordering::Equal),
            Err(e) => {
                failure.get_or_insert(e);
                Ordering::Equal
            }
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(Value::List(items)),
    }
}

/// `str()` of a value: strings are returned as-is, everything else in repr form.
fn display_str(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

fn builtin_str(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    no_keywords("str", kwargs)?;
    match args {
        [] => Ok(Value::str("")),
        [x] => Ok(Value::Str(display_str(x))),
        _ => Err(arity("str", "0 or 1", args.len())),
    }
}

fn builtin_sum(args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, EvaluationFailure> {
    only_keywords("sum", kwargs, &["start"])?;
    let (iterable, start) = match (args, keyword(kwargs, "start")) {
        ([iterable], start) => (iterable, start.cloned().unwrap_or(Value::Int(0))),
        ([iterable, start], None) => (iterable, start.clone()),
        _ => return Err(arity("sum", "1 or 2", args.len())),
    };
    if matches!(start, Value::Str(_)) {
        return Err(EvaluationFailure::type_mismatch(
            "sum",
            "can't sum strings [use ''.join(seq) instead]",
        ));
    }
    iterate("sum", iterable)?
        .iter()
        .try_fold(start, |total, item| apply_binary(BinaryOp::Add, &total, item))
}
