//! Operator implementations over literal values.
//!
//! Semantics follow Python: booleans take part in arithmetic as integers,
//! true division always yields a float, floor division and modulo round
//! toward negative infinity. Integer arithmetic is checked; a result that
//! does not fit in an `i64` is reported as an overflow instead of wrapping.

use core::cmp::Ordering;

use super::EvaluationFailure;
use crate::syntax::{BinaryOp, CmpOp, UnaryOp};
use crate::values::{Resolution, Value};

/// Longest string or sequence that repetition may produce.
pub const MAX_REPEAT_LEN: usize = 1_000_000;

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

fn as_number(value: &Value) -> Option<Num> {
    match value {
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        Value::Int(i) => Some(Num::Int(*i)),
        Value::Float(f) => Some(Num::Float(*f)),
        _ => None,
    }
}

impl Num {
    fn to_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Num::Int(i) => i == 0,
            Num::Float(f) => f == 0.0,
        }
    }
}

fn operand_types(left: &Value, right: &Value) -> String {
    format!("'{}' and '{}'", left.type_name(), right.type_name())
}

/// Python truthiness.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::None => false,
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::Str(s) => !s.is_empty(),
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => !items.is_empty(),
        Value::Map(entries) => !entries.is_empty(),
        Value::Function(_) | Value::Namespace(_) | Value::Object { .. } => true,
    }
}

pub fn apply_unary(op: UnaryOp, operand: &Value) -> Result<Value, EvaluationFailure> {
    match (op, operand) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!truthy(v))),
        (UnaryOp::UAdd, Value::Float(f)) => Ok(Value::Float(*f)),
        (UnaryOp::USub, Value::Float(f)) => Ok(Value::Float(-*f)),
        (op, v) => {
            let Some(Num::Int(i)) = as_number(v) else {
                return Err(EvaluationFailure::type_mismatch(
                    format!("unary {}", op.symbol()),
                    format!("'{}'", v.type_name()),
                ));
            };
            match op {
                UnaryOp::UAdd => Ok(Value::Int(i)),
                UnaryOp::USub => i
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| EvaluationFailure::overflow("negation")),
                _ => Ok(Value::Int(!i)),
            }
        }
    }
}

pub fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvaluationFailure> {
    if let (Some(a), Some(b)) = (as_number(left), as_number(right)) {
        if let (Value::Bool(x), Value::Bool(y)) = (left, right) {
            match op {
                BinaryOp::BitAnd => return Ok(Value::Bool(*x & *y)),
                BinaryOp::BitOr => return Ok(Value::Bool(*x | *y)),
                BinaryOp::BitXor => return Ok(Value::Bool(*x ^ *y)),
                _ => {}
            }
        }
        return match (a, b) {
            (Num::Int(x), Num::Int(y)) => binary_int(op, x, y),
            _ => binary_float(op, a.to_f64(), b.to_f64(), left, right),
        };
    }

    match (op, left, right) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            Ok(Value::Tuple(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOp::Mult, seq, count) | (BinaryOp::Mult, count, seq)
            if matches!(seq, Value::Str(_) | Value::List(_) | Value::Tuple(_))
                && matches!(count, Value::Int(_) | Value::Bool(_)) =>
        {
            repeat(seq, count.as_int().unwrap_or(0))
        }
        (BinaryOp::BitOr, Value::Set(a), Value::Set(b)) => {
            let mut union = a.clone();
            for item in b {
                if !contains(&union, item) {
                    union.push(item.clone());
                }
            }
            Ok(Value::Set(union))
        }
        (BinaryOp::BitAnd, Value::Set(a), Value::Set(b)) => Ok(Value::Set(
            a.iter().filter(|item| contains(b, item)).cloned().collect(),
        )),
        (BinaryOp::Sub, Value::Set(a), Value::Set(b)) => Ok(Value::Set(
            a.iter().filter(|item| !contains(b, item)).cloned().collect(),
        )),
        (BinaryOp::BitXor, Value::Set(a), Value::Set(b)) => Ok(Value::Set(
            a.iter()
                .filter(|item| !contains(b, item))
                .chain(b.iter().filter(|item| !contains(a, item)))
                .cloned()
                .collect(),
        )),
        _ => Err(EvaluationFailure::type_mismatch(
            op.symbol(),
            operand_types(left, right),
        )),
    }
}

fn repeat(seq: &Value, count: i64) -> Result<Value, EvaluationFailure> {
    let count = usize::try_from(count).unwrap_or(0);
    let len = match seq {
        Value::Str(s) => s.chars().count(),
        Value::List(items) | Value::Tuple(items) => items.len(),
        _ => 0,
    };
    if len.saturating_mul(count) > MAX_REPEAT_LEN {
        return Err(EvaluationFailure::overflow("repetition"));
    }
    Ok(match seq {
        Value::Str(s) => Value::Str(s.repeat(count)),
        Value::List(items) => Value::List(repeat_items(items, count)),
        Value::Tuple(items) => Value::Tuple(repeat_items(items, count)),
        other => other.clone(),
    })
}

fn repeat_items(items: &[Value], count: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len() * count);
    for _ in 0..count {
        out.extend_from_slice(items);
    }
    out
}

fn binary_int(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvaluationFailure> {
    let overflow = || EvaluationFailure::overflow(format!("integer {}", op.symbol()));
    let checked = |result: Option<i64>| result.map(Value::Int).ok_or_else(overflow);
    match op {
        BinaryOp::Add => checked(a.checked_add(b)),
        BinaryOp::Sub => checked(a.checked_sub(b)),
        BinaryOp::Mult => checked(a.checked_mul(b)),
        BinaryOp::Div => {
            if b == 0 {
                return Err(EvaluationFailure::ZeroDivision);
            }
            Ok(Value::Float(a as f64 / b as f64))
        }
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(EvaluationFailure::ZeroDivision);
            }
            let q = a.checked_div(b).ok_or_else(overflow)?;
            if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
                Ok(Value::Int(q - 1))
            } else {
                Ok(Value::Int(q))
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(EvaluationFailure::ZeroDivision);
            }
            let r = a.wrapping_rem(b);
            if r != 0 && ((r < 0) != (b < 0)) {
                Ok(Value::Int(r + b))
            } else {
                Ok(Value::Int(r))
            }
        }
        BinaryOp::Pow => {
            if b < 0 {
                if a == 0 {
                    return Err(EvaluationFailure::ZeroDivision);
                }
                return Ok(Value::Float((a as f64).powf(b as f64)));
            }
            match u32::try_from(b) {
                Ok(exp) => checked(a.checked_pow(exp)),
                Err(_) => match a {
                    0 | 1 => Ok(Value::Int(a)),
                    -1 => Ok(Value::Int(if b % 2 == 0 { 1 } else { -1 })),
                    _ => Err(overflow()),
                },
            }
        }
        BinaryOp::LShift | BinaryOp::RShift if b < 0 => Err(EvaluationFailure::invalid_argument(
            op.symbol(),
            "negative shift count",
        )),
        BinaryOp::LShift => {
            if a == 0 {
                return Ok(Value::Int(0));
            }
            if b >= 63 {
                return Err(overflow());
            }
            let shifted = a << b;
            if shifted >> b == a {
                Ok(Value::Int(shifted))
            } else {
                Err(overflow())
            }
        }
        BinaryOp::RShift => Ok(Value::Int(if b >= 64 {
            if a < 0 { -1 } else { 0 }
        } else {
            a >> b
        })),
        BinaryOp::BitAnd => Ok(Value::Int(a & b)),
        BinaryOp::BitOr => Ok(Value::Int(a | b)),
        BinaryOp::BitXor => Ok(Value::Int(a ^ b)),
        BinaryOp::MatMult => Err(EvaluationFailure::type_mismatch("@", "'int' and 'int'")),
    }
}

/// Floor quotient and remainder of two floats, `b != 0`.
///
/// The quotient is derived from the exact remainder rather than from
/// `(a / b).floor()`, which rounds up for cases like `1 // 0.1`.
pub fn float_divmod(a: f64, b: f64) -> (f64, f64) {
    let mut rem = a % b;
    let mut div = (a - rem) / b;
    if rem != 0.0 {
        if (b < 0.0) != (rem < 0.0) {
            rem += b;
            div -= 1.0;
        }
    } else {
        rem = 0.0_f64.copysign(b);
    }
    let quotient = if div != 0.0 {
        let floor = div.floor();
        if div - floor > 0.5 { floor + 1.0 } else { floor }
    } else {
        0.0_f64.copysign(a / b)
    };
    (quotient, rem)
}

fn binary_float(
    op: BinaryOp,
    a: f64,
    b: f64,
    left: &Value,
    right: &Value,
) -> Result<Value, EvaluationFailure> {
    let divisor_is_zero = as_number(right).is_some_and(Num::is_zero);
    match op {
        BinaryOp::Add => Ok(Value::Float(a + b)),
        BinaryOp::Sub => Ok(Value::Float(a - b)),
        BinaryOp::Mult => Ok(Value::Float(a * b)),
        BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod if divisor_is_zero => {
            Err(EvaluationFailure::ZeroDivision)
        }
        BinaryOp::Div => Ok(Value::Float(a / b)),
        BinaryOp::FloorDiv => Ok(Value::Float(float_divmod(a, b).0)),
        BinaryOp::Mod => Ok(Value::Float(float_divmod(a, b).1)),
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(EvaluationFailure::ZeroDivision);
            }
            if a < 0.0 && b.fract() != 0.0 {
                return Err(EvaluationFailure::type_mismatch(
                    "**",
                    "negative base with fractional exponent",
                ));
            }
            let result = a.powf(b);
            if result.is_infinite() && a.is_finite() && b.is_finite() {
                return Err(EvaluationFailure::overflow("float **"));
            }
            Ok(Value::Float(result))
        }
        _ => Err(EvaluationFailure::type_mismatch(
            op.symbol(),
            operand_types(left, right),
        )),
    }
}

/// Exact ordering of an int against a float. Converting the int to `f64`
/// would round anything above 2**53.
fn cmp_int_float(i: i64, f: f64) -> Option<Ordering> {
    // 2**63, the first float past the i64 range.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return None;
    }
    if f >= LIMIT {
        return Some(Ordering::Less);
    }
    if f < -LIMIT {
        return Some(Ordering::Greater);
    }
    let floor = f.floor();
    let whole = floor as i64;
    if floor == f {
        Some(i.cmp(&whole))
    } else if i <= whole {
        Some(Ordering::Less)
    } else {
        Some(Ordering::Greater)
    }
}

fn num_cmp(a: Num, b: Num) -> Option<Ordering> {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
        (Num::Float(x), Num::Float(y)) => x.partial_cmp(&y),
        (Num::Int(x), Num::Float(y)) => cmp_int_float(x, y),
        (Num::Float(x), Num::Int(y)) => cmp_int_float(y, x).map(Ordering::reverse),
    }
}

/// Python `==` between two values.
pub fn py_eq(left: &Value, right: &Value) -> bool {
    if let (Some(a), Some(b)) = (as_number(left), as_number(right)) {
        return num_cmp(a, b) == Some(Ordering::Equal);
    }
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| py_eq(x, y))
        }
        (Value::Set(a), Value::Set(b)) => {
            a.len() == b.len() && a.iter().all(|item| contains(b, item))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, value)| {
                    map_get(b, key).is_some_and(|other| resolution_eq(value, other))
                })
        }
        (Value::Function(a), Value::Function(b)) => a == b,
        (Value::Namespace(a), Value::Namespace(b)) => a == b,
        _ => false,
    }
}

fn resolution_eq(left: &Resolution, right: &Resolution) -> bool {
    match (left, right) {
        (Resolution::Literal(a), Resolution::Literal(b)) => py_eq(a, b),
        (a, b) => a == b,
    }
}

/// Membership under Python equality.
pub fn contains(items: &[Value], needle: &Value) -> bool {
    items.iter().any(|item| py_eq(item, needle))
}

/// Look up a key in mapping entries.
pub fn map_get<'v>(entries: &'v [(Value, Resolution)], key: &Value) -> Option<&'v Resolution> {
    entries
        .iter()
        .find(|(k, _)| py_eq(k, key))
        .map(|(_, value)| value)
}

/// Insert into mapping entries: a repeated key keeps its position and takes
/// the new value.
pub fn map_insert(
    entries: &mut Vec<(Value, Resolution)>,
    key: Value,
    value: Resolution,
) -> Result<(), EvaluationFailure> {
    if !key.is_hashable() {
        return Err(EvaluationFailure::Unhashable {
            type_name: key.type_name(),
        });
    }
    match entries.iter_mut().find(|(k, _)| py_eq(k, &key)) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
    Ok(())
}

/// Build a set: elements must be hashable; duplicates keep the first occurrence.
pub fn build_set(items: impl IntoIterator<Item = Value>) -> Result<Vec<Value>, EvaluationFailure> {
    let mut set = Vec::new();
    for item in items {
        if !item.is_hashable() {
            return Err(EvaluationFailure::Unhashable {
                type_name: item.type_name(),
            });
        }
        if !contains(&set, &item) {
            set.push(item);
        }
    }
    Ok(set)
}

/// Python ordering. `Ok(None)` means unordered (NaN involved).
pub fn py_cmp(left: &Value, right: &Value) -> Result<Option<Ordering>, EvaluationFailure> {
    if let (Some(a), Some(b)) = (as_number(left), as_number(right)) {
        return Ok(num_cmp(a, b));
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            for (x, y) in a.iter().zip(b) {
                if !py_eq(x, y) {
                    return py_cmp(x, y);
                }
            }
            Ok(Some(a.len().cmp(&b.len())))
        }
        _ => Err(EvaluationFailure::type_mismatch(
            "ordering",
            operand_types(left, right),
        )),
    }
}

fn is_singleton(value: &Value) -> bool {
    matches!(value, Value::None | Value::Bool(_))
}

fn has_identity(value: &Value) -> bool {
    is_singleton(value) || matches!(value, Value::Function(_) | Value::Namespace(_))
}

fn has_residual(value: &Value) -> bool {
    match value {
        Value::Map(entries) => entries.iter().any(|(_, v)| match v {
            Resolution::Literal(inner) => has_residual(inner),
            Resolution::Residual(_) => true,
        }),
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
            items.iter().any(has_residual)
        }
        _ => false,
    }
}

fn set_cmp(op: CmpOp, a: &[Value], b: &[Value]) -> bool {
    let subset = a.iter().all(|item| contains(b, item));
    let superset = b.iter().all(|item| contains(a, item));
    match op {
        CmpOp::Lt => subset && a.len() < b.len(),
        CmpOp::LtE => subset,
        CmpOp::Gt => superset && a.len() > b.len(),
        _ => superset,
    }
}

/// Evaluate one link of a comparison chain.
pub fn apply_comparison(op: CmpOp, left: &Value, right: &Value) -> Result<bool, EvaluationFailure> {
    if has_residual(left) || has_residual(right) {
        return Err(EvaluationFailure::type_mismatch(
            op.symbol(),
            "operand contains unresolved values",
        ));
    }
    if matches!(left, Value::Object { .. }) || matches!(right, Value::Object { .. }) {
        return Err(EvaluationFailure::type_mismatch(
            op.symbol(),
            operand_types(left, right),
        ));
    }
    match op {
        CmpOp::Eq => Ok(py_eq(left, right)),
        CmpOp::NotEq => Ok(!py_eq(left, right)),
        CmpOp::Is | CmpOp::IsNot => {
            let same = if has_identity(left) && has_identity(right) {
                match (left, right) {
                    (Value::Bool(a), Value::Bool(b)) => a == b,
                    (Value::None, Value::None) => true,
                    (Value::Function(a), Value::Function(b)) => a == b,
                    (Value::Namespace(a), Value::Namespace(b)) => a == b,
                    _ => false,
                }
            } else if is_singleton(left) || is_singleton(right) {
                false
            } else {
                return Err(EvaluationFailure::type_mismatch(
                    op.symbol(),
                    "identity of non-singleton values is unknown",
                ));
            };
            Ok(if op == CmpOp::Is { same } else { !same })
        }
        CmpOp::In | CmpOp::NotIn => {
            let found = membership(left, right)?;
            Ok(if op == CmpOp::In { found } else { !found })
        }
        CmpOp::Lt | CmpOp::LtE | CmpOp::Gt | CmpOp::GtE => {
            if let (Value::Set(a), Value::Set(b)) = (left, right) {
                return Ok(set_cmp(op, a, b));
            }
            let Some(ordering) = py_cmp(left, right)? else {
                return Ok(false);
            };
            Ok(match op {
                CmpOp::Lt => ordering == Ordering::Less,
                CmpOp::LtE => ordering != Ordering::Greater,
                CmpOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}

fn membership(needle: &Value, haystack: &Value) -> Result<bool, EvaluationFailure> {
    match haystack {
        Value::Str(s) => match needle {
            Value::Str(sub) => Ok(s.contains(sub.as_str())),
            other => Err(EvaluationFailure::type_mismatch(
                "in",
                format!("'in <string>' requires string as left operand, not {}", other.type_name()),
            )),
        },
        Value::List(items) | Value::Tuple(items) => Ok(contains(items, needle)),
        Value::Set(_) | Value::Map(_) if !needle.is_hashable() => {
            Err(EvaluationFailure::Unhashable {
                type_name: needle.type_name(),
            })
        }
        Value::Set(items) => Ok(contains(items, needle)),
        Value::Map(entries) => Ok(map_get(entries, needle).is_some()),
        other => Err(EvaluationFailure::type_mismatch(
            "in",
            format!("argument of type '{}' is not iterable", other.type_name()),
        )),
    }
}
