//! Source-form printing of expression trees.
//!
//! Output is valid source for `parse` with the minimal parentheses needed to
//! keep the tree shape.

use std::fmt;

use super::expr::{BinaryOp, BoolOp, Constant, Expr, Keyword, Number, UnaryOp};

// Binding strength, lowest to highest.
const LAMBDA: u8 = 0;
const IF_EXP: u8 = 1;
const OR: u8 = 2;
const AND: u8 = 3;
const NOT: u8 = 4;
const COMPARE: u8 = 5;
const BIT_OR: u8 = 6;
const BIT_XOR: u8 = 7;
const BIT_AND: u8 = 8;
const SHIFT: u8 = 9;
const ARITH: u8 = 10;
const TERM: u8 = 11;
const UNARY: u8 = 12;
const POWER: u8 = 13;
const ATOM: u8 = 14;

fn binary_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::BitOr => BIT_OR,
        BinaryOp::BitXor => BIT_XOR,
        BinaryOp::BitAnd => BIT_AND,
        BinaryOp::LShift | BinaryOp::RShift => SHIFT,
        BinaryOp::Add | BinaryOp::Sub => ARITH,
        BinaryOp::Mult
        | BinaryOp::MatMult
        | BinaryOp::Div
        | BinaryOp::FloorDiv
        | BinaryOp::Mod => TERM,
        BinaryOp::Pow => POWER,
    }
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Num(Number::Float(f)) if f.is_nan() => ARITH,
        Expr::Num(n) if n.is_negative() => UNARY,
        Expr::UnaryOp {
            op: UnaryOp::Not, ..
        } => NOT,
        Expr::UnaryOp { .. } => UNARY,
        Expr::BinOp { op, .. } => binary_precedence(*op),
        Expr::BoolOp { op: BoolOp::And, .. } => AND,
        Expr::BoolOp { op: BoolOp::Or, .. } => OR,
        Expr::Compare { .. } => COMPARE,
        Expr::IfExp { .. } => IF_EXP,
        Expr::Lambda { .. } => LAMBDA,
        _ => ATOM,
    }
}

/// Writes `expr`, parenthesized if it binds looser than `min`.
fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, min: u8) -> fmt::Result {
    if precedence(expr) < min {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

fn write_separated<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    mut write_item: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write_item(f, item)?;
    }
    Ok(())
}

/// Python `repr` of a float.
pub(crate) fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-4) {
        let formatted = format!("{value:e}");
        let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Python `repr` of a string: single quotes unless only double quotes avoid
/// escaping.
pub(crate) fn quote_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn write_number(f: &mut fmt::Formatter<'_>, number: &Number) -> fmt::Result {
    match number {
        Number::Int(i) => write!(f, "{i}"),
        Number::Float(v) if v.is_nan() => write!(f, "1e309 - 1e309"),
        Number::Float(v) if v.is_infinite() => {
            if *v > 0.0 {
                write!(f, "1e309")
            } else {
                write!(f, "-1e309")
            }
        }
        Number::Float(v) => write!(f, "{}", format_float(*v)),
    }
}

fn write_keyword(f: &mut fmt::Formatter<'_>, keyword: &Keyword) -> fmt::Result {
    match &keyword.arg {
        Some(name) => write!(f, "{name}={}", keyword.value),
        None => {
            write!(f, "**")?;
            write_operand(f, &keyword.value, BIT_OR)
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Bool(true) => write!(f, "True"),
            Constant::Bool(false) => write!(f, "False"),
            Constant::None => write!(f, "None"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Name(id) => write!(f, "{id}"),
            Expr::Attribute { value, attr } => {
                // `1.real` does not tokenize; any number base needs parens.
                if matches!(**value, Expr::Num(_)) {
                    write!(f, "({value})")?;
                } else {
                    write_operand(f, value, ATOM)?;
                }
                write!(f, ".{attr}")
            }
            Expr::Constant(c) => write!(f, "{c}"),
            Expr::Num(n) => write_number(f, n),
            Expr::Str(s) => write!(f, "{}", quote_str(s)),
            Expr::List(elts) => {
                write!(f, "[")?;
                write_separated(f, elts, |f, e| write_operand(f, e, IF_EXP))?;
                write!(f, "]")
            }
            Expr::Tuple(elts) => {
                write!(f, "(")?;
                write_separated(f, elts, |f, e| write_operand(f, e, IF_EXP))?;
                if elts.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Expr::Set(elts) if elts.is_empty() => write!(f, "{{*()}}"),
            Expr::Set(elts) => {
                write!(f, "{{")?;
                write_separated(f, elts, |f, e| write_operand(f, e, IF_EXP))?;
                write!(f, "}}")
            }
            Expr::Dict(entries) => {
                write!(f, "{{")?;
                write_separated(f, entries, |f, (k, v)| {
                    write_operand(f, k, IF_EXP)?;
                    write!(f, ": ")?;
                    write_operand(f, v, IF_EXP)
                })?;
                write!(f, "}}")
            }
            Expr::Subscript { value, slice } => {
                write_operand(f, value, ATOM)?;
                write!(f, "[{slice}]")
            }
            Expr::Index(inner) => write!(f, "{inner}"),
            Expr::Slice { lower, upper, step } => {
                if let Some(lower) = lower {
                    write!(f, "{lower}")?;
                }
                write!(f, ":")?;
                if let Some(upper) = upper {
                    write!(f, "{upper}")?;
                }
                if let Some(step) = step {
                    write!(f, ":{step}")?;
                }
                Ok(())
            }
            Expr::UnaryOp {
                op: UnaryOp::Not,
                operand,
            } => {
                write!(f, "not ")?;
                write_operand(f, operand, NOT)
            }
            Expr::UnaryOp { op, operand } => {
                write!(f, "{}", op.symbol())?;
                write_operand(f, operand, UNARY)
            }
            Expr::BinOp { left, op, right } => {
                let p = binary_precedence(*op);
                let (left_min, right_min) = if *op == BinaryOp::Pow {
                    (POWER + 1, UNARY)
                } else {
                    (p, p + 1)
                };
                write_operand(f, left, left_min)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, right, right_min)
            }
            Expr::BoolOp { op, values } => {
                let p = precedence(self);
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op.keyword())?;
                    }
                    write_operand(f, value, p + 1)?;
                }
                Ok(())
            }
            Expr::Compare {
                left,
                ops,
                comparators,
            } => {
                write_operand(f, left, COMPARE + 1)?;
                for (op, comparator) in ops.iter().zip(comparators) {
                    write!(f, " {} ", op.symbol())?;
                    write_operand(f, comparator, COMPARE + 1)?;
                }
                Ok(())
            }
            Expr::Call {
                func,
                args,
                keywords,
            } => {
                write_operand(f, func, ATOM)?;
                write!(f, "(")?;
                write_separated(f, args, |f, a| write_operand(f, a, IF_EXP))?;
                if !args.is_empty() && !keywords.is_empty() {
                    write!(f, ", ")?;
                }
                write_separated(f, keywords, write_keyword)?;
                write!(f, ")")
            }
            Expr::Starred(inner) => {
                write!(f, "*")?;
                write_operand(f, inner, BIT_OR)
            }
            Expr::IfExp { test, body, orelse } => {
                write_operand(f, body, OR)?;
                write!(f, " if ")?;
                write_operand(f, test, OR)?;
                write!(f, " else ")?;
                write_operand(f, orelse, IF_EXP)
            }
            Expr::Lambda { params, body } => {
                write!(f, "lambda")?;
                if !params.is_empty() {
                    write!(f, " {}", params.join(", "))?;
                }
                write!(f, ": ")?;
                write_operand(f, body, LAMBDA)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn roundtrip(source: &str) -> String {
        parse(source)
            .unwrap_or_else(|e| panic!("failed to parse {source}: {e}"))
            .to_string()
    }

    #[test]
    fn test_minimal_parentheses() {
        assert_eq!(roundtrip("(a + b) * c"), "(a + b) * c");
        assert_eq!(roundtrip("a + (b * c)"), "a + b * c");
        assert_eq!(roundtrip("a - (b - c)"), "a - (b - c)");
        assert_eq!(roundtrip("(a - b) - c"), "a - b - c");
        assert_eq!(roundtrip("(a ** b) ** c"), "(a ** b) ** c");
        assert_eq!(roundtrip("a ** b ** c"), "a ** b ** c");
        assert_eq!(roundtrip("-a ** 2"), "-a ** 2");
        assert_eq!(roundtrip("(-a) ** 2"), "(-a) ** 2");
    }

    #[test]
    fn test_boolean_and_comparison() {
        assert_eq!(roundtrip("a and (b or c)"), "a and (b or c)");
        assert_eq!(roundtrip("a or b and c"), "a or b and c");
        assert_eq!(roundtrip("not a == b"), "not a == b");
        assert_eq!(roundtrip("a < b <= c"), "a < b <= c");
        assert_eq!(roundtrip("x not in y"), "x not in y");
        assert_eq!(roundtrip("x is not None"), "x is not None");
    }

    #[test]
    fn test_containers_and_calls() {
        assert_eq!(roundtrip("[1, 'a', None]"), "[1, 'a', None]");
        assert_eq!(roundtrip("(1,)"), "(1,)");
        assert_eq!(roundtrip("()"), "()");
        assert_eq!(roundtrip("{1: 2, 'k': [3]}"), "{1: 2, 'k': [3]}");
        assert_eq!(roundtrip("{1, 2}"), "{1, 2}");
        assert_eq!(roundtrip("f(1, *xs, k=2, **kw)"), "f(1, *xs, k=2, **kw)");
        assert_eq!(roundtrip("a.b.c[1:2]"), "a.b.c[1:2]");
        assert_eq!(roundtrip("x[::2]"), "x[::2]");
    }

    #[test]
    fn test_unhandled_kinds() {
        assert_eq!(roundtrip("a if b else c"), "a if b else c");
        assert_eq!(roundtrip("lambda x, y: x + y"), "lambda x, y: x + y");
    }

    #[test]
    fn test_negative_number_base() {
        let expr = Expr::binary(Expr::int(-3), BinaryOp::Pow, Expr::int(2));
        assert_eq!(expr.to_string(), "(-3) ** 2");
        let attr = Expr::Attribute {
            value: Box::new(Expr::int(1)),
            attr: "real".to_string(),
        };
        assert_eq!(attr.to_string(), "(1).real");
    }

    #[test]
    fn test_empty_set() {
        assert_eq!(Expr::Set(vec![]).to_string(), "{*()}");
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.1), "0.1");
        assert_eq!(format_float(-2.5), "-2.5");
        assert_eq!(format_float(1e20), "1e+20");
        assert_eq!(format_float(1.5e-7), "1.5e-07");
        assert_eq!(format_float(f64::INFINITY), "inf");
    }

    #[test]
    fn test_quote_str() {
        assert_eq!(quote_str("abc"), "'abc'");
        assert_eq!(quote_str("it's"), "\"it's\"");
        assert_eq!(quote_str("a'b\"c"), "'a\\'b\"c'");
        assert_eq!(quote_str("line\n"), "'line\\n'");
    }
}
