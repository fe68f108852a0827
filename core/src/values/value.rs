use std::fmt;

use super::{FunctionRef, Namespace};
use crate::syntax::{Expr, format_float, quote_str};

/// A runtime value produced by folding.
///
/// The first nine variants are literal kinds with a source-level spelling.
/// `Function`, `Namespace` and `Object` are host values that may be bound in a
/// scope but never turned back into syntax.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Insertion ordered, de-duplicated under Python equality.
    Set(Vec<Value>),
    /// Insertion ordered by first key occurrence. Values may be residual.
    Map(Vec<(Value, Resolution)>),
    Function(FunctionRef),
    Namespace(Namespace),
    /// Opaque host object.
    Object { type_name: &'static str },
}

/// Outcome of folding a node: a concrete value or a (possibly simplified)
/// node that could not be reduced further.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Literal(Value),
    Residual(Expr),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn function(f: FunctionRef) -> Self {
        Value::Function(f)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::Map(_) => "dict",
            Value::Function(_) => "builtin_function_or_method",
            Value::Namespace(_) => "module",
            Value::Object { type_name } => *type_name,
        }
    }

    /// Whether the value may be used as a set element or mapping key.
    pub fn is_hashable(&self) -> bool {
        match self {
            Value::List(_) | Value::Set(_) | Value::Map(_) => false,
            Value::Tuple(items) => items.iter().all(Value::is_hashable),
            _ => true,
        }
    }

    /// `None`, booleans, numbers and strings.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::None | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_)
        )
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Value::List(_) | Value::Tuple(_) | Value::Set(_) | Value::Map(_)
        )
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Resolution {
    pub fn is_literal(&self) -> bool {
        matches!(self, Resolution::Literal(_))
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Resolution::Literal(v) => Some(v),
            Resolution::Residual(_) => None,
        }
    }

    pub fn into_literal(self) -> Option<Value> {
        match self {
            Resolution::Literal(v) => Some(v),
            Resolution::Residual(_) => None,
        }
    }

    pub fn as_residual(&self) -> Option<&Expr> {
        match self {
            Resolution::Residual(e) => Some(e),
            Resolution::Literal(_) => None,
        }
    }
}

impl From<Value> for Resolution {
    fn from(value: Value) -> Self {
        Resolution::Literal(value)
    }
}

impl From<Expr> for Resolution {
    fn from(expr: Expr) -> Self {
        Resolution::Residual(expr)
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Python `repr` form.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Str(s) => write!(f, "{}", quote_str(s)),
            Value::List(items) => {
                write!(f, "[")?;
                write_items(f, items)?;
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::Set(items) if items.is_empty() => write!(f, "set()"),
            Value::Set(items) => {
                write!(f, "{{")?;
                write_items(f, items)?;
                write!(f, "}}")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => write!(f, "<built-in function {}>", func.name()),
            Value::Namespace(ns) => write!(f, "<module '{}'>", ns.name()),
            Value::Object { type_name } => write!(f, "<{} object>", type_name),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Literal(value) => write!(f, "{}", value),
            Resolution::Residual(expr) => write!(f, "{}", expr),
        }
    }
}
