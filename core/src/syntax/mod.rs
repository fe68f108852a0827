mod display;
mod expr;
pub mod parser;

pub use expr::{BinaryOp, BoolOp, CmpOp, Constant, Expr, Keyword, Number, UnaryOp};
pub use parser::{ExpressionParser, ParseError, Rule, parse};

pub(crate) use display::{format_float, quote_str};
