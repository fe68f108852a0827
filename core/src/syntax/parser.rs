use lazy_static::lazy_static;
use pest::Parser;
use pest::{Position, Span};
use pest::error::ErrorVariant;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;

use super::expr::{BinaryOp, BoolOp, CmpOp, Constant, Expr, Keyword, UnaryOp};

lazy_static! {
    // Note: precedence is defined lowest to highest.
    static ref PRATT_PARSER: PrattParser<Rule> = PrattParser::new()
        // (lowest precedence)
        .op(Op::infix(Rule::bit_or, Assoc::Left))         // `|`
        .op(Op::infix(Rule::bit_xor, Assoc::Left))        // `^`
        .op(Op::infix(Rule::bit_and, Assoc::Left))        // `&`
        .op(
            Op::infix(Rule::lshift, Assoc::Left) |
            Op::infix(Rule::rshift, Assoc::Left)
        )                                                // `<<`, `>>`
        .op(
            Op::infix(Rule::add, Assoc::Left) |
            Op::infix(Rule::sub, Assoc::Left)
        )                                                // `+`, `-`
        .op(
            Op::infix(Rule::mul, Assoc::Left) |
            Op::infix(Rule::mat_mul, Assoc::Left) |
            Op::infix(Rule::div, Assoc::Left) |
            Op::infix(Rule::floor_div, Assoc::Left) |
            Op::infix(Rule::modulo, Assoc::Left)
        )                                                // `*`, `@`, `/`, `//`, `%`
        .op(
            Op::prefix(Rule::neg) |
            Op::prefix(Rule::pos) |
            Op::prefix(Rule::invert)
        )                                                // `-`, `+`, `~`
        .op(Op::infix(Rule::pow, Assoc::Right))          // `**` (right-assoc)

        // Postfix operators.
        .op(
            Op::postfix(Rule::call_op) |
            Op::postfix(Rule::subscript_op) |
            Op::postfix(Rule::attribute_op)
        )                                                // `()`, `[]`, `.`
        // (highest precedence)
        ;
}

#[derive(Parser)]
#[grammar = "syntax/expression.pest"]
pub struct ExpressionParser;

pub type ParseError = pest::error::Error<Rule>;

fn custom_error(message: impl Into<String>, span: Span<'_>) -> ParseError {
    ParseError::new_from_span(
        ErrorVariant::CustomError {
            message: message.into(),
        },
        span,
    )
}

fn next_pair<'i>(
    pairs: &mut Pairs<'i, Rule>,
    span: Span<'i>,
    what: &str,
) -> Result<Pair<'i, Rule>, ParseError> {
    pairs
        .next()
        .ok_or_else(|| custom_error(format!("missing {what}"), span))
}

fn is_keyword_token(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_lambda | Rule::kw_if | Rule::kw_else | Rule::kw_or | Rule::kw_and | Rule::kw_not
    )
}

/// Inner pairs of `pair` with keyword tokens removed.
fn operands(pair: Pair<'_, Rule>) -> impl Iterator<Item = Pair<'_, Rule>> {
    pair.into_inner().filter(|p| !is_keyword_token(p.as_rule()))
}

fn parse_expr_list(pair: Pair<Rule>) -> Result<Vec<Expr>, ParseError> {
    pair.into_inner().map(parse_expr).collect()
}

pub fn parse_expr(pair: Pair<Rule>) -> Result<Expr, ParseError> {
    let span = pair.as_span();
    match pair.as_rule() {
        Rule::main | Rule::expression | Rule::grouped => {
            parse_expr(next_pair(&mut pair.into_inner(), span, "expression")?)
        }

        Rule::lambda => {
            let mut params = Vec::new();
            let mut body = None;
            for inner in operands(pair) {
                match inner.as_rule() {
                    Rule::lambda_params => {
                        params = inner.into_inner().map(|p| p.as_str().to_string()).collect();
                    }
                    _ => body = Some(parse_expr(inner)?),
                }
            }
            let body = body.ok_or_else(|| custom_error("missing lambda body", span))?;
            Ok(Expr::Lambda {
                params,
                body: Box::new(body),
            })
        }

        Rule::conditional => {
            let mut parts = operands(pair).map(parse_expr).collect::<Result<Vec<_>, _>>()?;
            match parts.len() {
                1 => Ok(parts.remove(0)),
                3 => {
                    let orelse = parts.remove(2);
                    let test = parts.remove(1);
                    let body = parts.remove(0);
                    Ok(Expr::IfExp {
                        test: Box::new(test),
                        body: Box::new(body),
                        orelse: Box::new(orelse),
                    })
                }
                _ => Err(custom_error("malformed conditional expression", span)),
            }
        }

        Rule::disjunction | Rule::conjunction => {
            let op = if pair.as_rule() == Rule::disjunction {
                BoolOp::Or
            } else {
                BoolOp::And
            };
            let mut values = operands(pair).map(parse_expr).collect::<Result<Vec<_>, _>>()?;
            if values.len() == 1 {
                Ok(values.remove(0))
            } else {
                Ok(Expr::BoolOp { op, values })
            }
        }

        Rule::inversion => {
            let mut negations = 0;
            let mut operand = None;
            for inner in pair.into_inner() {
                if inner.as_rule() == Rule::kw_not {
                    negations += 1;
                } else {
                    operand = Some(parse_expr(inner)?);
                }
            }
            let mut expr = operand.ok_or_else(|| custom_error("missing operand of `not`", span))?;
            for _ in 0..negations {
                expr = Expr::unary(UnaryOp::Not, expr);
            }
            Ok(expr)
        }

        Rule::comparison => {
            let mut inner = pair.into_inner();
            let left = parse_expr(next_pair(&mut inner, span, "comparison operand")?)?;
            let mut ops = Vec::new();
            let mut comparators = Vec::new();
            while let Some(op) = inner.next() {
                ops.push(match op.as_rule() {
                    Rule::eq => CmpOp::Eq,
                    Rule::ne => CmpOp::NotEq,
                    Rule::lt => CmpOp::Lt,
                    Rule::le => CmpOp::LtE,
                    Rule::gt => CmpOp::Gt,
                    Rule::ge => CmpOp::GtE,
                    Rule::is_op => CmpOp::Is,
                    Rule::is_not => CmpOp::IsNot,
                    Rule::in_op => CmpOp::In,
                    Rule::not_in => CmpOp::NotIn,
                    rule => {
                        return Err(custom_error(
                            format!("unknown comparison operator: {rule:?}"),
                            op.as_span(),
                        ));
                    }
                });
                comparators.push(parse_expr(next_pair(&mut inner, span, "comparator")?)?);
            }
            if ops.is_empty() {
                Ok(left)
            } else {
                Ok(Expr::Compare {
                    left: Box::new(left),
                    ops,
                    comparators,
                })
            }
        }

        Rule::arith => PRATT_PARSER
            .map_primary(parse_expr)
            .map_prefix(|op, rhs| {
                let op = match op.as_rule() {
                    Rule::neg => UnaryOp::USub,
                    Rule::pos => UnaryOp::UAdd,
                    Rule::invert => UnaryOp::Invert,
                    rule => {
                        return Err(custom_error(
                            format!("unknown prefix operator: {rule:?}"),
                            op.as_span(),
                        ));
                    }
                };
                Ok(Expr::unary(op, rhs?))
            })
            .map_infix(|lhs, op, rhs| {
                let op = match op.as_rule() {
                    Rule::add => BinaryOp::Add,
                    Rule::sub => BinaryOp::Sub,
                    Rule::mul => BinaryOp::Mult,
                    Rule::mat_mul => BinaryOp::MatMult,
                    Rule::div => BinaryOp::Div,
                    Rule::floor_div => BinaryOp::FloorDiv,
                    Rule::modulo => BinaryOp::Mod,
                    Rule::pow => BinaryOp::Pow,
                    Rule::lshift => BinaryOp::LShift,
                    Rule::rshift => BinaryOp::RShift,
                    Rule::bit_or => BinaryOp::BitOr,
                    Rule::bit_xor => BinaryOp::BitXor,
                    Rule::bit_and => BinaryOp::BitAnd,
                    rule => {
                        return Err(custom_error(
                            format!("unknown binary operator: {rule:?}"),
                            op.as_span(),
                        ));
                    }
                };
                Ok(Expr::binary(lhs?, op, rhs?))
            })
            .map_postfix(|lhs, op| match op.as_rule() {
                Rule::call_op => parse_call(lhs?, op),
                Rule::subscript_op => {
                    let op_span = op.as_span();
                    let index = next_pair(&mut op.into_inner(), op_span, "subscript index")?;
                    let slice = if index.as_rule() == Rule::slice {
                        parse_slice(index)?
                    } else {
                        parse_expr(index)?
                    };
                    Ok(Expr::subscript(lhs?, slice))
                }
                Rule::attribute_op => {
                    let op_span = op.as_span();
                    let attr = next_pair(&mut op.into_inner(), op_span, "attribute name")?;
                    Ok(Expr::Attribute {
                        value: Box::new(lhs?),
                        attr: attr.as_str().to_string(),
                    })
                }
                rule => Err(custom_error(
                    format!("unknown postfix operator: {rule:?}"),
                    op.as_span(),
                )),
            })
            .parse(pair.into_inner()),

        Rule::tuple => Ok(Expr::Tuple(parse_expr_list(pair)?)),
        Rule::list => Ok(Expr::List(parse_expr_list(pair)?)),
        Rule::set => Ok(Expr::Set(parse_expr_list(pair)?)),
        Rule::dict => {
            let entries = pair
                .into_inner()
                .map(|entry| {
                    let entry_span = entry.as_span();
                    let mut inner = entry.into_inner();
                    let key = parse_expr(next_pair(&mut inner, entry_span, "dict key")?)?;
                    let value = parse_expr(next_pair(&mut inner, entry_span, "dict value")?)?;
                    Ok((key, value))
                })
                .collect::<Result<_, ParseError>>()?;
            Ok(Expr::Dict(entries))
        }

        Rule::integer => parse_integer(pair.as_str())
            .map(Expr::int)
            .ok_or_else(|| custom_error("integer literal out of range", span)),

        Rule::float => pair
            .as_str()
            .replace('_', "")
            .parse()
            .map(Expr::float)
            .map_err(|_| custom_error("invalid float literal", span)),

        Rule::string => {
            let s = pair.as_str();
            Ok(Expr::Str(unescape(&s[1..s.len() - 1], span)?))
        }

        Rule::constant => match pair.as_str() {
            "True" => Ok(Expr::Constant(Constant::Bool(true))),
            "False" => Ok(Expr::Constant(Constant::Bool(false))),
            "None" => Ok(Expr::Constant(Constant::None)),
            other => Err(custom_error(format!("invalid constant: {other}"), span)),
        },

        Rule::ident => Ok(Expr::Name(pair.as_str().to_string())),

        rule => Err(custom_error(format!("Unhandled rule: {rule:?}"), span)),
    }
}

fn parse_call(func: Expr, op: Pair<Rule>) -> Result<Expr, ParseError> {
    let mut args = Vec::new();
    let mut keywords = Vec::new();
    for argument in op.into_inner() {
        let span = argument.as_span();
        match argument.as_rule() {
            Rule::kwarg => {
                let mut inner = argument.into_inner();
                let name = next_pair(&mut inner, span, "keyword name")?;
                let value = parse_expr(next_pair(&mut inner, span, "keyword value")?)?;
                keywords.push(Keyword {
                    arg: Some(name.as_str().to_string()),
                    value,
                });
            }
            Rule::double_star_arg => {
                let value = parse_expr(next_pair(&mut argument.into_inner(), span, "mapping")?)?;
                keywords.push(Keyword { arg: None, value });
            }
            Rule::star_arg => {
                let value = parse_expr(next_pair(&mut argument.into_inner(), span, "iterable")?)?;
                args.push(Expr::Starred(Box::new(value)));
            }
            _ => args.push(parse_expr(argument)?),
        }
    }
    Ok(Expr::Call {
        func: Box::new(func),
        args,
        keywords,
    })
}

fn parse_slice(pair: Pair<Rule>) -> Result<Expr, ParseError> {
    let mut lower = None;
    let mut upper = None;
    let mut step = None;
    for part in pair.into_inner() {
        let span = part.as_span();
        let rule = part.as_rule();
        let value = Some(Box::new(parse_expr(next_pair(
            &mut part.into_inner(),
            span,
            "slice bound",
        )?)?));
        match rule {
            Rule::slice_lower => lower = value,
            Rule::slice_upper => upper = value,
            _ => step = value,
        }
    }
    Ok(Expr::Slice { lower, upper, step })
}

fn parse_integer(text: &str) -> Option<i64> {
    let digits = text.replace('_', "");
    let lowered = digits.to_ascii_lowercase();
    if let Some(hex) = lowered.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = lowered.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = lowered.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else {
        digits.parse().ok()
    }
}

fn unescape(raw: &str, span: Span<'_>) -> Result<String, ParseError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            return Err(custom_error("dangling backslash in string literal", span));
        };
        match escaped {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            '0' => out.push('\0'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            'x' | 'u' | 'U' => {
                let width = match escaped {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let hex: String = chars.by_ref().take(width).collect();
                let decoded = (hex.len() == width)
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        custom_error(format!("invalid \\{escaped} escape in string literal"), span)
                    })?;
                out.push(decoded);
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Ok(out)
}

pub fn parse(source: &str) -> Result<Expr, ParseError> {
    let main = ExpressionParser::parse(Rule::main, source)?
        .next()
        .ok_or_else(|| {
            ParseError::new_from_pos(
                ErrorVariant::CustomError {
                    message: "missing expected pair in rule".to_string(),
                },
                Position::from_start(source),
            )
        })?;
    parse_expr(main)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_binary_expr() {
        assert_eq!(
            parse("1 + 2").unwrap(),
            Expr::binary(Expr::int(1), BinaryOp::Add, Expr::int(2))
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse("42").unwrap(), Expr::int(42));
        assert_eq!(parse("1_000").unwrap(), Expr::int(1000));
        assert_eq!(parse("0xff").unwrap(), Expr::int(255));
        assert_eq!(parse("0b101").unwrap(), Expr::int(5));
        assert_eq!(parse("0o17").unwrap(), Expr::int(15));
        assert_eq!(parse("3.5").unwrap(), Expr::float(3.5));
        assert_eq!(parse(".5").unwrap(), Expr::float(0.5));
        assert_eq!(parse("1e3").unwrap(), Expr::float(1000.0));
        assert_eq!(parse("'hi'").unwrap(), Expr::str("hi"));
        assert_eq!(parse("\"a\\tb\"").unwrap(), Expr::str("a\tb"));
        assert_eq!(parse("'\\x41\\u0042'").unwrap(), Expr::str("AB"));
        assert_eq!(parse("True").unwrap(), Expr::bool(true));
        assert_eq!(parse("None").unwrap(), Expr::none());
    }

    #[test]
    fn test_negative_literal_is_unary() {
        assert_eq!(
            parse("-5").unwrap(),
            Expr::unary(UnaryOp::USub, Expr::int(5))
        );
    }

    #[test]
    fn test_integer_out_of_range() {
        assert!(parse("99999999999999999999").is_err());
    }

    #[test]
    fn test_keywords_are_not_names() {
        assert_eq!(parse("Nonesuch").unwrap(), Expr::name("Nonesuch"));
        assert_eq!(parse("android").unwrap(), Expr::name("android"));
        assert!(parse("and").is_err());
    }

    #[test]
    fn test_boolean_operators_flatten() {
        assert_eq!(
            parse("a or b or c").unwrap(),
            Expr::BoolOp {
                op: BoolOp::Or,
                values: vec![Expr::name("a"), Expr::name("b"), Expr::name("c")],
            }
        );
    }

    #[test]
    fn test_chained_comparison() {
        assert_eq!(
            parse("a < b <= c").unwrap(),
            Expr::Compare {
                left: Box::new(Expr::name("a")),
                ops: vec![CmpOp::Lt, CmpOp::LtE],
                comparators: vec![Expr::name("b"), Expr::name("c")],
            }
        );
        assert_eq!(
            parse("a not in b").unwrap(),
            Expr::Compare {
                left: Box::new(Expr::name("a")),
                ops: vec![CmpOp::NotIn],
                comparators: vec![Expr::name("b")],
            }
        );
        assert_eq!(
            parse("a is not None").unwrap(),
            Expr::Compare {
                left: Box::new(Expr::name("a")),
                ops: vec![CmpOp::IsNot],
                comparators: vec![Expr::none()],
            }
        );
    }

    #[test]
    fn test_call_arguments() {
        assert_eq!(
            parse("f(1, *xs, k=2, **kw)").unwrap(),
            Expr::Call {
                func: Box::new(Expr::name("f")),
                args: vec![Expr::int(1), Expr::Starred(Box::new(Expr::name("xs")))],
                keywords: vec![
                    Keyword {
                        arg: Some("k".to_string()),
                        value: Expr::int(2),
                    },
                    Keyword {
                        arg: None,
                        value: Expr::name("kw"),
                    },
                ],
            }
        );
        assert_eq!(
            parse("f(a == b)").unwrap(),
            Expr::call(
                Expr::name("f"),
                vec![Expr::Compare {
                    left: Box::new(Expr::name("a")),
                    ops: vec![CmpOp::Eq],
                    comparators: vec![Expr::name("b")],
                }]
            )
        );
    }

    #[test]
    fn test_subscripts_and_slices() {
        assert_eq!(
            parse("x[0]").unwrap(),
            Expr::subscript(Expr::name("x"), Expr::int(0))
        );
        assert_eq!(
            parse("x[1:]").unwrap(),
            Expr::subscript(
                Expr::name("x"),
                Expr::Slice {
                    lower: Some(Box::new(Expr::int(1))),
                    upper: None,
                    step: None,
                }
            )
        );
        assert_eq!(
            parse("x[::2]").unwrap(),
            Expr::subscript(
                Expr::name("x"),
                Expr::Slice {
                    lower: None,
                    upper: None,
                    step: Some(Box::new(Expr::int(2))),
                }
            )
        );
    }

    #[test]
    fn test_containers() {
        assert_eq!(parse("()").unwrap(), Expr::Tuple(vec![]));
        assert_eq!(parse("(1,)").unwrap(), Expr::Tuple(vec![Expr::int(1)]));
        assert_eq!(parse("(1)").unwrap(), Expr::int(1));
        assert_eq!(parse("[]").unwrap(), Expr::List(vec![]));
        assert_eq!(parse("{}").unwrap(), Expr::Dict(vec![]));
        assert_eq!(
            parse("{1, 2,}").unwrap(),
            Expr::Set(vec![Expr::int(1), Expr::int(2)])
        );
        assert_eq!(
            parse("{'a': 1}").unwrap(),
            Expr::Dict(vec![(Expr::str("a"), Expr::int(1))])
        );
    }

    #[test]
    fn test_conditional_and_lambda() {
        assert_eq!(
            parse("a if b else c").unwrap(),
            Expr::IfExp {
                test: Box::new(Expr::name("b")),
                body: Box::new(Expr::name("a")),
                orelse: Box::new(Expr::name("c")),
            }
        );
        assert_eq!(
            parse("lambda: 1").unwrap(),
            Expr::Lambda {
                params: vec![],
                body: Box::new(Expr::int(1)),
            }
        );
    }

    #[test]
    fn test_attribute_chain() {
        assert_eq!(
            parse("math.pi").unwrap(),
            Expr::Attribute {
                value: Box::new(Expr::name("math")),
                attr: "pi".to_string(),
            }
        );
    }
}
