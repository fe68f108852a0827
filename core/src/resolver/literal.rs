//! Dispatcher for literal folding.

use tracing::{debug, info, trace, warn};

use super::bridge::{is_wrappable, to_node};
use super::operators::{apply_binary, apply_comparison, apply_unary, build_set, map_insert};
use super::{FoldContext, FoldError, Resolver, resolve_name_or_attribute};
use crate::syntax::{BinaryOp, BoolOp, CmpOp, Expr, Keyword, Number, UnaryOp};
use crate::values::{Resolution, Value};

/// Fold `node` and turn the result back into a node.
///
/// If the folded value has no literal spelling, `node` itself is returned.
///
/// # Errors
///
/// `DepthExceeded` when the tree (or a chain of bindings) is nested deeper
/// than `FoldOptions::max_depth`, `UnsupportedConstruct` when `node` is a bare
/// slice, and `InternalConsistency` when a folded number cannot be
/// represented exactly.
pub fn resolve_literal(node: &Expr, ctx: &FoldContext<'_>) -> Result<Expr, FoldError> {
    let resolution = resolve_literal_raw(node, ctx)?;
    match to_node(&resolution) {
        Ok(expr) => Ok(expr),
        Err(FoldError::NotWrappable { value, type_name }) => {
            debug!(%value, type_name, "folded value has no literal form");
            Ok(node.clone())
        }
        Err(e) => Err(e),
    }
}

/// Fold `node`, returning the value reached or the residual node.
pub fn resolve_literal_raw(node: &Expr, ctx: &FoldContext<'_>) -> Result<Resolution, FoldError> {
    Resolver::new(ctx).resolve(node)
}

fn contains_nan(value: &Value) -> bool {
    match value {
        Value::Float(f) => f.is_nan(),
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
            items.iter().any(contains_nan)
        }
        Value::Map(entries) => entries.iter().any(|(k, v)| {
            contains_nan(k) || v.as_literal().is_some_and(contains_nan)
        }),
        _ => false,
    }
}

/// Literal numeric operand equal to `target` under Python equality
/// (`0 == 0.0 == False`).
fn is_number(value: &Value, target: i64) -> bool {
    match value {
        Value::Bool(b) => i64::from(*b) == target,
        Value::Int(i) => *i == target,
        Value::Float(f) => *f == target as f64,
        _ => false,
    }
}

/// Truthiness as recognised by `and`/`or` collapsing: booleans and integers.
fn literal_truth(resolution: &Resolution) -> Option<bool> {
    match resolution {
        Resolution::Literal(Value::Bool(b)) => Some(*b),
        Resolution::Literal(Value::Int(i)) => Some(*i != 0),
        _ => None,
    }
}

impl Resolver<'_, '_> {
    pub(crate) fn resolve(&self, node: &Expr) -> Result<Resolution, FoldError> {
        self.descend(|| {
            trace!(depth = self.depth(), node = %node, "resolving");
            self.resolve_inner(node)
        })
    }

    fn resolve_inner(&self, node: &Expr) -> Result<Resolution, FoldError> {
        match node {
            Expr::Name(_) | Expr::Attribute { .. } | Expr::Constant(_) => self.resolve_name(node),
            Expr::Num(number) => Ok(Resolution::Literal(match number {
                Number::Int(i) => Value::Int(*i),
                Number::Float(f) => Value::Float(*f),
            })),
            Expr::Str(s) => Ok(Resolution::Literal(Value::Str(s.clone()))),
            Expr::Index(inner) => self.resolve(inner),
            Expr::Slice { .. } => Err(FoldError::UnsupportedConstruct { construct: "Slice" }),
            Expr::List(items) => self.resolve_sequence(node, items, Value::List),
            Expr::Tuple(items) => self.resolve_sequence(node, items, Value::Tuple),
            Expr::Set(items) => self.resolve_set(node, items),
            Expr::Dict(entries) => self.resolve_dict(node, entries),
            Expr::Subscript { value, slice } => self.resolve_subscript(node, value, slice),
            Expr::UnaryOp { op, operand } => self.resolve_unary(node, *op, operand),
            Expr::BinOp { left, op, right } => self.resolve_binary(node, left, *op, right),
            Expr::BoolOp { op, values } => self.resolve_boolop(*op, values),
            Expr::Compare {
                left,
                ops,
                comparators,
            } => self.resolve_compare(node, left, ops, comparators),
            Expr::Call {
                func,
                args,
                keywords,
            } => self.resolve_call(node, func, args, keywords),
            Expr::Starred(_) | Expr::IfExp { .. } | Expr::Lambda { .. } => {
                Ok(Resolution::Residual(node.clone()))
            }
        }
    }

    fn unresolved(&self, node: &Expr) -> Result<Resolution, FoldError> {
        Ok(Resolution::Residual(node.clone()))
    }

    /// A value computed by an operation or call. NaN has no node form, so
    /// such results are left unfolded.
    fn computed(&self, node: &Expr, value: Value) -> Result<Resolution, FoldError> {
        if contains_nan(&value) {
            debug!(node = %node, "result is not a number, leaving unfolded");
            return self.unresolved(node);
        }
        Ok(Resolution::Literal(value))
    }

    /// Node form of an operand: the folded form when it has one, the source
    /// expression otherwise.
    fn best_effort_node(&self, folded: &Resolution, source: &Expr) -> Result<Expr, FoldError> {
        match to_node(folded) {
            Ok(expr) => Ok(expr),
            Err(FoldError::NotWrappable { .. }) => Ok(source.clone()),
            Err(e) => Err(e),
        }
    }

    fn resolve_name(&self, node: &Expr) -> Result<Resolution, FoldError> {
        let found = resolve_name_or_attribute(node, self.ctx.scopes());
        match &found {
            Resolution::Residual(bound) if bound != node && !bound.is_name_like() => {
                let refined = self.resolve(bound)?;
                if is_wrappable(&refined) {
                    debug!(bound = %bound, "binding folds to a more specific form");
                    Ok(refined)
                } else {
                    debug!(bound = %bound, "binding folds to a value without literal form");
                    Ok(found)
                }
            }
            _ => Ok(found),
        }
    }

    /// Fold every item, or `None` if any of them stays residual.
    fn resolve_values(&self, items: &[Expr]) -> Result<Option<Vec<Value>>, FoldError> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            match self.resolve(item)? {
                Resolution::Literal(value) => values.push(value),
                Resolution::Residual(_) => return Ok(None),
            }
        }
        Ok(Some(values))
    }

    fn resolve_sequence(
        &self,
        node: &Expr,
        items: &[Expr],
        build: fn(Vec<Value>) -> Value,
    ) -> Result<Resolution, FoldError> {
        match self.resolve_values(items)? {
            Some(values) => Ok(Resolution::Literal(build(values))),
            None => self.unresolved(node),
        }
    }

    fn resolve_set(&self, node: &Expr, items: &[Expr]) -> Result<Resolution, FoldError> {
        let Some(values) = self.resolve_values(items)? else {
            return self.unresolved(node);
        };
        match build_set(values) {
            Ok(set) => Ok(Resolution::Literal(Value::Set(set))),
            Err(failure) => {
                debug!(node = %node, %failure, "set elements are not hashable");
                self.unresolved(node)
            }
        }
    }

    fn resolve_dict(&self, node: &Expr, entries: &[(Expr, Expr)]) -> Result<Resolution, FoldError> {
        let mut map = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let key = match self.resolve(key)? {
                Resolution::Literal(key) => key,
                Resolution::Residual(_) => {
                    debug!(key = %key, "mapping key does not fold");
                    return self.unresolved(node);
                }
            };
            // Only a folded node of literal or container shape replaces the
            // source. A literal written directly is already its folded form.
            let value = match self.resolve(value)? {
                Resolution::Literal(v) if value.is_primitive_literal() => Resolution::Literal(v),
                Resolution::Residual(e) if e.is_primitive_literal() || e.is_container() => {
                    Resolution::Residual(e)
                }
                _ => Resolution::Residual(value.clone()),
            };
            if let Err(failure) = map_insert(&mut map, key, value) {
                debug!(node = %node, %failure, "mapping key is not hashable");
                return self.unresolved(node);
            }
        }
        Ok(Resolution::Literal(Value::Map(map)))
    }

    fn resolve_subscript(
        &self,
        node: &Expr,
        value: &Expr,
        slice: &Expr,
    ) -> Result<Resolution, FoldError> {
        let Some(container) = self.indexable(value)? else {
            debug!(container = %value, "subscript target is not a known indexable");
            return self.unresolved(node);
        };
        let index = match self.resolve(slice) {
            Ok(Resolution::Literal(index)) => index,
            Ok(Resolution::Residual(_)) => {
                debug!(index = %slice, "subscript index does not fold");
                return self.unresolved(node);
            }
            Err(FoldError::UnsupportedConstruct { construct }) => {
                debug!(construct, "subscript index is not supported");
                return self.unresolved(node);
            }
            Err(e) => return Err(e),
        };
        let item = match self.lookup(&container, &index)? {
            Ok(item) => item,
            Err(failure) => {
                debug!(node = %node, %failure, "subscript lookup failed");
                return self.unresolved(node);
            }
        };
        let folded = match &item {
            Resolution::Residual(expr) => self.resolve(expr)?,
            Resolution::Literal(_) => item.clone(),
        };
        match folded {
            Resolution::Literal(value) if value.is_primitive() => Ok(Resolution::Literal(value)),
            _ => Ok(item),
        }
    }

    fn resolve_unary(&self, node: &Expr, op: UnaryOp, operand: &Expr) -> Result<Resolution, FoldError> {
        let Resolution::Literal(value) = self.resolve(operand)? else {
            return self.unresolved(node);
        };
        match apply_unary(op, &value) {
            Ok(result) => self.computed(node, result),
            Err(failure) => {
                warn!(node = %node, %failure, "unary operation would fail at runtime");
                self.unresolved(node)
            }
        }
    }

    fn resolve_binary(
        &self,
        node: &Expr,
        left: &Expr,
        op: BinaryOp,
        right: &Expr,
    ) -> Result<Resolution, FoldError> {
        let folded_left = self.resolve(left)?;
        let folded_right = self.resolve(right)?;

        match (&folded_left, &folded_right) {
            (Resolution::Literal(a), Resolution::Literal(b)) => {
                return match apply_binary(op, a, b) {
                    Ok(result) => self.computed(node, result),
                    Err(failure) => {
                        warn!(node = %node, %failure, "binary operation would fail at runtime");
                        self.unresolved(node)
                    }
                };
            }
            (Resolution::Literal(a), Resolution::Residual(other)) => {
                if let Some(simplified) = simplify_literal_left(op, a, other) {
                    return Ok(simplified);
                }
            }
            (Resolution::Residual(other), Resolution::Literal(b)) => {
                if let Some(simplified) = simplify_literal_right(op, other, b) {
                    return Ok(simplified);
                }
            }
            (Resolution::Residual(_), Resolution::Residual(_)) => {}
        }

        Ok(Resolution::Residual(Expr::binary(
            self.best_effort_node(&folded_left, left)?,
            op,
            self.best_effort_node(&folded_right, right)?,
        )))
    }

    fn resolve_boolop(&self, op: BoolOp, values: &[Expr]) -> Result<Resolution, FoldError> {
        // `or` stops at the first true operand, `and` at the first false one.
        let stop_on = op == BoolOp::Or;
        let mut survivors: Vec<(Resolution, &Expr)> = Vec::new();

        for source in values {
            let folded = self.resolve(source)?;
            match literal_truth(&folded) {
                Some(truth) if truth == stop_on => {
                    return Ok(Resolution::Literal(Value::Bool(stop_on)));
                }
                Some(_) => continue,
                None => {}
            }
            let duplicate = match &folded {
                Resolution::Residual(Expr::Name(id)) => survivors.iter().any(|(s, _)| {
                    matches!(s, Resolution::Residual(Expr::Name(seen)) if seen == id)
                }),
                _ => false,
            };
            if !duplicate {
                survivors.push((folded, source));
            }
        }

        match survivors.len() {
            0 => Ok(Resolution::Literal(Value::Bool(!stop_on))),
            1 => Ok(survivors.remove(0).0),
            _ => {
                let values = survivors
                    .iter()
                    .map(|(folded, source)| self.best_effort_node(folded, source))
                    .collect::<Result<_, _>>()?;
                Ok(Resolution::Residual(Expr::BoolOp { op, values }))
            }
        }
    }

    fn resolve_compare(
        &self,
        node: &Expr,
        left: &Expr,
        ops: &[CmpOp],
        comparators: &[Expr],
    ) -> Result<Resolution, FoldError> {
        let mut operands = Vec::with_capacity(comparators.len() + 1);
        for operand in core::iter::once(left).chain(comparators) {
            match self.resolve(operand)? {
                Resolution::Literal(value) => operands.push(value),
                Resolution::Residual(_) => return self.unresolved(node),
            }
        }
        for (op, pair) in ops.iter().zip(operands.windows(2)) {
            match apply_comparison(*op, &pair[0], &pair[1]) {
                Ok(true) => {}
                Ok(false) => return Ok(Resolution::Literal(Value::Bool(false))),
                Err(failure) => {
                    warn!(node = %node, %failure, "comparison would fail at runtime");
                    return self.unresolved(node);
                }
            }
        }
        Ok(Resolution::Literal(Value::Bool(true)))
    }

    fn resolve_call(
        &self,
        node: &Expr,
        func: &Expr,
        args: &[Expr],
        keywords: &[Keyword],
    ) -> Result<Resolution, FoldError> {
        let Resolution::Literal(Value::Function(function)) = self.resolve(func)? else {
            debug!(callee = %func, "callee does not resolve to a function");
            return self.unresolved(node);
        };
        if !self.ctx.pure_functions().is_pure(&function) {
            info!(function = function.name(), "function is not known to be pure, not folding");
            return self.unresolved(node);
        }

        let Some(positional) = self.resolve_arguments(args)? else {
            debug!(node = %node, "call arguments do not fold");
            return self.unresolved(node);
        };
        let Some(named) = self.resolve_keywords(keywords)? else {
            debug!(node = %node, "call keyword arguments do not fold");
            return self.unresolved(node);
        };

        match function.call(&positional, &named) {
            Ok(result) => self.computed(node, result),
            Err(failure) => {
                debug!(function = function.name(), %failure, "pure function call failed");
                self.unresolved(node)
            }
        }
    }

    fn resolve_arguments(&self, args: &[Expr]) -> Result<Option<Vec<Value>>, FoldError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let (expr, unpack) = match arg {
                Expr::Starred(inner) => (inner.as_ref(), true),
                other => (other, false),
            };
            let Resolution::Literal(value) = self.resolve(expr)? else {
                return Ok(None);
            };
            if !unpack {
                values.push(value);
                continue;
            }
            match value {
                Value::List(items) | Value::Tuple(items) | Value::Set(items) => values.extend(items),
                Value::Str(s) => values.extend(s.chars().map(|c| Value::Str(c.to_string()))),
                Value::Map(entries) => values.extend(entries.into_iter().map(|(k, _)| k)),
                _ => return Ok(None),
            }
        }
        Ok(Some(values))
    }

    fn resolve_keywords(
        &self,
        keywords: &[Keyword],
    ) -> Result<Option<Vec<(String, Value)>>, FoldError> {
        let mut named: Vec<(String, Value)> = Vec::with_capacity(keywords.len());
        let mut push = |name: String, value: Value| {
            if named.iter().any(|(n, _)| *n == name) {
                return false;
            }
            named.push((name, value));
            true
        };
        for keyword in keywords {
            let Resolution::Literal(value) = self.resolve(&keyword.value)? else {
                return Ok(None);
            };
            match (&keyword.arg, value) {
                (Some(name), value) => {
                    if !push(name.clone(), value) {
                        return Ok(None);
                    }
                }
                (None, Value::Map(entries)) => {
                    for (key, value) in entries {
                        let Value::Str(name) = key else {
                            return Ok(None);
                        };
                        let value = match value {
                            Resolution::Literal(value) => value,
                            Resolution::Residual(expr) => match self.resolve(&expr)? {
                                Resolution::Literal(value) => value,
                                Resolution::Residual(_) => return Ok(None),
                            },
                        };
                        if !push(name, value) {
                            return Ok(None);
                        }
                    }
                }
                (None, _) => return Ok(None),
            }
        }
        Ok(Some(named))
    }
}

/// Shortcuts for `literal <op> x`.
fn simplify_literal_left(op: BinaryOp, literal: &Value, other: &Expr) -> Option<Resolution> {
    let residual = |expr: Expr| Some(Resolution::Residual(expr));
    match op {
        BinaryOp::Add if is_number(literal, 0) => residual(other.clone()),
        BinaryOp::Mult => simplify_product(literal, other),
        BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Pow | BinaryOp::Mod
            if is_number(literal, 0) =>
        {
            Some(Resolution::Literal(Value::Int(0)))
        }
        BinaryOp::Sub if is_number(literal, 0) => {
            residual(Expr::unary(UnaryOp::USub, other.clone()))
        }
        _ => None,
    }
}

/// Shortcuts for `x <op> literal`.
fn simplify_literal_right(op: BinaryOp, other: &Expr, literal: &Value) -> Option<Resolution> {
    match op {
        BinaryOp::Add | BinaryOp::Sub if is_number(literal, 0) => {
            Some(Resolution::Residual(other.clone()))
        }
        BinaryOp::Mult => simplify_product(literal, other),
        BinaryOp::Div | BinaryOp::Pow if is_number(literal, 1) => {
            Some(Resolution::Residual(other.clone()))
        }
        _ => None,
    }
}

fn simplify_product(literal: &Value, other: &Expr) -> Option<Resolution> {
    if is_number(literal, 0) {
        Some(Resolution::Literal(Value::Int(0)))
    } else if is_number(literal, 1) {
        Some(Resolution::Residual(other.clone()))
    } else if is_number(literal, -1) {
        Some(Resolution::Residual(Expr::unary(UnaryOp::USub, other.clone())))
    } else {
        None
    }
}
