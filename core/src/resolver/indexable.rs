//! Resolution of subscript targets.
//!
//! A subscript can often be folded even when its target cannot: `[x, 2][1]`
//! is `2` regardless of `x`. The indexable resolver therefore works on
//! element nodes rather than on fully folded values.

use tracing::debug;

use super::operators::py_eq;
use super::{EvaluationFailure, FoldContext, FoldError, Resolver};
use crate::syntax::{BinaryOp, Expr};
use crate::values::{Resolution, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    List,
    Tuple,
}

/// Something that can be indexed, with elements that may still be nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Indexable {
    Sequence {
        kind: SequenceKind,
        items: Vec<Resolution>,
    },
    /// Entries in source order; later duplicates override earlier ones.
    Mapping(Vec<(Resolution, Resolution)>),
    Str(String),
}

impl Indexable {
    /// Convert a folded value, if it is indexable.
    pub fn from_value(value: Value) -> Option<Self> {
        let literals = |items: Vec<Value>| -> Vec<Resolution> {
            items.into_iter().map(Resolution::Literal).collect()
        };
        match value {
            Value::List(items) => Some(Indexable::Sequence {
                kind: SequenceKind::List,
                items: literals(items),
            }),
            Value::Tuple(items) => Some(Indexable::Sequence {
                kind: SequenceKind::Tuple,
                items: literals(items),
            }),
            Value::Map(entries) => Some(Indexable::Mapping(
                entries
                    .into_iter()
                    .map(|(k, v)| (Resolution::Literal(k), v))
                    .collect(),
            )),
            Value::Str(s) => Some(Indexable::Str(s)),
            _ => None,
        }
    }

    fn concat(self, other: Indexable) -> Option<Self> {
        match (self, other) {
            (
                Indexable::Sequence { kind, mut items },
                Indexable::Sequence {
                    kind: other_kind,
                    items: rest,
                },
            ) if kind == other_kind => {
                items.extend(rest);
                Some(Indexable::Sequence { kind, items })
            }
            (Indexable::Str(a), Indexable::Str(b)) => Some(Indexable::Str(a + &b)),
            _ => None,
        }
    }
}

/// Resolve `node` to something that can be indexed, or `None`.
pub fn resolve_indexable(node: &Expr, ctx: &FoldContext<'_>) -> Result<Option<Indexable>, FoldError> {
    Resolver::new(ctx).indexable(node)
}

/// Normalize a possibly negative index against `len`.
fn sequence_position(index: &Value, len: usize) -> Result<usize, EvaluationFailure> {
    let Some(i) = index.as_int() else {
        return Err(EvaluationFailure::type_mismatch(
            "indexing",
            format!("indices must be integers, not {}", index.type_name()),
        ));
    };
    let position = if i < 0 { i + len as i64 } else { i };
    if position < 0 || position >= len as i64 {
        return Err(EvaluationFailure::IndexOutOfRange { index: i, len });
    }
    Ok(position as usize)
}

impl Resolver<'_, '_> {
    pub(crate) fn indexable(&self, node: &Expr) -> Result<Option<Indexable>, FoldError> {
        self.descend(|| self.indexable_inner(node))
    }

    fn indexable_inner(&self, node: &Expr) -> Result<Option<Indexable>, FoldError> {
        let residuals = |items: &[Expr]| -> Vec<Resolution> {
            items.iter().cloned().map(Resolution::Residual).collect()
        };
        match node {
            Expr::Name(_) | Expr::Attribute { .. } | Expr::Constant(_) => {
                match super::resolve_name_or_attribute(node, self.ctx.scopes()) {
                    Resolution::Literal(value) => Ok(Indexable::from_value(value)),
                    Resolution::Residual(bound) if bound != *node => self.indexable(&bound),
                    Resolution::Residual(_) => Ok(None),
                }
            }
            Expr::List(items) => Ok(Some(Indexable::Sequence {
                kind: SequenceKind::List,
                items: residuals(items),
            })),
            Expr::Tuple(items) => Ok(Some(Indexable::Sequence {
                kind: SequenceKind::Tuple,
                items: residuals(items),
            })),
            Expr::Dict(entries) => Ok(Some(Indexable::Mapping(
                entries
                    .iter()
                    .map(|(k, v)| {
                        (
                            Resolution::Residual(k.clone()),
                            Resolution::Residual(v.clone()),
                        )
                    })
                    .collect(),
            ))),
            Expr::Subscript { value, slice } => {
                let Some(container) = self.indexable(value)? else {
                    return Ok(None);
                };
                let index = match self.resolve(slice) {
                    Ok(Resolution::Literal(index)) => index,
                    Ok(Resolution::Residual(_)) | Err(FoldError::UnsupportedConstruct { .. }) => {
                        return Ok(None);
                    }
                    Err(e) => return Err(e),
                };
                match self.lookup(&container, &index)? {
                    Ok(Resolution::Literal(item)) => Ok(Indexable::from_value(item)),
                    Ok(Resolution::Residual(item)) => self.indexable(&item),
                    Err(_) => Ok(None),
                }
            }
            Expr::BinOp {
                left,
                op: BinaryOp::Add,
                right,
            } => {
                if let (Some(a), Some(b)) = (self.indexable(left)?, self.indexable(right)?) {
                    if let Some(joined) = a.concat(b) {
                        return Ok(Some(joined));
                    }
                }
                self.indexable_by_folding(node)
            }
            Expr::Call { func, args, keywords } => {
                if args.is_empty() && keywords.iter().all(|k| k.arg.is_some()) {
                    if let Resolution::Literal(Value::Function(f)) = self.resolve(func)? {
                        if f.name() == "dict" && self.ctx.pure_functions().is_pure(&f) {
                            return Ok(Some(Indexable::Mapping(
                                keywords
                                    .iter()
                                    .filter_map(|k| {
                                        let name = k.arg.clone()?;
                                        Some((
                                            Resolution::Literal(Value::Str(name)),
                                            Resolution::Residual(k.value.clone()),
                                        ))
                                    })
                                    .collect(),
                            )));
                        }
                    }
                }
                self.indexable_by_folding(node)
            }
            _ => self.indexable_by_folding(node),
        }
    }

    fn indexable_by_folding(&self, node: &Expr) -> Result<Option<Indexable>, FoldError> {
        match self.resolve(node) {
            Ok(Resolution::Literal(value)) => Ok(Indexable::from_value(value)),
            Ok(Resolution::Residual(_)) | Err(FoldError::UnsupportedConstruct { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Look up `index` in `container`.
    ///
    /// Mapping keys that are still nodes are folded first; if any key does
    /// not fold, the lookup cannot be decided and fails.
    pub(crate) fn lookup(
        &self,
        container: &Indexable,
        index: &Value,
    ) -> Result<Result<Resolution, EvaluationFailure>, FoldError> {
        match container {
            Indexable::Sequence { items, .. } => {
                Ok(sequence_position(index, items.len()).map(|i| items[i].clone()))
            }
            Indexable::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                Ok(sequence_position(index, chars.len())
                    .map(|i| Resolution::Literal(Value::Str(chars[i].to_string()))))
            }
            Indexable::Mapping(entries) => {
                if !index.is_hashable() {
                    return Ok(Err(EvaluationFailure::Unhashable {
                        type_name: index.type_name(),
                    }));
                }
                let mut found = None;
                for (key, value) in entries {
                    let key = match key {
                        Resolution::Literal(key) => key.clone(),
                        Resolution::Residual(node) => match self.resolve(node)? {
                            Resolution::Literal(key) => key,
                            Resolution::Residual(_) => {
                                debug!(key = %node, "mapping key does not fold");
                                return Ok(Err(EvaluationFailure::KeyMissing {
                                    key: index.to_string(),
                                }));
                            }
                        },
                    };
                    if py_eq(&key, index) {
                        found = Some(value);
                    }
                }
                Ok(found.cloned().ok_or_else(|| EvaluationFailure::KeyMissing {
                    key: index.to_string(),
                }))
            }
        }
    }
}
