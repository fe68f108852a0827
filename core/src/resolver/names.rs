use crate::scope_stack::ScopeStack;
use crate::syntax::{Constant, Expr};
use crate::values::{Resolution, Value};

/// Resolve a `Name`, `Attribute` or `Constant` node against the scope stack.
///
/// Unbound names, attributes of anything but a namespace, and nodes of any
/// other kind come back as `Residual(node)`. The scopes are only read.
pub fn resolve_name_or_attribute(node: &Expr, scopes: &ScopeStack<'_, Resolution>) -> Resolution {
    let unresolved = || Resolution::Residual(node.clone());
    match node {
        Expr::Name(id) => scopes.lookup(id).cloned().unwrap_or_else(unresolved),
        Expr::Constant(Constant::None) => Resolution::Literal(Value::None),
        Expr::Constant(Constant::Bool(b)) => Resolution::Literal(Value::Bool(*b)),
        Expr::Attribute { value, attr } if value.is_name_like() => {
            match resolve_name_or_attribute(value, scopes) {
                Resolution::Literal(Value::Namespace(ns)) => {
                    ns.member(attr).cloned().unwrap_or_else(unresolved)
                }
                _ => unresolved(),
            }
        }
        _ => unresolved(),
    }
}
