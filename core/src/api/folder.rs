//! One-stop parse and fold.

use tracing::debug;

use super::{EnvironmentBuilder, Error, FoldOptions};
use crate::registry::PureFunctionRegistry;
use crate::resolver::{FoldContext, FoldError, resolve_literal, resolve_literal_raw};
use crate::scope_stack::{CompleteScope, ScopeStack};
use crate::stdlib::Builtins;
use crate::syntax::{self, Expr};
use crate::values::Resolution;

/// Folds expressions against the builtins plus a fixed set of globals.
///
/// A `Folder` is immutable once built, so it can be shared across threads
/// and used for any number of folds.
///
/// Scopes are searched innermost first: per-call parameters, then globals,
/// then builtins.
///
/// # Example
///
/// ```
/// use litfold_core::api::{Folder, FoldOptions};
/// use litfold_core::values::{Resolution, Value};
///
/// let folder = Folder::new(FoldOptions::default(), |env| {
///     env.register("base", Value::Int(40));
/// })
/// .unwrap();
///
/// let folded = folder.fold_with("base + offset", &[("offset", Value::Int(2).into())]);
/// assert_eq!(folded.unwrap().to_string(), "42");
///
/// let raw = folder.fold_raw("[base, x]").unwrap();
/// assert!(matches!(raw, Resolution::Residual(_)));
/// ```
pub struct Folder {
    builtins: CompleteScope<Resolution>,
    globals: CompleteScope<Resolution>,
    registry: PureFunctionRegistry,
    options: FoldOptions,
}

impl Folder {
    /// Create a folder with the builtins and the globals registered by `init`.
    ///
    /// Fails if `init` registers the same name twice.
    pub fn new(
        options: FoldOptions,
        init: impl FnOnce(&mut EnvironmentBuilder),
    ) -> Result<Self, Error> {
        let (builtins, mut registry) = Builtins::new().into_parts();

        let mut env = EnvironmentBuilder::new();
        init(&mut env);
        let (entries, pure_functions) = env.build();
        registry.extend(pure_functions);
        let globals = CompleteScope::new(entries)?;

        debug!(
            globals = globals.len(),
            pure_functions = registry.len(),
            "Folder created"
        );
        Ok(Self {
            builtins,
            globals,
            registry,
            options,
        })
    }

    pub fn options(&self) -> &FoldOptions {
        &self.options
    }

    /// Replace the options, keeping the environment.
    pub fn with_options(mut self, options: FoldOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &PureFunctionRegistry {
        &self.registry
    }

    /// Parse and fold `source`, returning the folded tree.
    pub fn fold(&self, source: &str) -> Result<Expr, Error> {
        self.fold_with(source, &[])
    }

    /// Like [`fold`](Self::fold), with extra bindings visible to this call only.
    pub fn fold_with(&self, source: &str, params: &[(&str, Resolution)]) -> Result<Expr, Error> {
        let expr = syntax::parse(source)?;
        let params = self.params_scope(params)?;
        Ok(self.with_context(params, |ctx| resolve_literal(&expr, ctx))?)
    }

    /// Parse and fold `source` without re-wrapping the result as a tree.
    pub fn fold_raw(&self, source: &str) -> Result<Resolution, Error> {
        let expr = syntax::parse(source)?;
        Ok(self.fold_expr_raw(&expr)?)
    }

    /// Fold an already-built tree.
    pub fn fold_expr(&self, expr: &Expr) -> Result<Expr, FoldError> {
        self.with_context(CompleteScope::from_sorted(Vec::new()), |ctx| {
            resolve_literal(expr, ctx)
        })
    }

    /// Fold an already-built tree without re-wrapping the result.
    pub fn fold_expr_raw(&self, expr: &Expr) -> Result<Resolution, FoldError> {
        self.with_context(CompleteScope::from_sorted(Vec::new()), |ctx| {
            resolve_literal_raw(expr, ctx)
        })
    }

    fn params_scope(
        &self,
        params: &[(&str, Resolution)],
    ) -> Result<CompleteScope<Resolution>, Error> {
        Ok(CompleteScope::new(
            params.iter().map(|(name, value)| (*name, value.clone())),
        )?)
    }

    fn with_context<T>(
        &self,
        params: CompleteScope<Resolution>,
        f: impl FnOnce(&FoldContext<'_>) -> Result<T, FoldError>,
    ) -> Result<T, FoldError> {
        let mut scopes = ScopeStack::new();
        scopes.push(&self.builtins);
        scopes.push(&self.globals);
        if !params.is_empty() {
            scopes.push(params);
        }
        let ctx = FoldContext::with_options(&scopes, &self.registry, self.options);
        f(&ctx)
    }
}
