//! Scope stack for name bindings.
//!
//! The folder resolves names against a `ScopeStack<Resolution>`, searched
//! from innermost (last pushed) to outermost. Two kinds of scopes share the
//! `Scope` trait:
//! - **Complete scopes**: immutable, pre-populated and sorted (builtins,
//!   caller-provided bindings).
//! - **Mutable scopes**: filled incrementally before folding starts.
//!
//! A stack is never modified while a fold is running, so one stack can be
//! shared by folds on several threads.

use hashbrown::HashMap;
use thiserror::Error;

/// Trait for scopes that can be pushed onto the ScopeStack.
pub trait Scope<T> {
    /// Look up a name in this scope.
    fn lookup(&self, name: &str) -> Option<&T>;

    /// Bind a value to a name in this scope.
    ///
    /// Complete scopes return `BindError::ScopeIsImmutable`.
    fn bind(&mut self, name: &str, value: T) -> Result<(), BindError>;
}

/// Borrowed scopes are read-only views.
impl<T, S: Scope<T> + ?Sized> Scope<T> for &S {
    fn lookup(&self, name: &str) -> Option<&T> {
        (**self).lookup(name)
    }

    fn bind(&mut self, _name: &str, _value: T) -> Result<(), BindError> {
        Err(BindError::ScopeIsImmutable)
    }
}

/// A complete, immutable scope.
///
/// Bindings are sorted by name for binary search.
#[derive(Debug, Clone)]
pub struct CompleteScope<T>(Vec<(String, T)>);

impl<T> CompleteScope<T> {
    /// Create a complete scope from bindings in any order.
    ///
    /// Returns an error if a name appears twice.
    pub fn new<K: Into<String>>(
        bindings: impl IntoIterator<Item = (K, T)>,
    ) -> Result<Self, DuplicateError> {
        let mut bindings: Vec<(String, T)> =
            bindings.into_iter().map(|(k, v)| (k.into(), v)).collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));

        for window in bindings.windows(2) {
            if window[0].0 == window[1].0 {
                return Err(DuplicateError(window[0].0.clone()));
            }
        }
        Ok(Self(bindings))
    }

    /// Create a complete scope from bindings already sorted by name.
    pub fn from_sorted(bindings: Vec<(String, T)>) -> Self {
        debug_assert!(is_sorted(&bindings), "Bindings must be sorted by name");
        Self(bindings)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Scope<T> for CompleteScope<T> {
    fn lookup(&self, name: &str) -> Option<&T> {
        self.0
            .binary_search_by(|(n, _)| n.as_str().cmp(name))
            .ok()
            .map(|idx| &self.0[idx].1)
    }

    fn bind(&mut self, _name: &str, _value: T) -> Result<(), BindError> {
        Err(BindError::ScopeIsImmutable)
    }
}

/// A mutable scope, filled one binding at a time.
#[derive(Debug, Clone)]
pub struct MutableScope<T>(HashMap<String, T>);

impl<T> MutableScope<T> {
    pub fn new() -> Self {
        Self(HashMap::new())
    }
}

impl<T> Default for MutableScope<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scope<T> for MutableScope<T> {
    fn lookup(&self, name: &str) -> Option<&T> {
        self.0.get(name)
    }

    fn bind(&mut self, name: &str, value: T) -> Result<(), BindError> {
        if self.0.contains_key(name) {
            return Err(BindError::AlreadyBound(name.to_string()));
        }
        self.0.insert(name.to_string(), value);
        Ok(())
    }
}

/// A stack of scopes for name lookup.
///
/// Scopes are boxed trait objects; `'a` bounds any borrowed scope pushed onto
/// the stack.
pub struct ScopeStack<'a, T> {
    scopes: Vec<Box<dyn Scope<T> + Send + Sync + 'a>>,
}

impl<'a, T> ScopeStack<'a, T> {
    /// Create a new empty scope stack.
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Push a scope onto the stack.
    pub fn push<S: Scope<T> + Send + Sync + 'a>(&mut self, scope: S) {
        self.scopes.push(Box::new(scope));
    }

    /// Pop the topmost scope from the stack.
    pub fn pop(&mut self) -> Result<(), PopError> {
        self.scopes.pop().ok_or(PopError::EmptyStack)?;
        Ok(())
    }

    /// Look up a name, searching scopes from innermost to outermost.
    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.scopes.iter().rev().find_map(|scope| scope.lookup(name))
    }

    /// Bind a value in the topmost scope.
    pub fn bind_in_current(&mut self, name: &str, value: T) -> Result<(), BindError> {
        self.scopes
            .last_mut()
            .ok_or(BindError::NoScope)?
            .bind(name, value)
    }

    /// Number of scopes on the stack.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl<T> Default for ScopeStack<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if bindings are sorted by name (for debug assertions).
fn is_sorted<T>(slice: &[(String, T)]) -> bool {
    slice.windows(2).all(|w| w[0].0 <= w[1].0)
}

/// Error when trying to bind a value in a scope.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error("No scope to bind in")]
    NoScope,
    #[error("Cannot bind in immutable scope")]
    ScopeIsImmutable,
    #[error("Name '{0}' already bound in current scope")]
    AlreadyBound(String),
}

/// Error when trying to pop a scope.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PopError {
    #[error("Cannot pop from empty scope stack")]
    EmptyStack,
}

/// Error when duplicate names are found in a scope.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Duplicate name '{0}' in scope")]
pub struct DuplicateError(pub String);
