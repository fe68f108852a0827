//! Set of functions known to be free of side effects.
//!
//! Only functions in the registry are invoked while folding. Membership is by
//! identity: a function bound under another name is still recognised, while
//! a different function that happens to share a name is not.

use hashbrown::HashSet;

use crate::values::FunctionRef;

#[derive(Debug, Clone, Default)]
pub struct PureFunctionRegistry {
    identities: HashSet<usize>,
    // Keeps the registered functions alive so their identities stay unique.
    functions: Vec<FunctionRef>,
}

impl PureFunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function. Registering the same function twice is a no-op.
    pub fn register(&mut self, function: FunctionRef) {
        if self.identities.insert(function.identity()) {
            self.functions.push(function);
        }
    }

    pub fn is_pure(&self, function: &FunctionRef) -> bool {
        self.identities.contains(&function.identity())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionRef> {
        self.functions.iter()
    }
}

impl FromIterator<FunctionRef> for PureFunctionRegistry {
    fn from_iter<I: IntoIterator<Item = FunctionRef>>(iter: I) -> Self {
        let mut registry = Self::new();
        registry.extend(iter);
        registry
    }
}

impl Extend<FunctionRef> for PureFunctionRegistry {
    fn extend<I: IntoIterator<Item = FunctionRef>>(&mut self, iter: I) {
        for function in iter {
            self.register(function);
        }
    }
}
