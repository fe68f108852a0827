use std::sync::Arc;
use std::fmt;

use hashbrown::HashMap;

use super::Resolution;

/// A named bag of members reachable through attribute access (`math.pi`).
///
/// Like functions, namespaces compare by identity.
#[derive(Clone)]
pub struct Namespace(Arc<NamespaceData>);

struct NamespaceData {
    name: String,
    members: HashMap<String, Resolution>,
}

impl Namespace {
    pub fn new<K: Into<String>>(
        name: impl Into<String>,
        members: impl IntoIterator<Item = (K, Resolution)>,
    ) -> Self {
        Self(Arc::new(NamespaceData {
            name: name.into(),
            members: members.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn member(&self, attr: &str) -> Option<&Resolution> {
        self.0.members.get(attr)
    }

    pub fn len(&self) -> usize {
        self.0.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.members.is_empty()
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({}, {} members)", self.name(), self.len())
    }
}
