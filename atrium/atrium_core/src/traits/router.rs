//! Router capability contract.

/// Namespacing capability the module registry requires of a router.
///
/// Routing and dispatch internals live outside the orchestration core;
/// the only operation consumed here is deriving a router scoped under a
/// path prefix, which is how a flat module directory tree becomes a
/// hierarchical API surface without name collisions.
pub trait Router: Send + Sync {
    /// A new router scoped under `prefix`, relative to this router.
    fn namespaced(&self, prefix: &str) -> Box<dyn Router>;

    /// Absolute prefix this router is scoped to; empty for the root.
    fn prefix(&self) -> &str;
}

/// Minimal prefix-tracking router.
///
/// Used by headless server drivers and by tests that only need to observe
/// namespace assignment.
#[derive(Debug, Clone, Default)]
pub struct PrefixRouter {
    prefix: String,
}

impl PrefixRouter {
    /// A root router with an empty prefix.
    pub fn root() -> Self {
        Self::default()
    }

    /// A router scoped to the given absolute prefix.
    pub fn scoped(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Router for PrefixRouter {
    fn namespaced(&self, prefix: &str) -> Box<dyn Router> {
        Box::new(Self {
            prefix: format!("{}{}", self.prefix, prefix),
        })
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}
