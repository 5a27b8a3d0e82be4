//! Artifact table backing the default `ArtifactLoader`.
//!
//! Embedders register entry points, router hooks, and model factories
//! keyed by artifact path; the filesystem still drives discovery,
//! ordering, and validation, while this table supplies the executable
//! form when the mounter asks for it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use atrium_core::error::{ModuleError, Result};
use atrium_core::traits::{ArtifactLoader, ModelFactory, ModuleEntry, RouterHook};
use parking_lot::RwLock;
use tracing::debug;

/// Process-level artifact table implementing `ArtifactLoader`.
///
/// Loads are deferred lookups: nothing registered here runs until the
/// mounter invokes the loaded form. A lookup miss is an
/// `ArtifactUnavailable` error carrying the requested path.
pub struct RegistryLoader {
    entries: RwLock<HashMap<PathBuf, Arc<dyn ModuleEntry>>>,
    routers: RwLock<HashMap<PathBuf, Arc<dyn RouterHook>>>,
    models: RwLock<HashMap<PathBuf, Arc<dyn ModelFactory>>>,
}

impl RegistryLoader {
    /// Create an empty artifact table.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            routers: RwLock::new(HashMap::new()),
            models: RwLock::new(HashMap::new()),
        }
    }

    /// Register a module entry point under its artifact path.
    pub fn register_entry(&self, path: impl Into<PathBuf>, entry: Arc<dyn ModuleEntry>) {
        let path = path.into();
        debug!("Registering entry artifact: {}", path.display());
        self.entries.write().insert(path, entry);
    }

    /// Register a router hook under its artifact path.
    pub fn register_router(&self, path: impl Into<PathBuf>, router: Arc<dyn RouterHook>) {
        let path = path.into();
        debug!("Registering router artifact: {}", path.display());
        self.routers.write().insert(path, router);
    }

    /// Register a model factory under its artifact path.
    pub fn register_model(&self, path: impl Into<PathBuf>, model: Arc<dyn ModelFactory>) {
        let path = path.into();
        debug!("Registering model artifact: {}", path.display());
        self.models.write().insert(path, model);
    }
}

impl Default for RegistryLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactLoader for RegistryLoader {
    async fn load_entry(&self, path: &Path) -> Result<Arc<dyn ModuleEntry>> {
        self.entries
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| ModuleError::ArtifactUnavailable(path.to_path_buf()).into())
    }

    async fn load_router(&self, path: &Path) -> Result<Arc<dyn RouterHook>> {
        self.routers
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| ModuleError::ArtifactUnavailable(path.to_path_buf()).into())
    }

    async fn load_model(&self, path: &Path) -> Result<Arc<dyn ModelFactory>> {
        self.models
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| ModuleError::ArtifactUnavailable(path.to_path_buf()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrium_core::traits::AppContext;
    use atrium_core::error::Result as CoreResult;

    #[derive(Debug)]
    struct NoopEntry;

    #[async_trait]
    impl ModuleEntry for NoopEntry {
        async fn init(&self, _ctx: &dyn AppContext) -> CoreResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn lookup_miss_names_the_path() {
        let loader = RegistryLoader::new();
        let err = loader
            .load_entry(Path::new("/apps/blog/modules/users/index.wasm"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/apps/blog/modules/users/index.wasm"));
    }

    #[tokio::test]
    async fn registered_entry_is_returned() {
        let loader = RegistryLoader::new();
        loader.register_entry("/m/index.wasm", Arc::new(NoopEntry));
        assert!(loader.load_entry(Path::new("/m/index.wasm")).await.is_ok());
    }
}
