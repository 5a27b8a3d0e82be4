//! Runtime application context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use atrium_core::traits::{AppContext, HandlerContext};
use serde_json::Value;

use super::cache::AppCache;

/// View of a booted application handed to extension install hooks and
/// module entry points, and forwarded opaquely to module routers.
///
/// Configuration lookups read the raw config JSON the application
/// memoized in its cache at boot, so the view stays immutable without
/// holding its own copy.
pub struct ApplicationContext {
    name: Option<String>,
    dir: PathBuf,
    mode: String,
    cache: Arc<AppCache>,
}

impl ApplicationContext {
    pub(crate) fn new(
        name: Option<String>,
        dir: PathBuf,
        mode: String,
        cache: Arc<AppCache>,
    ) -> Self {
        Self {
            name,
            dir,
            mode,
            cache,
        }
    }

    /// The application's cache.
    pub fn cache(&self) -> &Arc<AppCache> {
        &self.cache
    }
}

impl AppContext for ApplicationContext {
    fn app_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn app_dir(&self) -> &Path {
        &self.dir
    }

    fn mode(&self) -> &str {
        &self.mode
    }

    fn config_value(&self, key: &str) -> Option<Value> {
        self.cache
            .get("config")
            .and_then(|config| config.get(key).cloned())
    }

    fn cache_get(&self, key: &str) -> Option<Value> {
        self.cache.get(key)
    }

    fn cache_put(&self, key: &str, value: Value) {
        self.cache.add(key, value);
    }
}

impl HandlerContext for ApplicationContext {}
