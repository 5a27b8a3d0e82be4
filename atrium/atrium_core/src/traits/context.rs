//! Application and handler context contracts.

use std::path::Path;

use serde_json::Value;

/// Read-mostly view of a booted application, handed to extension install
/// hooks and module entry points.
///
/// The configuration exposed here is resolved once during boot and is
/// immutable afterward; the cache accessors reach the application's
/// append-only keyed cache.
pub trait AppContext: Send + Sync {
    /// Declared application name; `None` for the root application.
    fn app_name(&self) -> Option<&str>;

    /// Absolute application directory.
    fn app_dir(&self) -> &Path;

    /// Mode tag the application was booted with.
    fn mode(&self) -> &str;

    /// Top-level value of the resolved configuration under `key`.
    fn config_value(&self, key: &str) -> Option<Value>;

    /// Value stored in the application cache under `key`.
    fn cache_get(&self, key: &str) -> Option<Value>;

    /// Store `value` in the application cache. Existing keys keep their
    /// first value.
    fn cache_put(&self, key: &str, value: Value);
}

/// Opaque per-dispatch context forwarded unmodified through module
/// routers. Its contents are owned by the routing layer, not by the
/// orchestration core.
pub trait HandlerContext: Send + Sync {}
