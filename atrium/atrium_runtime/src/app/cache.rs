//! Append-only keyed cache owned by one application.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::warn;

/// Write-once mapping from string key to arbitrary JSON value, used to
/// memoize per-process singletons such as the resolved configuration.
///
/// A key, once set to a defined value, is immutable for the cache's
/// lifetime; overwrite attempts are surfaced as a diagnostic and perform
/// no write. There is no deletion operation.
pub struct AppCache {
    entries: Mutex<HashMap<String, Value>>,
}

impl AppCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store `value` under `key` if `value` is defined and `key` is not
    /// already present. Returns the value that remains stored under the
    /// key, which is the first value when the key was already set.
    pub fn add(&self, key: &str, value: Value) -> Value {
        let mut entries = self.entries.lock();

        if value.is_null() {
            warn!("Cannot add to cache: '{}', value is null", key);
            return Value::Null;
        }
        if let Some(existing) = entries.get(key) {
            warn!("Cannot add to cache: '{}', key is already set", key);
            return existing.clone();
        }

        entries.insert(key.to_string(), value.clone());
        value
    }

    /// The value stored under `key`, the entire mapping as one object when
    /// `key` is the wildcard `"*"`, or `None` otherwise.
    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.lock();

        if key == "*" {
            let all = entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            return Some(Value::Object(all));
        }

        entries.get(key).cloned()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stores_and_returns_values() {
        let cache = AppCache::new();
        cache.add("config", json!({"port": 3000}));
        assert_eq!(cache.get("config"), Some(json!({"port": 3000})));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn first_value_wins() {
        let cache = AppCache::new();
        cache.add("key", json!("first"));
        let retained = cache.add("key", json!("second"));
        assert_eq!(retained, json!("first"));
        assert_eq!(cache.get("key"), Some(json!("first")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn null_values_are_rejected() {
        let cache = AppCache::new();
        cache.add("key", Value::Null);
        assert_eq!(cache.get("key"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn wildcard_returns_entire_mapping() {
        let cache = AppCache::new();
        cache.add("a", json!(1));
        cache.add("b", json!(2));
        assert_eq!(cache.get("*"), Some(json!({"a": 1, "b": 2})));
    }
}
