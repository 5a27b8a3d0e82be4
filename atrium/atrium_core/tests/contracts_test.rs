//! Integration tests for the capability contracts: a fake resolver,
//! extension, and router built purely against the public API.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use atrium_core::error::{ExtensionError, Result};
use atrium_core::traits::{AppContext, Extension, ExtensionResolver, PrefixRouter, Router};
use atrium_core::types::ExtensionDescriptor;
use serde_json::{json, Value};

#[derive(Debug)]
struct HeaderExtension;

#[async_trait]
impl Extension for HeaderExtension {
    fn config_namespace(&self) -> Option<&str> {
        Some("powered-by")
    }

    fn config(&self) -> Option<Value> {
        Some(json!({"header": "X-Powered-By"}))
    }

    async fn install(&self, ctx: &dyn AppContext) -> Result<()> {
        ctx.cache_put("powered-by", json!("Atrium"));
        Ok(())
    }
}

struct StaticResolver;

#[async_trait]
impl ExtensionResolver for StaticResolver {
    async fn resolve(&self, descriptor: &ExtensionDescriptor) -> Result<Arc<dyn Extension>> {
        descriptor.validate()?;
        match descriptor.module.as_deref() {
            Some("powered-by-pkg") => Ok(Arc::new(HeaderExtension)),
            other => Err(ExtensionError::ResolveFailed {
                name: descriptor.name.clone(),
                reason: format!("cannot find package '{}'", other.unwrap_or("<file>")),
            }
            .into()),
        }
    }
}

struct MapContext {
    store: parking_lot::Mutex<std::collections::HashMap<String, Value>>,
}

impl AppContext for MapContext {
    fn app_name(&self) -> Option<&str> {
        Some("blog")
    }

    fn app_dir(&self) -> &Path {
        Path::new("/apps/blog")
    }

    fn mode(&self) -> &str {
        "test"
    }

    fn config_value(&self, _key: &str) -> Option<Value> {
        None
    }

    fn cache_get(&self, key: &str) -> Option<Value> {
        self.store.lock().get(key).cloned()
    }

    fn cache_put(&self, key: &str, value: Value) {
        self.store.lock().entry(key.to_string()).or_insert(value);
    }
}

#[tokio::test]
async fn resolved_extension_installs_through_the_context() {
    let resolver = StaticResolver;
    let descriptor = ExtensionDescriptor::from_module("powered-by", "powered-by-pkg");

    let extension = resolver.resolve(&descriptor).await.unwrap();
    assert_eq!(extension.config_namespace(), Some("powered-by"));

    let ctx = MapContext {
        store: parking_lot::Mutex::new(std::collections::HashMap::new()),
    };
    extension.install(&ctx).await.unwrap();
    assert_eq!(ctx.cache_get("powered-by"), Some(json!("Atrium")));
}

#[tokio::test]
async fn resolution_failures_carry_the_original_reason() {
    let resolver = StaticResolver;
    let descriptor = ExtensionDescriptor::from_module("ghost", "ghost-pkg");

    let err = resolver.resolve(&descriptor).await.unwrap_err();
    assert!(err.to_string().contains("cannot find package 'ghost-pkg'"));
}

#[test]
fn routers_namespace_without_collisions() {
    let root = PrefixRouter::root();
    let modules = ["m1", "m2", "m3"];

    let prefixes: Vec<String> = modules
        .iter()
        .map(|name| root.namespaced(&format!("/{}", name)).prefix().to_string())
        .collect();

    assert_eq!(prefixes, vec!["/m1", "/m2", "/m3"]);
}
