//! Extension resolvers.
//!
//! The registry maps descriptors to loaded extensions through the
//! `ExtensionResolver` capability; these are the shipped implementations.
//! `PackageResolver` serves `module` descriptors from a process-level
//! table of named constructors, `ManifestResolver` serves `file`
//! descriptors from declarative JSON manifests, and `DefaultResolver`
//! composes the two, dispatching on the descriptor's source field.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use atrium_core::error::{ExtensionError, Result};
use atrium_core::traits::{AppContext, Extension, ExtensionResolver};
use atrium_core::types::ExtensionDescriptor;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tracing::debug;

/// Constructor for a named extension package.
pub type ExtensionConstructor = Arc<dyn Fn() -> Arc<dyn Extension> + Send + Sync>;

/// Resolves `module` descriptors against a table of registered packages.
pub struct PackageResolver {
    packages: RwLock<HashMap<String, ExtensionConstructor>>,
}

impl PackageResolver {
    /// Create an empty package table.
    pub fn new() -> Self {
        Self {
            packages: RwLock::new(HashMap::new()),
        }
    }

    /// Register a package constructor under `name`. A repeated name
    /// replaces the previous constructor.
    pub fn register_package(&self, name: &str, constructor: ExtensionConstructor) {
        debug!("Registering extension package: {}", name);
        self.packages
            .write()
            .insert(name.to_string(), constructor);
    }

    fn build(&self, descriptor: &ExtensionDescriptor, module: &str) -> Result<Arc<dyn Extension>> {
        let packages = self.packages.read();
        let constructor = packages.get(module).ok_or_else(|| {
            ExtensionError::ResolveFailed {
                name: descriptor.name.clone(),
                reason: format!("cannot find package '{}'", module),
            }
        })?;
        Ok(constructor())
    }
}

impl Default for PackageResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtensionResolver for PackageResolver {
    async fn resolve(&self, descriptor: &ExtensionDescriptor) -> Result<Arc<dyn Extension>> {
        let module = descriptor.module.as_deref().ok_or_else(|| {
            ExtensionError::ResolveFailed {
                name: descriptor.name.clone(),
                reason: "descriptor has no 'module' source".to_string(),
            }
        })?;
        self.build(descriptor, module)
    }
}

/// On-disk shape of a declarative extension manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionManifest {
    /// Namespace under which the extension's config appears
    #[serde(default)]
    pub config_namespace: Option<String>,

    /// The extension's configuration payload
    #[serde(default)]
    pub config: Option<Value>,
}

/// Extension loaded from a manifest file. Carries configuration only;
/// its install hook is the default no-op.
#[derive(Debug)]
pub struct ManifestExtension {
    namespace: Option<String>,
    config: Option<Value>,
}

#[async_trait]
impl Extension for ManifestExtension {
    fn config_namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn config(&self) -> Option<Value> {
        self.config.clone()
    }
}

/// Resolves `file` descriptors by reading a JSON manifest from disk.
///
/// Read and parse failures are propagated with the underlying reason
/// verbatim; the original failure is the most actionable diagnostic.
pub struct ManifestResolver;

impl ManifestResolver {
    pub fn new() -> Self {
        Self
    }

    async fn load(descriptor: &ExtensionDescriptor, path: &Path) -> Result<Arc<dyn Extension>> {
        let content =
            fs::read_to_string(path)
                .await
                .map_err(|e| ExtensionError::ResolveFailed {
                    name: descriptor.name.clone(),
                    reason: e.to_string(),
                })?;

        let manifest: ExtensionManifest =
            serde_json::from_str(&content).map_err(|e| ExtensionError::ResolveFailed {
                name: descriptor.name.clone(),
                reason: e.to_string(),
            })?;

        Ok(Arc::new(ManifestExtension {
            namespace: manifest.config_namespace,
            config: manifest.config,
        }))
    }
}

impl Default for ManifestResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtensionResolver for ManifestResolver {
    async fn resolve(&self, descriptor: &ExtensionDescriptor) -> Result<Arc<dyn Extension>> {
        let file = descriptor.file.clone().ok_or_else(|| {
            ExtensionError::ResolveFailed {
                name: descriptor.name.clone(),
                reason: "descriptor has no 'file' source".to_string(),
            }
        })?;
        Self::load(descriptor, &file).await
    }
}

/// Composite resolver dispatching on the descriptor's declared source.
pub struct DefaultResolver {
    packages: PackageResolver,
    manifests: ManifestResolver,
}

impl DefaultResolver {
    pub fn new() -> Self {
        Self {
            packages: PackageResolver::new(),
            manifests: ManifestResolver::new(),
        }
    }

    /// The underlying package table, for registering named packages.
    pub fn packages(&self) -> &PackageResolver {
        &self.packages
    }
}

impl Default for DefaultResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtensionResolver for DefaultResolver {
    async fn resolve(&self, descriptor: &ExtensionDescriptor) -> Result<Arc<dyn Extension>> {
        if descriptor.module.is_some() {
            self.packages.resolve(descriptor).await
        } else {
            self.manifests.resolve(descriptor).await
        }
    }
}

/// A no-op extension carrying only a config namespace, convenient for
/// package registration.
#[derive(Debug)]
pub struct DeclaredExtension {
    namespace: Option<String>,
    config: Option<Value>,
}

impl DeclaredExtension {
    pub fn new(namespace: Option<String>, config: Option<Value>) -> Self {
        Self { namespace, config }
    }
}

#[async_trait]
impl Extension for DeclaredExtension {
    fn config_namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn config(&self) -> Option<Value> {
        self.config.clone()
    }

    async fn install(&self, _ctx: &dyn AppContext) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn unknown_package_propagates_the_loader_reason() {
        let resolver = PackageResolver::new();
        let descriptor = ExtensionDescriptor::from_module("my-extension-1", "my-module-name-1");

        let err = resolver.resolve(&descriptor).await.unwrap_err();
        assert!(err.to_string().contains("cannot find package 'my-module-name-1'"));
    }

    #[tokio::test]
    async fn registered_package_resolves() {
        let resolver = PackageResolver::new();
        resolver.register_package(
            "my-module-name-1",
            Arc::new(|| {
                Arc::new(DeclaredExtension::new(
                    Some("my-module-config".to_string()),
                    Some(json!({"myParam": "1"})),
                ))
            }),
        );

        let descriptor = ExtensionDescriptor::from_module("my-extension-1", "my-module-name-1");
        let extension = resolver.resolve(&descriptor).await.unwrap();

        assert_eq!(extension.config_namespace(), Some("my-module-config"));
        assert_eq!(extension.config(), Some(json!({"myParam": "1"})));
    }

    #[tokio::test]
    async fn manifest_file_resolves() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"{"config_namespace": "session", "config": {"lifetime": 3600}}"#,
        )
        .unwrap();

        let resolver = ManifestResolver::new();
        let descriptor = ExtensionDescriptor::from_file("session", &path);
        let extension = resolver.resolve(&descriptor).await.unwrap();

        assert_eq!(extension.config_namespace(), Some("session"));
        assert_eq!(extension.config(), Some(json!({"lifetime": 3600})));
    }

    #[tokio::test]
    async fn missing_manifest_propagates_the_io_reason() {
        let resolver = ManifestResolver::new();
        let descriptor = ExtensionDescriptor::from_file("gone", "/nonexistent/gone.json");

        let err = resolver.resolve(&descriptor).await.unwrap_err();
        assert!(err.to_string().contains("Cannot resolve extension 'gone'"));
    }

    #[tokio::test]
    async fn default_resolver_dispatches_on_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("csrf.json");
        std::fs::write(&path, r#"{"config_namespace": "csrf"}"#).unwrap();

        let resolver = DefaultResolver::new();
        resolver.packages().register_package(
            "pkg",
            Arc::new(|| Arc::new(DeclaredExtension::new(Some("pkg".to_string()), None))),
        );

        let by_module = resolver
            .resolve(&ExtensionDescriptor::from_module("a", "pkg"))
            .await
            .unwrap();
        assert_eq!(by_module.config_namespace(), Some("pkg"));

        let by_file = resolver
            .resolve(&ExtensionDescriptor::from_file("b", &path))
            .await
            .unwrap();
        assert_eq!(by_file.config_namespace(), Some("csrf"));
    }
}
