//! Extension registry.
//!
//! Validates, resolves, and installs the cross-cutting capabilities an
//! application declares in its configuration. The lookup table is
//! append-only during boot and read-only afterward, and preserves
//! descriptor order for install-hook invocation.

use std::sync::Arc;

use anyhow::Result;
use atrium_core::error::ExtensionError;
use atrium_core::traits::{AppContext, Extension, ExtensionResolver};
use atrium_core::types::ExtensionDescriptor;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::app::config::AppConfig;

/// Registry of resolved extensions, keyed by descriptor name in
/// insertion order.
pub struct ExtensionRegistry {
    resolver: Arc<dyn ExtensionResolver>,
    entries: RwLock<Vec<(String, Arc<dyn Extension>)>>,
}

impl ExtensionRegistry {
    /// Create an empty registry backed by the given resolver.
    pub fn new(resolver: Arc<dyn ExtensionResolver>) -> Self {
        Self {
            resolver,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Resolve and register every extension the configuration declares,
    /// in descriptor order. An absent or empty list is a valid no-op.
    pub async fn initialize(&self, config: &AppConfig) -> Result<()> {
        for descriptor in &config.extensions {
            self.add(descriptor).await?;
        }
        Ok(())
    }

    /// Validate, resolve, and store one descriptor.
    ///
    /// Shape violations and duplicate names fail before any I/O and
    /// leave the registry unmodified; resolution failures propagate the
    /// underlying loader's reason verbatim.
    pub async fn add(&self, descriptor: &ExtensionDescriptor) -> Result<()> {
        descriptor.validate()?;

        {
            let entries = self.entries.read().await;
            if entries.iter().any(|(name, _)| name == &descriptor.name) {
                return Err(ExtensionError::Duplicate(descriptor.name.clone()).into());
            }
        }

        let extension = self.resolver.resolve(descriptor).await?;

        let mut entries = self.entries.write().await;
        if entries.iter().any(|(name, _)| name == &descriptor.name) {
            return Err(ExtensionError::Duplicate(descriptor.name.clone()).into());
        }
        entries.push((descriptor.name.clone(), extension));

        info!("Registered extension: {}", descriptor.name);

        Ok(())
    }

    /// Run every registered extension's install hook against the
    /// application context, in registration order. A hook failure
    /// propagates as an application boot failure.
    pub async fn install_all(&self, ctx: &dyn AppContext) -> Result<()> {
        let entries = self.entries.read().await;

        for (name, extension) in entries.iter() {
            debug!("Installing extension: {}", name);
            extension
                .install(ctx)
                .await
                .map_err(|e| ExtensionError::InstallFailed {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
        }

        Ok(())
    }

    /// The resolved extension registered under `name`.
    pub async fn get(&self, name: &str) -> Option<Arc<dyn Extension>> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, extension)| extension.clone())
    }

    /// Registered extension names, in registration order.
    pub async fn names(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        entries.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Number of registered extensions.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the registry holds no extensions.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
