//! Module registry.
//!
//! Discovers and lazily mounts the HMVC modules of one application. The
//! registry exposes two phases: collection (filesystem discovery and
//! artifact validation) and mounting (first execution of module code
//! against a running application context). Discovery order is preserved
//! through both phases, so namespace assignment is deterministic given a
//! fixed directory listing.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use atrium_core::error::ModuleError;
use atrium_core::traits::{
    AppContext, ArtifactLoader, HandlerContext, ModelRegistrar, Router,
};
use atrium_core::types::ModuleArtifacts;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::app::config::AppConfig;
use crate::module::mounter::{LoadedModule, MountedModule};

/// Registry of one application's modules, keyed by module name in
/// discovery order.
pub struct ModuleRegistry {
    config: Arc<AppConfig>,
    app_dir: PathBuf,
    loader: Arc<dyn ArtifactLoader>,
    loaded: RwLock<Vec<(String, Arc<LoadedModule>)>>,
    mounted: RwLock<Vec<(String, MountedModule)>>,
}

impl ModuleRegistry {
    /// Create an empty registry for the application rooted at `app_dir`.
    pub fn new(config: Arc<AppConfig>, app_dir: PathBuf, loader: Arc<dyn ArtifactLoader>) -> Self {
        Self {
            config,
            app_dir,
            loader,
            loaded: RwLock::new(Vec::new()),
            mounted: RwLock::new(Vec::new()),
        }
    }

    /// Discover the application's modules directory and collect every
    /// module directory inside it, in lexicographic order.
    ///
    /// Modules are a sub-application-only concept: for the root
    /// application (no declared name) collection is a no-op. An absent
    /// modules directory is not fatal; an unreadable one is.
    pub async fn collect(&self) -> Result<()> {
        if self.config.name.is_none() {
            debug!("Root application declares no modules, skipping collection");
            return Ok(());
        }

        let modules_dir = self.app_dir.join(&self.config.modules_dir_name);

        let mut entries = match fs::read_dir(&modules_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("No modules directory at {}", modules_dir.display());
                return Ok(());
            }
            Err(e) => {
                return Err(ModuleError::DiscoveryFailed {
                    dir: modules_dir,
                    reason: e.to_string(),
                }
                .into());
            }
        };

        let mut names = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    return Err(ModuleError::DiscoveryFailed {
                        dir: modules_dir,
                        reason: e.to_string(),
                    }
                    .into());
                }
            };

            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if is_dir {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        for name in names {
            let path = modules_dir.join(&name);
            self.add_module(&name, path).await?;
        }

        Ok(())
    }

    /// Validate one module directory's artifacts and store its deferred
    /// wrapper.
    ///
    /// The entry-point and router artifacts are mandatory; a failed stat
    /// on either is a structural configuration error naming the missing
    /// path. The models directory is optional: when it cannot be read,
    /// the failure is logged and an empty model list is used. No module
    /// code runs here.
    pub async fn add_module(&self, name: &str, absolute_path: PathBuf) -> Result<()> {
        let entry_path = absolute_path.join(&self.config.entry_file_name);
        let router_path = absolute_path.join(&self.config.router_file_name);

        if let Err(e) = fs::metadata(&entry_path).await {
            warn!("Module '{}' entry stat failed: {}", name, e);
            return Err(ModuleError::MissingArtifact {
                module: name.to_string(),
                path: entry_path,
            }
            .into());
        }
        if let Err(e) = fs::metadata(&router_path).await {
            warn!("Module '{}' router stat failed: {}", name, e);
            return Err(ModuleError::MissingArtifact {
                module: name.to_string(),
                path: router_path,
            }
            .into());
        }

        let models_dir = absolute_path.join(&self.config.models_dir_name);
        let mut model_paths = Vec::new();
        match fs::read_dir(&models_dir).await {
            Ok(mut entries) => {
                while let Some(entry) = entries.next_entry().await? {
                    let is_file = entry
                        .file_type()
                        .await
                        .map(|t| t.is_file())
                        .unwrap_or(false);
                    if is_file {
                        model_paths.push(entry.path());
                    }
                }
                model_paths.sort();
            }
            Err(e) => {
                warn!("Module '{}' has no readable models directory: {}", name, e);
            }
        }

        let mut loaded = self.loaded.write().await;
        if loaded.iter().any(|(n, _)| n == name) {
            return Err(ModuleError::Duplicate(name.to_string()).into());
        }

        let artifacts = ModuleArtifacts {
            entry: entry_path,
            router: Some(router_path),
            models: model_paths,
        };
        loaded.push((
            name.to_string(),
            Arc::new(LoadedModule::wrap(name, artifacts, self.loader.clone())),
        ));

        info!("Collected module: {}", name);

        Ok(())
    }

    /// Run stage 1 for every collected module, in collection order. This
    /// is the first time each module's code executes; a failure stops
    /// here rather than proceeding to mount the remaining modules
    /// degraded.
    pub async fn mount_modules(&self, ctx: &dyn AppContext) -> Result<()> {
        let loaded: Vec<(String, Arc<LoadedModule>)> =
            self.loaded.read().await.iter().cloned().collect();

        for (name, module) in loaded {
            // a module is loaded at most once per process
            if self.mounted.read().await.iter().any(|(n, _)| n == &name) {
                debug!("Module '{}' already mounted, skipping", name);
                continue;
            }

            let mounted = module.mount(ctx).await?;
            self.mounted.write().await.push((name, mounted));
        }

        Ok(())
    }

    /// Run every mounted module's router under its own URL namespace, in
    /// mount order. Each namespace equals `/` plus the module's directory
    /// name; this is structural, not configurable.
    pub async fn run_mounted_routers(
        &self,
        handler_ctx: &dyn HandlerContext,
        router: &dyn Router,
        model_registrar: Option<&dyn ModelRegistrar>,
    ) -> Result<()> {
        let mounted = self.mounted.read().await;

        for (name, module) in mounted.iter() {
            let namespaced = router.namespaced(&format!("/{}", name));
            module.run(handler_ctx, namespaced, model_registrar)?;
        }

        Ok(())
    }

    /// Collected module names, in discovery order.
    pub async fn loaded_modules(&self) -> Vec<String> {
        self.loaded
            .read()
            .await
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Mounted module names, in mount order.
    pub async fn mounted_modules(&self) -> Vec<String> {
        self.mounted
            .read()
            .await
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}
