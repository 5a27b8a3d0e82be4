//! Application lifecycle.
//!
//! An application is an independently-configured, independently-startable
//! unit owning its own modules and extensions. Its boot sequence runs
//! configuration resolution, extension installation, then module
//! collection and mounting, and finishes by emitting exactly one terminal
//! lifecycle event: `Ready` or `Error`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use atrium_core::error::{AppError, Result as CoreResult};
use atrium_core::traits::{
    ArtifactLoader, ExtensionResolver, ModelRegistrar, PrefixRouter, Router, ServerDriver,
};
use atrium_core::types::{AppLifecycleEvent, AppState};
use tokio::sync::{broadcast, OnceCell, RwLock};
use tracing::{debug, info, warn};

use crate::app::cache::AppCache;
use crate::app::config::AppConfig;
use crate::app::context::ApplicationContext;
use crate::extension::registry::ExtensionRegistry;
use crate::extension::resolver::DefaultResolver;
use crate::module::loader::RegistryLoader;
use crate::module::registry::ModuleRegistry;

/// Construction options for an application.
pub struct AppOptions {
    /// Absolute application directory
    pub dir: PathBuf,

    /// Directory holding the application's configuration files
    pub config_dir: PathBuf,

    /// Mode tag selecting the configuration overlay
    pub mode: String,

    /// Declared name; `None` for the root application
    pub name: Option<String>,

    /// The root application's resolved configuration, shared read-only
    pub parent_config: Option<Arc<AppConfig>>,

    /// Whether this is the process's root application
    pub is_core_app: bool,

    /// Extension resolver; defaults to `DefaultResolver`
    pub resolver: Option<Arc<dyn ExtensionResolver>>,

    /// Module artifact loader; defaults to an empty `RegistryLoader`
    pub loader: Option<Arc<dyn ArtifactLoader>>,

    /// Server driver; defaults to a headless no-op driver
    pub server: Option<Arc<dyn ServerDriver>>,

    /// Model registrar handed to module mounts; defaults to none
    pub model_registrar: Option<Arc<dyn ModelRegistrar>>,
}

impl AppOptions {
    /// Options for an application rooted at `dir`, with configuration in
    /// `config_dir`, booted in `mode`.
    pub fn new(dir: impl Into<PathBuf>, config_dir: impl Into<PathBuf>, mode: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            config_dir: config_dir.into(),
            mode: mode.into(),
            name: None,
            parent_config: None,
            is_core_app: false,
            resolver: None,
            loader: None,
            server: None,
            model_registrar: None,
        }
    }
}

/// Headless server driver used when no real listening backend is wired
/// in. Starting and stopping succeed without side effects.
pub struct NoopServer;

#[async_trait]
impl ServerDriver for NoopServer {
    async fn start(&self) -> CoreResult<()> {
        Ok(())
    }

    async fn stop(&self) -> CoreResult<()> {
        Ok(())
    }

    fn root_router(&self) -> Box<dyn Router> {
        Box::new(PrefixRouter::root())
    }
}

/// An independently-startable application owning one extension registry
/// and one module registry.
pub struct Application {
    name: Option<String>,
    dir: PathBuf,
    config_dir: PathBuf,
    mode: String,
    is_core_app: bool,
    parent_config: Option<Arc<AppConfig>>,

    loader: Arc<dyn ArtifactLoader>,
    server: Arc<dyn ServerDriver>,
    model_registrar: Option<Arc<dyn ModelRegistrar>>,

    cache: Arc<AppCache>,
    config: OnceCell<Arc<AppConfig>>,
    context: OnceCell<Arc<ApplicationContext>>,
    extensions: Arc<ExtensionRegistry>,
    modules: OnceCell<Arc<ModuleRegistry>>,

    state: RwLock<AppState>,
    events: broadcast::Sender<AppLifecycleEvent>,
    boot_event_fired: AtomicBool,
}

impl Application {
    /// Create an application from its options. No I/O happens until
    /// `boot`.
    pub fn new(options: AppOptions) -> Self {
        let (events, _) = broadcast::channel(16);

        let resolver: Arc<dyn ExtensionResolver> = options
            .resolver
            .unwrap_or_else(|| Arc::new(DefaultResolver::new()));
        let loader: Arc<dyn ArtifactLoader> = options
            .loader
            .unwrap_or_else(|| Arc::new(RegistryLoader::new()));
        let server: Arc<dyn ServerDriver> =
            options.server.unwrap_or_else(|| Arc::new(NoopServer));

        Self {
            name: options.name,
            dir: options.dir,
            config_dir: options.config_dir,
            mode: options.mode,
            is_core_app: options.is_core_app,
            parent_config: options.parent_config,
            loader,
            server,
            model_registrar: options.model_registrar,
            cache: Arc::new(AppCache::new()),
            config: OnceCell::new(),
            context: OnceCell::new(),
            extensions: Arc::new(ExtensionRegistry::new(resolver)),
            modules: OnceCell::new(),
            state: RwLock::new(AppState::Created),
            events,
            boot_event_fired: AtomicBool::new(false),
        }
    }

    /// Subscribe to the application's lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<AppLifecycleEvent> {
        self.events.subscribe()
    }

    /// Run the boot sequence: configuration resolution, extension
    /// installation, module collection and mounting. Emits `Ready` on
    /// success and `Error` on failure; exactly one fires, exactly once.
    pub async fn boot(&self) -> Result<()> {
        {
            let state = self.state.read().await;
            if *state != AppState::Created {
                return Err(AppError::InvalidState {
                    app: self.display_name().to_string(),
                    operation: "boot".to_string(),
                }
                .into());
            }
        }

        self.set_state(AppState::Booting).await;

        match self.boot_inner().await {
            Ok(()) => {
                self.set_state(AppState::Ready).await;
                self.emit_boot_event(AppLifecycleEvent::Ready {
                    name: self.name.clone(),
                });
                info!("Application ready: {}", self.display_name());
                Ok(())
            }
            Err(e) => {
                self.set_state(AppState::Failed).await;
                self.emit_boot_event(AppLifecycleEvent::Error {
                    cause: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn boot_inner(&self) -> Result<()> {
        info!("Booting application: {}", self.display_name());

        // configuration is resolved once and immutable afterward
        let config = self.resolve_config().await?;

        // memoize the raw config for context lookups
        let raw = serde_json::to_value(config.as_ref())
            .context("Failed to serialize resolved configuration")?;
        self.cache.add("config", raw);

        let ctx = Arc::new(ApplicationContext::new(
            self.name.clone(),
            self.dir.clone(),
            self.mode.clone(),
            self.cache.clone(),
        ));
        let _ = self.context.set(ctx.clone());

        // extensions install before any module code runs
        self.extensions.initialize(&config).await?;
        self.extensions.install_all(ctx.as_ref()).await?;

        // module collection, then first execution at mount
        let modules = Arc::new(ModuleRegistry::new(
            config.clone(),
            self.dir.clone(),
            self.loader.clone(),
        ));
        modules.collect().await?;
        modules.mount_modules(ctx.as_ref()).await?;
        let _ = self.modules.set(modules);

        Ok(())
    }

    async fn resolve_config(&self) -> Result<Arc<AppConfig>> {
        let config = self
            .config
            .get_or_try_init(|| async {
                let mut config = match &self.parent_config {
                    Some(parent) => parent.as_ref().clone(),
                    None => AppConfig::default(),
                };

                let overlay = AppConfig::load(&self.config_dir, &self.mode).await?;
                config.merge(overlay);
                config.name = self.name.clone();
                config.validate()?;

                Ok::<Arc<AppConfig>, anyhow::Error>(Arc::new(config))
            })
            .await?;

        Ok(config.clone())
    }

    /// Bring up network listening and bind every mounted module's router
    /// under the server's root router.
    pub async fn start(&self) -> Result<()> {
        {
            let state = self.state.read().await;
            if *state != AppState::Ready && *state != AppState::Stopped {
                return Err(AppError::InvalidState {
                    app: self.display_name().to_string(),
                    operation: "start".to_string(),
                }
                .into());
            }
        }

        self.server
            .start()
            .await
            .map_err(|e| AppError::ServerFailed(e.to_string()))?;

        if let (Some(modules), Some(ctx)) = (self.modules.get(), self.context.get()) {
            let router = self.server.root_router();
            modules
                .run_mounted_routers(
                    ctx.as_ref(),
                    router.as_ref(),
                    self.model_registrar.as_deref(),
                )
                .await?;
        }

        if let Some(config) = self.config.get() {
            info!(
                "Application {} listening on {}://{}:{}",
                self.display_name(),
                config.server.protocol,
                config.server.host,
                config.server.port
            );
        }

        self.set_state(AppState::Running).await;

        Ok(())
    }

    /// Tear network listening down.
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping application: {}", self.display_name());

        self.server
            .stop()
            .await
            .map_err(|e| AppError::ServerFailed(e.to_string()))?;

        self.set_state(AppState::Stopped).await;

        Ok(())
    }

    /// Surface a post-boot runtime fault. The orchestrator treats any
    /// `Error` event from a registered application as fatal to the
    /// process.
    pub async fn raise_error(&self, cause: &str) {
        warn!(
            "Application {} raised a runtime fault: {}",
            self.display_name(),
            cause
        );
        self.set_state(AppState::Failed).await;
        let _ = self.events.send(AppLifecycleEvent::Error {
            cause: cause.to_string(),
        });
    }

    fn emit_boot_event(&self, event: AppLifecycleEvent) {
        // the terminal boot event fires at most once per instance
        if self.boot_event_fired.swap(true, Ordering::SeqCst) {
            debug!(
                "Suppressing repeated boot event for {}",
                self.display_name()
            );
            return;
        }
        let _ = self.events.send(event);
    }

    async fn set_state(&self, state: AppState) {
        *self.state.write().await = state;
    }

    /// Declared name, or `None` for the root application.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name used in log lines.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("core")
    }

    /// Absolute application directory.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Whether this is the process's root application.
    pub fn is_core_app(&self) -> bool {
        self.is_core_app
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> AppState {
        *self.state.read().await
    }

    /// Resolved configuration; `None` before boot.
    pub fn config(&self) -> Option<Arc<AppConfig>> {
        self.config.get().cloned()
    }

    /// The application's keyed cache.
    pub fn cache(&self) -> &Arc<AppCache> {
        &self.cache
    }

    /// The application's extension registry.
    pub fn extensions(&self) -> &Arc<ExtensionRegistry> {
        &self.extensions
    }

    /// The application's module registry; `None` before boot completes.
    pub fn modules(&self) -> Option<Arc<ModuleRegistry>> {
        self.modules.get().cloned()
    }
}
