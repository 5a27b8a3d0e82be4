//! Orchestrator.
//!
//! Owns the set of applications, sequences their startup and shutdown,
//! and provides process-wide supervisory behavior: sub-application
//! discovery, fatal-error containment, cluster log aggregation, and
//! process-signal binding.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use atrium_core::error::OrchestratorError;
use atrium_core::traits::{ArtifactLoader, ExtensionResolver};
use atrium_core::types::AppLifecycleEvent;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::app::application::{AppOptions, Application};
use crate::app::config::AppConfig;
use crate::system::cluster::ClusterCoordinator;
use crate::system::signals::{self, ExitHandler};

/// Builds one server driver per application. Called with `None` for the
/// root application and with the application name otherwise.
pub type ServerFactory =
    Arc<dyn Fn(Option<&str>) -> Arc<dyn atrium_core::traits::ServerDriver> + Send + Sync>;

/// Construction parameters for the orchestrator.
pub struct OrchestratorParams {
    /// Directory holding one sub-directory per sub-application
    pub apps_dir: PathBuf,

    /// Configuration directory of the root application
    pub config_dir: PathBuf,

    /// Mode tag selecting configuration overlays
    pub mode: String,

    /// Extension resolver shared by every application
    pub resolver: Option<Arc<dyn ExtensionResolver>>,

    /// Module artifact loader shared by every application
    pub loader: Option<Arc<dyn ArtifactLoader>>,

    /// Per-application server drivers; defaults to headless no-op drivers
    pub server_factory: Option<ServerFactory>,
}

impl OrchestratorParams {
    /// Parameters for an orchestrator over `apps_dir`, with the root
    /// application's configuration in `config_dir`, running in `mode`.
    pub fn new(
        apps_dir: impl Into<PathBuf>,
        config_dir: impl Into<PathBuf>,
        mode: impl Into<String>,
    ) -> Self {
        Self {
            apps_dir: apps_dir.into(),
            config_dir: config_dir.into(),
            mode: mode.into(),
            resolver: None,
            loader: None,
            server_factory: None,
        }
    }
}

/// Process-level supervisor owning the root application and every
/// discovered sub-application.
pub struct Orchestrator {
    apps_dir: PathBuf,
    mode: String,
    resolver: Option<Arc<dyn ExtensionResolver>>,
    loader: Option<Arc<dyn ArtifactLoader>>,
    server_factory: Option<ServerFactory>,

    root: Arc<Application>,
    apps: RwLock<Vec<(String, Arc<Application>)>>,
    cluster: Arc<ClusterCoordinator>,
    exit: Arc<ExitHandler>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("apps_dir", &self.apps_dir)
            .field("mode", &self.mode)
            .field("resolver", &self.resolver.is_some())
            .field("loader", &self.loader.is_some())
            .field("server_factory", &self.server_factory.is_some())
            .field("apps", &self.apps.try_read().map(|a| a.len()).ok())
            .finish()
    }
}

impl Orchestrator {
    /// Boot the root application, install cluster log aggregation when
    /// clustering is enabled, and discover sub-applications.
    ///
    /// Returns an error only when the root application fails to boot or
    /// sub-application discovery fails catastrophically.
    pub async fn initialize(params: OrchestratorParams) -> Result<Self> {
        Self::initialize_with_exit(params, Arc::new(ExitHandler::new())).await
    }

    /// `initialize` with an injected exit handler.
    pub async fn initialize_with_exit(
        params: OrchestratorParams,
        exit: Arc<ExitHandler>,
    ) -> Result<Self> {
        info!("Initializing orchestrator in mode '{}'", params.mode);

        let mut root_options = AppOptions::new(
            params.apps_dir.clone(),
            params.config_dir.clone(),
            params.mode.clone(),
        );
        root_options.is_core_app = true;
        root_options.resolver = params.resolver.clone();
        root_options.loader = params.loader.clone();
        root_options.server = params.server_factory.as_ref().map(|factory| factory(None));

        let orchestrator = Self {
            apps_dir: params.apps_dir,
            mode: params.mode,
            resolver: params.resolver,
            loader: params.loader,
            server_factory: params.server_factory,
            root: Arc::new(Application::new(root_options)),
            apps: RwLock::new(Vec::new()),
            cluster: Arc::new(ClusterCoordinator::new()),
            exit,
        };

        // everything else waits for the root application's readiness
        orchestrator
            .root
            .boot()
            .await
            .context("Core application failed to boot")?;

        let clustered = orchestrator
            .root
            .config()
            .map(|config| config.cluster.enabled)
            .unwrap_or(false);
        if clustered {
            orchestrator.setup_workers_logging();
        }

        orchestrator.load_apps().await?;

        info!("Orchestrator ready");

        Ok(orchestrator)
    }

    /// Discover and register every sub-application.
    ///
    /// Each directory entry of the applications directory becomes an
    /// application; other entries are skipped. Registration is strictly
    /// sequential: the next application begins only after the previous
    /// one reached ready-or-error, because later applications may assume
    /// earlier ones have already mutated process-wide state.
    pub async fn load_apps(&self) -> Result<()> {
        let mut entries = fs::read_dir(&self.apps_dir).await.map_err(|e| {
            error!("Failed to list applications directory: {}", e);
            OrchestratorError::DiscoveryFailed {
                dir: self.apps_dir.clone(),
                reason: e.to_string(),
            }
        })?;

        let mut names = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    return Err(OrchestratorError::DiscoveryFailed {
                        dir: self.apps_dir.clone(),
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
            } else {
                debug!(
                    "Skipping non-directory entry: {}",
                    entry.file_name().to_string_lossy()
                );
            }
        }
        names.sort();

        for name in &names {
            self.register_app(name)
                .await
                .with_context(|| format!("Registration of application '{}' failed", name))?;
        }

        Ok(())
    }

    /// Build an application rooted at `<apps_dir>/<name>`, boot it, wire
    /// its error events to the fatal-exit path, and store it in
    /// registration order.
    pub async fn register_app(&self, name: &str) -> Result<Arc<Application>> {
        let app_dir = self.apps_dir.join(name);

        let mut options = AppOptions::new(
            app_dir.clone(),
            app_dir.join("config"),
            self.mode.clone(),
        );
        options.name = Some(name.to_string());
        options.parent_config = self.root.config();
        options.resolver = self.resolver.clone();
        options.loader = self.loader.clone();
        options.server = self
            .server_factory
            .as_ref()
            .map(|factory| factory(Some(name)));

        let app = Arc::new(Application::new(options));

        // a registered application raising an error is fatal to the
        // whole process
        let mut events = app.subscribe();
        let exit = self.exit.clone();
        let app_name = name.to_string();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                if let AppLifecycleEvent::Error { cause } = event {
                    exit.fatal(&format!(
                        "Application '{}' raised a fatal error: {}",
                        app_name, cause
                    ));
                    break;
                }
            }
        });

        app.boot().await?;

        self.apps.write().await.push((name.to_string(), app.clone()));
        info!("Registered application: {}", name);

        Ok(app)
    }

    /// Start one application by name, or every registered application in
    /// registration order when no name is given. Each application's own
    /// start completes before the next begins.
    pub async fn start(&self, name: Option<&str>) -> Result<()> {
        match name {
            Some(name) => {
                let app = self
                    .app(name)
                    .await
                    .ok_or_else(|| OrchestratorError::AppNotFound(name.to_string()))?;
                app.start().await
            }
            None => {
                let apps: Vec<(String, Arc<Application>)> =
                    self.apps.read().await.iter().cloned().collect();
                for (name, app) in apps {
                    app.start()
                        .await
                        .with_context(|| format!("Failed to start application '{}'", name))?;
                }
                Ok(())
            }
        }
    }

    /// Stop every registered application in registration order, then the
    /// root application last, then run the exit-cleanup path regardless
    /// of the outcome.
    pub async fn stop(&self) -> Result<()> {
        let result = self.stop_apps().await;
        self.exit.cleanup();
        result
    }

    async fn stop_apps(&self) -> Result<()> {
        let apps: Vec<(String, Arc<Application>)> =
            self.apps.read().await.iter().cloned().collect();

        for (name, app) in apps {
            app.stop()
                .await
                .with_context(|| format!("Failed to stop application '{}'", name))?;
        }

        self.root
            .stop()
            .await
            .context("Failed to stop core application")?;

        Ok(())
    }

    /// Install the cluster log-aggregation bridge. Meaningful only for a
    /// cluster coordinator process.
    pub fn setup_workers_logging(&self) {
        self.cluster.setup_workers_logging();
    }

    /// Bind process signal handling: interactive interrupt runs the
    /// clean exit path, the external kill instruction terminates
    /// immediately without cleanup, and uncaught failures exit with
    /// status 1.
    pub fn bind_process_signals(&self) {
        signals::bind_interrupt(self.exit.clone());
        signals::bind_kill(self.exit.clone());
        signals::bind_failure_hook(self.exit.clone());
    }

    /// The root application.
    pub fn root(&self) -> &Arc<Application> {
        &self.root
    }

    /// Registered applications, in registration order.
    pub async fn apps(&self) -> Vec<Arc<Application>> {
        self.apps
            .read()
            .await
            .iter()
            .map(|(_, app)| app.clone())
            .collect()
    }

    /// Registered application names, in registration order.
    pub async fn app_names(&self) -> Vec<String> {
        self.apps
            .read()
            .await
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// The registered application named `name`.
    pub async fn app(&self, name: &str) -> Option<Arc<Application>> {
        self.apps
            .read()
            .await
            .iter()
            .find(|(app_name, _)| app_name == name)
            .map(|(_, app)| app.clone())
    }

    /// The cluster coordinator.
    pub fn cluster(&self) -> &Arc<ClusterCoordinator> {
        &self.cluster
    }

    /// The process exit handler.
    pub fn exit_handler(&self) -> &Arc<ExitHandler> {
        &self.exit
    }

    /// The root application's resolved configuration.
    pub fn config(&self) -> Option<Arc<AppConfig>> {
        self.root.config()
    }
}
