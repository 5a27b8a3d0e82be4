//! Application configuration.
//!
//! Handles loading and overlaying per-application configuration. An
//! application's configuration is resolved once during boot, from
//! defaults, the parent configuration (shared read-only by the root
//! application), and mode-specific JSON files, and is immutable
//! afterward.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use atrium_core::error::ConfigError;
use atrium_core::types::ExtensionDescriptor;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

/// Network endpoint configuration consumed by the server driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening protocol
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Listening host
    #[serde(default = "default_host")]
    pub host: String,

    /// Listening port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_protocol() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Coordinator/worker fan-out configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Whether the process acts as a cluster coordinator
    #[serde(default)]
    pub enabled: bool,

    /// Number of worker processes to fan out to
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    2
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            workers: default_workers(),
        }
    }
}

/// Resolved configuration of one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Declared application name; `None` marks the root application
    #[serde(default)]
    pub name: Option<String>,

    /// Directory under the application root holding its modules
    #[serde(default = "default_modules_dir")]
    pub modules_dir_name: String,

    /// Mandatory module entry-point artifact, relative to the module dir
    #[serde(default = "default_entry_file")]
    pub entry_file_name: String,

    /// Mandatory module router artifact, relative to the module dir
    #[serde(default = "default_router_file")]
    pub router_file_name: String,

    /// Optional module models directory, relative to the module dir
    #[serde(default = "default_models_dir")]
    pub models_dir_name: String,

    /// Listening endpoint
    #[serde(default)]
    pub server: ServerConfig,

    /// Cluster coordinator settings
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Extensions to resolve and install at boot, in order
    #[serde(default)]
    pub extensions: Vec<ExtensionDescriptor>,

    /// Additional top-level configuration sections
    #[serde(default, flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn default_modules_dir() -> String {
    "modules".to_string()
}

fn default_entry_file() -> String {
    "index.wasm".to_string()
}

fn default_router_file() -> String {
    "router.wasm".to_string()
}

fn default_models_dir() -> String {
    "models".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: None,
            modules_dir_name: default_modules_dir(),
            entry_file_name: default_entry_file(),
            router_file_name: default_router_file(),
            models_dir_name: default_models_dir(),
            server: ServerConfig::default(),
            cluster: ClusterConfig::default(),
            extensions: Vec::new(),
            extra: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `<config_dir>/default.json` overlaid by
    /// `<config_dir>/<mode>.json`. A missing file logs a warning and
    /// falls back; an unparsable file is an error.
    pub async fn load(config_dir: &Path, mode: &str) -> Result<Self> {
        let mut config = AppConfig::default();

        for file_name in ["default.json".to_string(), format!("{mode}.json")] {
            let path = config_dir.join(&file_name);

            if !path.exists() {
                warn!("Configuration file not found: {}", path.display());
                continue;
            }

            info!("Loading configuration from {}", path.display());

            let content = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

            let overlay: AppConfig = serde_json::from_str(&content).with_context(|| {
                format!("Failed to parse configuration file: {}", path.display())
            })?;

            config.merge(overlay);
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.modules_dir_name.is_empty() {
            return Err(
                ConfigError::Invalid("Modules directory name cannot be empty".to_string()).into(),
            );
        }

        if self.entry_file_name.is_empty() || self.router_file_name.is_empty() {
            return Err(ConfigError::Invalid(
                "Module artifact file names cannot be empty".to_string(),
            )
            .into());
        }

        if self.server.port == 0 {
            return Err(ConfigError::Invalid("Server port cannot be zero".to_string()).into());
        }

        if self.cluster.enabled && self.cluster.workers == 0 {
            return Err(ConfigError::Invalid(
                "Cluster worker count cannot be zero when clustering is enabled".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Overlay another configuration onto this one.
    pub fn merge(&mut self, other: AppConfig) {
        if other.name.is_some() {
            self.name = other.name;
        }

        if !other.modules_dir_name.is_empty() {
            self.modules_dir_name = other.modules_dir_name;
        }

        if !other.entry_file_name.is_empty() {
            self.entry_file_name = other.entry_file_name;
        }

        if !other.router_file_name.is_empty() {
            self.router_file_name = other.router_file_name;
        }

        if !other.models_dir_name.is_empty() {
            self.models_dir_name = other.models_dir_name;
        }

        self.server = other.server;

        if other.cluster.enabled {
            self.cluster = other.cluster;
        }

        // an overlay that declares extensions replaces the inherited list
        if !other.extensions.is_empty() {
            self.extensions = other.extensions;
        }

        for (key, value) in other.extra {
            self.extra.insert(key, value);
        }
    }
}
