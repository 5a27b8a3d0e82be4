//! Error types for the Atrium orchestration core.
//!
//! This module defines the error hierarchy shared by every Atrium crate.
//! Errors are organized by subsystem, with each subsystem having its own
//! error type; the root `Error` can wrap any of them, allowing uniform
//! handling at the top level.
//!
//! The taxonomy follows the supervisory design: configuration errors fail
//! fast at registration time, resolution errors carry the underlying
//! loader's reason verbatim, discovery I/O errors are fatal to the
//! enclosing call, and only optional-artifact absence is absorbed locally.

use std::path::PathBuf;

use thiserror::Error;

/// Result type used throughout the Atrium core.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the Atrium system.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Extension registration and resolution errors
    #[error("Extension error: {0}")]
    Extension(#[from] ExtensionError),

    /// Module discovery, loading, and mounting errors
    #[error("Module error: {0}")]
    Module(#[from] ModuleError),

    /// Application lifecycle errors
    #[error("Application error: {0}")]
    App(#[from] AppError),

    /// Orchestrator supervision errors
    #[error("Orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Configuration contents violate an invariant
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by the extension registry and resolvers.
///
/// Descriptor-shape violations are configuration errors and are raised
/// before any I/O happens; `ResolveFailed` carries the underlying
/// loader's failure reason verbatim.
#[derive(Debug, Error)]
pub enum ExtensionError {
    /// Descriptor is missing its mandatory name
    #[error("Extension descriptor must declare a 'name'")]
    MissingName,

    /// Descriptor declares neither a package nor a file source
    #[error("Extension '{0}' must declare 'module' or 'file'")]
    NoSource(String),

    /// Descriptor declares both a package and a file source
    #[error("Extension '{0}' must declare exactly one of 'module' or 'file'")]
    AmbiguousSource(String),

    /// An extension with this name is already registered
    #[error("Extension '{0}' is already registered")]
    Duplicate(String),

    /// The descriptor's source could not be resolved to an extension
    #[error("Cannot resolve extension '{name}': {reason}")]
    ResolveFailed { name: String, reason: String },

    /// The extension's install hook failed during application boot
    #[error("Install of extension '{name}' failed: {reason}")]
    InstallFailed { name: String, reason: String },

    /// No extension is registered under this name
    #[error("Extension '{0}' not found")]
    NotFound(String),
}

/// Errors raised by the module registry and mounter.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// A mandatory module artifact (entry point or router) is absent
    #[error("Module '{module}' is missing mandatory artifact: {}", .path.display())]
    MissingArtifact { module: String, path: PathBuf },

    /// A module with this name is already collected
    #[error("Module '{0}' is already registered")]
    Duplicate(String),

    /// The modules directory could not be listed
    #[error("Module discovery failed in {}: {reason}", .dir.display())]
    DiscoveryFailed { dir: PathBuf, reason: String },

    /// A module artifact failed to load or its entry point failed
    #[error("Module '{module}' failed to load: {reason}")]
    LoadFailed { module: String, reason: String },

    /// No artifact is registered for the given path in the loader
    #[error("No artifact registered for path: {}", .0.display())]
    ArtifactUnavailable(PathBuf),

    /// Mounting was attempted before the module was loaded
    #[error("Module '{0}' cannot be mounted before it is loaded")]
    NotLoaded(String),
}

/// Errors raised during application lifecycle transitions.
#[derive(Debug, Error)]
pub enum AppError {
    /// The application's boot sequence failed
    #[error("Application boot failed: {0}")]
    BootFailed(String),

    /// The application is not in a state that permits the operation
    #[error("Application '{app}' is in an invalid state for {operation}")]
    InvalidState { app: String, operation: String },

    /// The server driver failed to start or stop listening
    #[error("Server driver failed: {0}")]
    ServerFailed(String),
}

/// Errors raised by the orchestrator while supervising applications.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The applications directory could not be listed
    #[error("Application discovery failed in {}: {reason}", .dir.display())]
    DiscoveryFailed { dir: PathBuf, reason: String },

    /// No application is registered under this name
    #[error("Application '{0}' is not registered")]
    AppNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsystem_errors_wrap_into_root() {
        let err: Error = ExtensionError::MissingName.into();
        assert!(err.to_string().contains("must declare a 'name'"));

        let err: Error = ModuleError::MissingArtifact {
            module: "users".to_string(),
            path: PathBuf::from("/apps/blog/modules/users/router.wasm"),
        }
        .into();
        assert!(err.to_string().contains("router.wasm"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
