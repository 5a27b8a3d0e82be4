//! Data structures shared across the Atrium system.

pub mod app;
pub mod cluster;
pub mod extension;
pub mod module;

// Re-export key types for convenience
pub use app::{AppLifecycleEvent, AppState};
pub use cluster::WorkerMessage;
pub use extension::ExtensionDescriptor;
pub use module::{ModuleArtifacts, ModuleState};
