//! Application lifecycle for the Atrium runtime
//!
//! This module provides the application itself (construction, boot
//! sequence, start/stop), its resolved configuration, its append-only
//! keyed cache, and the context view handed to extensions and modules.

pub mod application;
pub mod cache;
pub mod config;
pub mod context;

// Re-export key types for convenience
pub use application::{AppOptions, Application};
pub use cache::AppCache;
pub use config::AppConfig;
pub use context::ApplicationContext;
