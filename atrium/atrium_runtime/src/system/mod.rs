//! Process-level supervision for the Atrium runtime
//!
//! This module provides the orchestrator that owns the application set,
//! cluster log aggregation, and idempotent process exit handling.

pub mod cluster;
pub mod orchestrator;
pub mod signals;

// Re-export key types for convenience
pub use cluster::ClusterCoordinator;
pub use orchestrator::{Orchestrator, OrchestratorParams};
pub use signals::ExitHandler;
