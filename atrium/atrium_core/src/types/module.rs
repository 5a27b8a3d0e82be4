//! Module artifact paths and mount state.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Stage a module has reached inside its owning registry.
///
/// A module cannot be mounted before it is loaded, and loading happens at
/// most once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleState {
    /// Artifact paths validated, nothing loaded
    Collected,

    /// Stage-1 wrapper built; module code still not executed
    Loaded,

    /// Entry point executed, router hook and model factories held
    Mounted,
}

/// Filesystem artifacts making up one HMVC module.
///
/// The entry point is mandatory. The router is mandatory at collection
/// time but optional at the mounter layer, where a no-op hook stands in
/// for an absent router so stage 2 is always safely callable. Model paths
/// are optional and default to an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleArtifacts {
    /// Entry-point artifact; loaded and invoked at mount time
    pub entry: PathBuf,

    /// Router artifact; loaded unwrapped at mount time
    pub router: Option<PathBuf>,

    /// Model artifacts, in discovery order
    pub models: Vec<PathBuf>,
}

impl ModuleArtifacts {
    /// Artifacts with a mandatory entry point and no router or models.
    pub fn entry_only(entry: impl Into<PathBuf>) -> Self {
        Self {
            entry: entry.into(),
            router: None,
            models: Vec::new(),
        }
    }
}
