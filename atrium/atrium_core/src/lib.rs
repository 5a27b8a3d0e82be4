//! # Atrium Core
//!
//! `atrium_core` provides the shared vocabulary for the Atrium
//! multi-application server framework: error types, identifier types,
//! capability traits, and the data structures exchanged between the
//! orchestrator, applications, modules, and extensions.
//!
//! ## Crate Structure
//!
//! - **error**: Error hierarchy for all Atrium components
//! - **id**: Strongly-typed identifier types
//! - **traits**: Capability contracts at the system's seams
//! - **types**: Data structures used throughout the system

pub mod error;
pub mod id;
pub mod traits;
pub mod types;

// Re-export key types and traits for convenience
pub use error::{Error, Result};
pub use id::WorkerId;
pub use traits::{
    AppContext, ArtifactLoader, Extension, ExtensionResolver, HandlerContext, ModelFactory,
    ModelObject, ModelRegistrar, ModuleEntry, PrefixRouter, Router, RouterHook, ServerDriver,
};
pub use types::{AppLifecycleEvent, AppState, ExtensionDescriptor, ModuleArtifacts, ModuleState, WorkerMessage};
