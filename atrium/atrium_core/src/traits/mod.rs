//! Core interfaces of the Atrium system.
//!
//! These traits replace the runtime property probing of earlier designs
//! with explicit capability contracts: routers namespace, extensions
//! install, resolvers load descriptors, artifact loaders defer module
//! code, and server drivers own listening.

pub mod context;
pub mod extension;
pub mod loader;
pub mod router;
pub mod server;

// Re-export key traits for convenience
pub use context::{AppContext, HandlerContext};
pub use extension::{Extension, ExtensionResolver};
pub use loader::{
    ArtifactLoader, ModelFactory, ModelObject, ModelRegistrar, ModuleEntry, RouterHook,
};
pub use router::{PrefixRouter, Router};
pub use server::ServerDriver;
