//! Artifact loading contracts backing the module mounter.
//!
//! Module discovery (cheap directory listing) is separated from loading
//! (runs arbitrary code) and from activation (binding to a live namespaced
//! router). The loader is the load-and-wrap primitive behind the second
//! stage: the orchestration core never interprets artifact contents.

use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::context::{AppContext, HandlerContext};
use crate::traits::router::Router;

/// A resolved model object, as handed to a model registrar.
pub type ModelObject = Arc<dyn Any + Send + Sync>;

/// Loaded form of a module's entry point. Invoked exactly once, at mount
/// time, against the owning application's context; its side effects
/// happen there.
#[async_trait]
pub trait ModuleEntry: Send + Sync + std::fmt::Debug {
    /// Run the entry point.
    async fn init(&self, ctx: &dyn AppContext) -> Result<()>;
}

/// Loaded, unwrapped form of a module's router artifact.
///
/// Invoked at activation time with the arguments the mount itself
/// received; the hook's use of them is owned by the module author.
pub trait RouterHook: Send + Sync {
    /// Bind the module's routes under the supplied namespaced router.
    fn mount(
        &self,
        ctx: &dyn HandlerContext,
        router: Box<dyn Router>,
        models: Option<&dyn ModelRegistrar>,
    ) -> Result<()>;
}

/// Loaded form of a model artifact; builds one model object per call.
pub trait ModelFactory: Send + Sync {
    /// Build the model object.
    fn build(&self) -> ModelObject;
}

/// Registration capability for resolved model objects.
pub trait ModelRegistrar: Send + Sync {
    /// Register one resolved model object.
    fn register(&self, model: ModelObject);
}

/// Loads module artifacts from their filesystem paths.
///
/// Implementations decide what an artifact is (a wasm component, a shared
/// object, a statically registered constructor); the mounter only relies
/// on loading being deferred until it asks.
#[async_trait]
pub trait ArtifactLoader: Send + Sync {
    /// Load a module entry point.
    async fn load_entry(&self, path: &Path) -> Result<Arc<dyn ModuleEntry>>;

    /// Load a module router hook, without invoking it.
    async fn load_router(&self, path: &Path) -> Result<Arc<dyn RouterHook>>;

    /// Load a model factory, without invoking it.
    async fn load_model(&self, path: &Path) -> Result<Arc<dyn ModelFactory>>;
}
