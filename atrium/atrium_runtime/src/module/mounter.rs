//! Module mounter.
//!
//! Produces the two-stage deferred-execution wrapper that decouples
//! module discovery time from load time, and load time from
//! namespaced-mount time. Collapsing the stages would either force eager
//! loading of every module at startup or prevent namespaces from being
//! computed before module router code runs.

use std::sync::Arc;

use anyhow::Result;
use atrium_core::error::ModuleError;
use atrium_core::traits::{
    AppContext, ArtifactLoader, HandlerContext, ModelFactory, ModelRegistrar, Router, RouterHook,
};
use atrium_core::types::ModuleArtifacts;
use tracing::debug;

/// Stage 1: a collected module whose artifacts have been validated but
/// not loaded. Wrapping performs no I/O; module code first runs when
/// `mount` is invoked.
pub struct LoadedModule {
    name: String,
    artifacts: ModuleArtifacts,
    loader: Arc<dyn ArtifactLoader>,
}

impl LoadedModule {
    /// Wrap a module's artifacts for deferred loading.
    pub fn wrap(
        name: impl Into<String>,
        artifacts: ModuleArtifacts,
        loader: Arc<dyn ArtifactLoader>,
    ) -> Self {
        Self {
            name: name.into(),
            artifacts,
            loader,
        }
    }

    /// Module name; doubles as its URL namespace segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run stage 1: load and immediately invoke the entry point against
    /// the application context, load the router hook unwrapped, and load
    /// each model factory uninvoked. Returns the stage-2 mount.
    pub async fn mount(&self, ctx: &dyn AppContext) -> Result<MountedModule> {
        debug!("Mounting module: {}", self.name);

        let entry = self
            .loader
            .load_entry(&self.artifacts.entry)
            .await
            .map_err(|e| self.load_error(e))?;

        // entry-point side effects happen here
        entry.init(ctx).await.map_err(|e| self.load_error(e))?;

        let router = match &self.artifacts.router {
            Some(path) => Some(
                self.loader
                    .load_router(path)
                    .await
                    .map_err(|e| self.load_error(e))?,
            ),
            None => None,
        };

        let mut models = Vec::with_capacity(self.artifacts.models.len());
        for path in &self.artifacts.models {
            models.push(
                self.loader
                    .load_model(path)
                    .await
                    .map_err(|e| self.load_error(e))?,
            );
        }

        Ok(MountedModule {
            name: self.name.clone(),
            router,
            models,
        })
    }

    fn load_error(&self, cause: atrium_core::Error) -> anyhow::Error {
        ModuleError::LoadFailed {
            module: self.name.clone(),
            reason: cause.to_string(),
        }
        .into()
    }
}

/// Stage 2: a mounted module, ready to bind to a live namespaced router.
pub struct MountedModule {
    name: String,
    router: Option<Arc<dyn RouterHook>>,
    models: Vec<Arc<dyn ModelFactory>>,
}

impl std::fmt::Debug for MountedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountedModule")
            .field("name", &self.name)
            .field("router", &self.router.is_some())
            .field("models", &self.models.len())
            .finish()
    }
}

impl MountedModule {
    /// Module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the router hook with the arguments this mount received
    /// (transparent forwarding; a no-op stands in when the module had no
    /// router), then build and register each model object if a registrar
    /// was supplied.
    pub fn run(
        &self,
        ctx: &dyn HandlerContext,
        router: Box<dyn Router>,
        models: Option<&dyn ModelRegistrar>,
    ) -> Result<()> {
        if let Some(hook) = &self.router {
            hook.mount(ctx, router, models)
                .map_err(|e| ModuleError::LoadFailed {
                    module: self.name.clone(),
                    reason: e.to_string(),
                })?;
        }

        if !self.models.is_empty() {
            if let Some(registrar) = models {
                for factory in &self.models {
                    registrar.register(factory.build());
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use atrium_core::error::Result as CoreResult;
    use atrium_core::traits::{ModelObject, ModuleEntry, PrefixRouter};
    use parking_lot::Mutex;
    use serde_json::Value;

    use crate::module::loader::RegistryLoader;

    struct TestContext;

    impl AppContext for TestContext {
        fn app_name(&self) -> Option<&str> {
            Some("blog")
        }
        fn app_dir(&self) -> &Path {
            Path::new("/apps/blog")
        }
        fn mode(&self) -> &str {
            "test"
        }
        fn config_value(&self, _key: &str) -> Option<Value> {
            None
        }
        fn cache_get(&self, _key: &str) -> Option<Value> {
            None
        }
        fn cache_put(&self, _key: &str, _value: Value) {}
    }

    impl HandlerContext for TestContext {}

    #[derive(Debug)]
    struct CountingEntry {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ModuleEntry for CountingEntry {
        async fn init(&self, _ctx: &dyn AppContext) -> CoreResult<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct RecordingRouter {
        prefixes: Arc<Mutex<Vec<String>>>,
    }

    impl RouterHook for RecordingRouter {
        fn mount(
            &self,
            _ctx: &dyn HandlerContext,
            router: Box<dyn Router>,
            _models: Option<&dyn ModelRegistrar>,
        ) -> CoreResult<()> {
            self.prefixes.lock().push(router.prefix().to_string());
            Ok(())
        }
    }

    struct StringModel;

    impl ModelFactory for StringModel {
        fn build(&self) -> ModelObject {
            Arc::new("user-model".to_string())
        }
    }

    struct CollectingRegistrar {
        models: Arc<Mutex<Vec<ModelObject>>>,
    }

    impl ModelRegistrar for CollectingRegistrar {
        fn register(&self, model: ModelObject) {
            self.models.lock().push(model);
        }
    }

    fn artifacts() -> ModuleArtifacts {
        ModuleArtifacts {
            entry: PathBuf::from("/m/users/index.wasm"),
            router: Some(PathBuf::from("/m/users/router.wasm")),
            models: vec![PathBuf::from("/m/users/models/user.wasm")],
        }
    }

    fn loader_with(runs: Arc<AtomicUsize>, prefixes: Arc<Mutex<Vec<String>>>) -> Arc<RegistryLoader> {
        let loader = Arc::new(RegistryLoader::new());
        loader.register_entry("/m/users/index.wasm", Arc::new(CountingEntry { runs }));
        loader.register_router("/m/users/router.wasm", Arc::new(RecordingRouter { prefixes }));
        loader.register_model("/m/users/models/user.wasm", Arc::new(StringModel));
        loader
    }

    #[tokio::test]
    async fn wrapping_defers_all_loading() {
        let runs = Arc::new(AtomicUsize::new(0));
        let loader = loader_with(runs.clone(), Arc::new(Mutex::new(Vec::new())));

        let _wrapped = LoadedModule::wrap("users", artifacts(), loader);

        // nothing executed until mount
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn mount_runs_the_entry_exactly_once_and_defers_the_router() {
        let runs = Arc::new(AtomicUsize::new(0));
        let prefixes = Arc::new(Mutex::new(Vec::new()));
        let loader = loader_with(runs.clone(), prefixes.clone());

        let wrapped = LoadedModule::wrap("users", artifacts(), loader);
        let mounted = wrapped.mount(&TestContext).await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        // router loaded but not yet invoked
        assert!(prefixes.lock().is_empty());

        mounted
            .run(&TestContext, Box::new(PrefixRouter::scoped("/users")), None)
            .unwrap();
        assert_eq!(*prefixes.lock(), vec!["/users".to_string()]);
    }

    #[tokio::test]
    async fn models_register_only_when_a_registrar_is_supplied() {
        let loader = loader_with(
            Arc::new(AtomicUsize::new(0)),
            Arc::new(Mutex::new(Vec::new())),
        );
        let mounted = LoadedModule::wrap("users", artifacts(), loader)
            .mount(&TestContext)
            .await
            .unwrap();

        // no registrar: model factories stay uninvoked
        mounted
            .run(&TestContext, Box::new(PrefixRouter::root()), None)
            .unwrap();

        let collected = Arc::new(Mutex::new(Vec::new()));
        let registrar = CollectingRegistrar {
            models: collected.clone(),
        };
        mounted
            .run(&TestContext, Box::new(PrefixRouter::root()), Some(&registrar))
            .unwrap();

        let models = collected.lock();
        assert_eq!(models.len(), 1);
        let model = models[0]
            .clone()
            .downcast::<String>()
            .expect("model object should be the registered string");
        assert_eq!(*model, "user-model");
    }

    #[tokio::test]
    async fn missing_router_artifact_leaves_a_safe_noop() {
        let runs = Arc::new(AtomicUsize::new(0));
        let loader = Arc::new(RegistryLoader::new());
        loader.register_entry(
            "/m/bare/index.wasm",
            Arc::new(CountingEntry { runs: runs.clone() }),
        );

        let wrapped = LoadedModule::wrap(
            "bare",
            ModuleArtifacts::entry_only("/m/bare/index.wasm"),
            loader,
        );
        let mounted = wrapped.mount(&TestContext).await.unwrap();

        // stage 2 is always safely callable
        mounted
            .run(&TestContext, Box::new(PrefixRouter::scoped("/bare")), None)
            .unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unregistered_entry_fails_the_mount() {
        let loader = Arc::new(RegistryLoader::new());
        let wrapped = LoadedModule::wrap(
            "ghost",
            ModuleArtifacts::entry_only("/m/ghost/index.wasm"),
            loader,
        );

        let err = wrapped.mount(&TestContext).await.unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }
}
