//! End-to-end orchestration tests: discovery, boot, extension install,
//! module mounting, start/stop sequencing, and failure containment.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use atrium_core::error::Result as CoreResult;
use atrium_core::traits::{
    AppContext, ExtensionResolver, HandlerContext, ModelRegistrar, ModuleEntry, Router, RouterHook,
};
use atrium_core::types::{AppState, ExtensionDescriptor};
use atrium_core::Extension;
use atrium_runtime::module::RegistryLoader;
use atrium_runtime::system::signals::ExitHandler;
use atrium_runtime::{Orchestrator, OrchestratorParams};
use parking_lot::Mutex;
use tempfile::TempDir;

/// Entry point recording which application context it ran against.
#[derive(Debug)]
struct RecordingEntry {
    tag: String,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ModuleEntry for RecordingEntry {
    async fn init(&self, ctx: &dyn AppContext) -> CoreResult<()> {
        self.log
            .lock()
            .push(format!("init:{}@{}", self.tag, ctx.app_name().unwrap_or("core")));
        Ok(())
    }
}

/// Router hook recording the namespace it was mounted under.
struct RecordingRouter {
    log: Arc<Mutex<Vec<String>>>,
}

impl RouterHook for RecordingRouter {
    fn mount(
        &self,
        _ctx: &dyn HandlerContext,
        router: Box<dyn Router>,
        _models: Option<&dyn ModelRegistrar>,
    ) -> CoreResult<()> {
        self.log.lock().push(format!("mount:{}", router.prefix()));
        Ok(())
    }
}

/// Extension recording install invocations.
#[derive(Debug)]
struct RecordingExtension {
    name: String,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Extension for RecordingExtension {
    fn config_namespace(&self) -> Option<&str> {
        Some("audit")
    }

    async fn install(&self, ctx: &dyn AppContext) -> CoreResult<()> {
        self.log.lock().push(format!(
            "install:{}@{}",
            self.name,
            ctx.app_name().unwrap_or("core")
        ));
        Ok(())
    }
}

struct RecordingResolver {
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ExtensionResolver for RecordingResolver {
    async fn resolve(
        &self,
        descriptor: &ExtensionDescriptor,
    ) -> CoreResult<Arc<dyn Extension>> {
        Ok(Arc::new(RecordingExtension {
            name: descriptor.name.clone(),
            log: self.log.clone(),
        }))
    }
}

fn scaffold_module(app_dir: &Path, name: &str, loader: &RegistryLoader, log: &Arc<Mutex<Vec<String>>>) {
    let module_dir = app_dir.join("modules").join(name);
    std::fs::create_dir_all(&module_dir).unwrap();

    let entry = module_dir.join("index.wasm");
    let router = module_dir.join("router.wasm");
    std::fs::write(&entry, b"").unwrap();
    std::fs::write(&router, b"").unwrap();

    loader.register_entry(
        &entry,
        Arc::new(RecordingEntry {
            tag: name.to_string(),
            log: log.clone(),
        }),
    );
    loader.register_router(&router, Arc::new(RecordingRouter { log: log.clone() }));
}

#[tokio::test]
async fn full_boot_and_shutdown_sequence() {
    let dir = TempDir::new().unwrap();
    let apps_dir = dir.path().join("apps");
    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let loader = Arc::new(RegistryLoader::new());

    // blog carries two modules, shop one; README is a stray file
    let blog_dir = apps_dir.join("blog");
    scaffold_module(&blog_dir, "comments", &loader, &log);
    scaffold_module(&blog_dir, "posts", &loader, &log);

    let shop_dir = apps_dir.join("shop");
    scaffold_module(&shop_dir, "checkout", &loader, &log);

    std::fs::write(apps_dir.join("README"), b"stray").unwrap();

    // blog declares one extension in its own config
    let blog_config_dir = blog_dir.join("config");
    std::fs::create_dir_all(&blog_config_dir).unwrap();
    std::fs::write(
        blog_config_dir.join("default.json"),
        r#"{"extensions": [{"name": "audit", "module": "audit-pkg"}]}"#,
    )
    .unwrap();

    let mut params = OrchestratorParams::new(apps_dir, dir.path().join("config"), "test");
    params.loader = Some(loader);
    params.resolver = Some(Arc::new(RecordingResolver { log: log.clone() }));

    let orchestrator = Orchestrator::initialize(params).await.unwrap();

    // registration order is directory order, stray file skipped
    assert_eq!(
        orchestrator.app_names().await,
        vec!["blog".to_string(), "shop".to_string()]
    );

    // boot ran install hooks and entry points, in order; routers are
    // still unmounted
    {
        let booted = log.lock();
        assert_eq!(
            *booted,
            vec![
                "install:audit@blog".to_string(),
                "init:comments@blog".to_string(),
                "init:posts@blog".to_string(),
                "init:checkout@shop".to_string()
            ]
        );
    }

    // the resolved config was memoized in each application's cache
    let blog = orchestrator.app("blog").await.unwrap();
    let cached = blog.cache().get("config").unwrap();
    assert_eq!(cached["name"], "blog");

    // starting binds each module's router under its own namespace
    orchestrator.start(None).await.unwrap();
    {
        let after_start = log.lock();
        assert_eq!(
            after_start[4..],
            [
                "mount:/comments".to_string(),
                "mount:/posts".to_string(),
                "mount:/checkout".to_string()
            ]
        );
    }

    for app in orchestrator.apps().await {
        assert_eq!(app.state().await, AppState::Running);
    }

    orchestrator.stop().await.unwrap();
    assert_eq!(orchestrator.root().state().await, AppState::Stopped);
    assert!(orchestrator.exit_handler().has_cleaned_up());
}

#[tokio::test]
async fn sub_application_error_after_start_is_fatal_to_the_process() {
    let dir = TempDir::new().unwrap();
    let apps_dir = dir.path().join("apps");
    std::fs::create_dir_all(apps_dir.join("blog")).unwrap();
    std::fs::create_dir_all(apps_dir.join("shop")).unwrap();
    std::fs::write(apps_dir.join("README"), b"stray").unwrap();

    let codes: Arc<Mutex<Vec<i32>>> = Arc::new(Mutex::new(Vec::new()));
    let exit = {
        let codes = codes.clone();
        Arc::new(ExitHandler::with_terminator(Arc::new(move |code| {
            codes.lock().push(code);
        })))
    };

    let params = OrchestratorParams::new(apps_dir, dir.path().join("config"), "test");
    let orchestrator = Orchestrator::initialize_with_exit(params, exit.clone())
        .await
        .unwrap();

    orchestrator.start(None).await.unwrap();
    assert_eq!(
        orchestrator.app("blog").await.unwrap().state().await,
        AppState::Running
    );

    orchestrator
        .app("shop")
        .await
        .unwrap()
        .raise_error("listener crashed")
        .await;

    for _ in 0..50 {
        if !codes.lock().is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    // fatal exit with status 1, even though blog started successfully
    assert_eq!(*codes.lock(), vec![1]);
    assert!(exit.has_cleaned_up());
}

#[tokio::test]
async fn failing_module_entry_surfaces_as_the_applications_error() {
    let dir = TempDir::new().unwrap();
    let apps_dir = dir.path().join("apps");

    // artifacts exist on disk but nothing is registered in the loader,
    // so the entry load fails during registration
    let module_dir = apps_dir.join("blog").join("modules").join("posts");
    std::fs::create_dir_all(&module_dir).unwrap();
    std::fs::write(module_dir.join("index.wasm"), b"").unwrap();
    std::fs::write(module_dir.join("router.wasm"), b"").unwrap();

    let params = OrchestratorParams::new(apps_dir, dir.path().join("config"), "test");
    let err = Orchestrator::initialize(params).await.unwrap_err();

    assert!(err.to_string().contains("blog"));
}
