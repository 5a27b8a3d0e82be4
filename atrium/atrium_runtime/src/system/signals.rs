//! Process exit handling.
//!
//! One exit routine owns process termination: cleanup runs at most once
//! no matter how many signals arrive, and exactly one exit path executes
//! per process. Termination itself is pluggable so supervision logic
//! stays testable without killing the test runner.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info};

/// Function invoked to terminate the process.
pub type Terminator = Arc<dyn Fn(i32) + Send + Sync>;

/// Idempotent shutdown hook.
///
/// `cleanup` is guarded so repeated signals after the first are no-ops;
/// the cleanup log line is emitted at most once per process.
pub struct ExitHandler {
    cleanup_done: AtomicBool,
    terminator: Terminator,
}

impl ExitHandler {
    /// Exit handler that terminates via `std::process::exit`.
    pub fn new() -> Self {
        Self::with_terminator(Arc::new(|code| std::process::exit(code)))
    }

    /// Exit handler with a custom termination function.
    pub fn with_terminator(terminator: Terminator) -> Self {
        Self {
            cleanup_done: AtomicBool::new(false),
            terminator,
        }
    }

    /// Run the cleanup routine. Safe to call from any exit path; only
    /// the first call does anything.
    pub fn cleanup(&self) {
        if self.cleanup_done.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("cleanup");
    }

    /// Whether cleanup has already run.
    pub fn has_cleaned_up(&self) -> bool {
        self.cleanup_done.load(Ordering::SeqCst)
    }

    /// Clean shutdown: cleanup, then terminate with `code`.
    pub fn exit(&self, code: i32) {
        self.cleanup();
        info!("Closing Atrium");
        (self.terminator)(code);
    }

    /// Fatal shutdown: log the cause, then terminate with status 1.
    pub fn fatal(&self, cause: &str) {
        error!("{}", cause);
        self.exit(1);
    }

    /// Forced immediate termination, no cleanup. Honors an external kill
    /// instruction.
    pub fn kill(&self) {
        (self.terminator)(0);
    }
}

impl Default for ExitHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Listen for the interactive interrupt and run the clean exit path.
pub fn bind_interrupt(exit: Arc<ExitHandler>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => exit.exit(0),
            Err(e) => exit.fatal(&format!("Failed to listen for interrupt: {}", e)),
        }
    })
}

/// Listen for the external kill instruction (SIGTERM) and terminate
/// immediately, without cleanup.
#[cfg(unix)]
pub fn bind_kill(exit: Arc<ExitHandler>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut terminate = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(e) => {
                error!("Failed to bind kill signal: {}", e);
                return;
            }
        };
        terminate.recv().await;
        exit.kill();
    })
}

#[cfg(not(unix))]
pub fn bind_kill(_exit: Arc<ExitHandler>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async {})
}

/// Route uncaught failures through the fatal exit path: log, then
/// terminate with status 1.
pub fn bind_failure_hook(exit: Arc<ExitHandler>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        previous(panic_info);
        exit.fatal(&format!("Uncaught failure: {}", panic_info));
    }));
}
