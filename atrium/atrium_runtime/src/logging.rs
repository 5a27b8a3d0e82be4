//! Logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize the global `tracing` subscriber with an info-level default.
pub fn init() {
    init_with_filter("info");
}

/// Initialize the global `tracing` subscriber, honoring `RUST_LOG` and
/// falling back to `default_filter`. Repeated initialization is a no-op.
pub fn init_with_filter(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
