//! Extension and extension-resolver contracts.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::traits::context::AppContext;
use crate::types::extension::ExtensionDescriptor;

/// A resolved cross-cutting capability, installable into an application
/// at boot.
///
/// All members are optional: a purely declarative extension contributes
/// only a config namespace and payload, while a behavioral one overrides
/// `install` to attach middleware, routes, or other capabilities.
#[async_trait]
pub trait Extension: Send + Sync + std::fmt::Debug {
    /// Namespace under which this extension's config appears in the
    /// application configuration.
    fn config_namespace(&self) -> Option<&str> {
        None
    }

    /// The extension's own configuration payload.
    fn config(&self) -> Option<Value> {
        None
    }

    /// Install hook, invoked once during application boot. Failures
    /// propagate as application boot failures.
    async fn install(&self, _ctx: &dyn AppContext) -> Result<()> {
        Ok(())
    }
}

/// Maps an extension descriptor to a loaded extension object.
///
/// The registry is agnostic of the loading mechanism; resolution failures
/// must carry the underlying loader's reason verbatim, since the original
/// failure is the most actionable diagnostic.
#[async_trait]
pub trait ExtensionResolver: Send + Sync {
    /// Resolve `descriptor` into a loaded extension.
    async fn resolve(&self, descriptor: &ExtensionDescriptor) -> Result<Arc<dyn Extension>>;
}
