//! Server driver contract.

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::router::Router;

/// Network-listening collaborator an application drives at start/stop.
///
/// Listening internals (protocol, sockets, dispatch) are out of the
/// orchestration core's scope; the application only sequences the driver
/// and mounts module routers under its root router.
#[async_trait]
pub trait ServerDriver: Send + Sync {
    /// Bring up network listening.
    async fn start(&self) -> Result<()>;

    /// Tear network listening down.
    async fn stop(&self) -> Result<()>;

    /// The root router module routers are namespaced under.
    fn root_router(&self) -> Box<dyn Router>;
}
