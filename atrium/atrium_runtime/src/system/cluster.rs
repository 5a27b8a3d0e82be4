//! Cluster log aggregation.
//!
//! In a coordinator/worker fan-out, workers share no memory with the
//! coordinator and communicate only through structured messages. The
//! coordinator's one shared channel is the log-aggregation bridge: it
//! re-emits worker log lines through its own logger tagged with the
//! worker's identifier. The bridge is an aggregation, not a transform;
//! message content passes through unmodified, and any non-logging
//! message shape is ignored. Ordering is FIFO per worker only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use atrium_core::id::WorkerId;
use atrium_core::types::WorkerMessage;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Sink receiving aggregated worker log lines.
pub type LogSink = Arc<dyn Fn(WorkerId, String) + Send + Sync>;

struct WorkerChannel {
    id: WorkerId,
    rx: mpsc::Receiver<WorkerMessage>,
}

/// Worker-side handle for sending structured messages to the
/// coordinator.
#[derive(Clone)]
pub struct WorkerHandle {
    id: WorkerId,
    tx: mpsc::Sender<WorkerMessage>,
}

impl WorkerHandle {
    /// This worker's identifier.
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Send a structured message to the coordinator. FIFO per worker.
    pub async fn send(&self, message: WorkerMessage) -> Result<(), mpsc::error::SendError<WorkerMessage>> {
        self.tx.send(message).await
    }

    /// Send a log line to the coordinator.
    pub async fn log(&self, message: impl Into<String>) -> Result<(), mpsc::error::SendError<WorkerMessage>> {
        self.send(WorkerMessage::Logging {
            worker_id: self.id,
            message: message.into(),
        })
        .await
    }
}

/// Coordinator-side worker registry and log-aggregation bridge.
pub struct ClusterCoordinator {
    online_tx: mpsc::UnboundedSender<WorkerChannel>,
    online_rx: Mutex<Option<mpsc::UnboundedReceiver<WorkerChannel>>>,
    logging_started: AtomicBool,
    sink: LogSink,
}

impl ClusterCoordinator {
    /// Coordinator whose bridge re-emits through `tracing`.
    pub fn new() -> Self {
        Self::with_log_sink(Arc::new(|worker_id, message| {
            info!("WorkerID: {} | {}", worker_id, message);
        }))
    }

    /// Coordinator with a custom aggregation sink.
    pub fn with_log_sink(sink: LogSink) -> Self {
        let (online_tx, online_rx) = mpsc::unbounded_channel();
        Self {
            online_tx,
            online_rx: Mutex::new(Some(online_rx)),
            logging_started: AtomicBool::new(false),
            sink,
        }
    }

    /// Register a worker coming online, returning its message handle.
    pub fn register_worker(&self) -> WorkerHandle {
        let id = WorkerId::new();
        let (tx, rx) = mpsc::channel(64);

        if self.online_tx.send(WorkerChannel { id, rx }).is_err() {
            warn!("Worker {} registered after coordinator shutdown", id);
        } else {
            info!("Worker online: {}", id);
        }

        WorkerHandle { id, tx }
    }

    /// Install the log-aggregation bridge: for every worker that comes
    /// online, drain its message channel, forwarding `logging` messages
    /// to the sink and ignoring every other shape. Installing more than
    /// once is a no-op.
    pub fn setup_workers_logging(&self) {
        if self.logging_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let Some(mut online_rx) = self.online_rx.lock().take() else {
            return;
        };
        let sink = self.sink.clone();

        tokio::spawn(async move {
            while let Some(WorkerChannel { id, mut rx }) = online_rx.recv().await {
                let sink = sink.clone();
                tokio::spawn(async move {
                    while let Some(message) = rx.recv().await {
                        match message {
                            WorkerMessage::Logging { worker_id, message } => {
                                sink(worker_id, message);
                            }
                            _ => {
                                // not a logging message; the bridge ignores it
                            }
                        }
                    }
                    info!("Worker offline: {}", id);
                });
            }
        });
    }
}

impl Default for ClusterCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
