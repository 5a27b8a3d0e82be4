//! Cluster message schema shared by coordinator and workers.

use serde::{Deserialize, Serialize};

use crate::id::WorkerId;

/// Structured message sent from a worker process to the coordinator.
///
/// The wire shape is `{"type": ..., "data": {...}}`. The log-aggregation
/// bridge forwards `logging` messages and ignores every other shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WorkerMessage {
    /// A log line produced by a worker, to be re-emitted by the coordinator
    #[serde(rename = "logging")]
    Logging {
        #[serde(rename = "workerID")]
        worker_id: WorkerId,
        message: String,
    },

    /// Liveness beacon; not consumed by the logging bridge
    #[serde(rename = "heartbeat")]
    Heartbeat {
        #[serde(rename = "workerID")]
        worker_id: WorkerId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_message_wire_shape() {
        let id = WorkerId::new();
        let msg = WorkerMessage::Logging {
            worker_id: id,
            message: "listening".to_string(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "logging");
        assert_eq!(value["data"]["workerID"], serde_json::json!(id));
        assert_eq!(value["data"]["message"], "listening");

        let back: WorkerMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }
}
