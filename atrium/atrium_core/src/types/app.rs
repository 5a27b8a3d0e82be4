//! Application lifecycle state and events.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an application.
///
/// `Created` → `Booting` → `Ready` → `Running` → `Stopped`, with `Failed`
/// reachable from any pre-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppState {
    /// Constructed, boot not begun
    Created,

    /// Boot sequence in progress
    Booting,

    /// Boot complete, not yet listening
    Ready,

    /// Listening and serving
    Running,

    /// Listening torn down
    Stopped,

    /// Boot or runtime failure
    Failed,
}

/// Terminal lifecycle event emitted by an application.
///
/// Exactly one of these fires per boot, exactly once; a post-boot runtime
/// fault may additionally surface as an `Error` event, which the
/// orchestrator treats as fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppLifecycleEvent {
    /// The application completed its boot sequence
    Ready {
        /// Declared application name; `None` for the root application
        name: Option<String>,
    },

    /// The application failed to boot, or raised a runtime fault
    Error {
        /// Human-readable failure cause
        cause: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_compare_by_content() {
        let a = AppLifecycleEvent::Ready {
            name: Some("blog".to_string()),
        };
        let b = AppLifecycleEvent::Ready {
            name: Some("blog".to_string()),
        };
        assert_eq!(a, b);
        assert_ne!(
            a,
            AppLifecycleEvent::Error {
                cause: "boom".to_string()
            }
        );
    }
}
