//! Strongly-typed identifiers for the Atrium system.
//!
//! Identifiers are thin wrappers around UUIDs so that ids for different
//! entity kinds cannot be mixed up. Applications and modules are addressed
//! by name throughout the orchestration core; the only entity that needs a
//! generated identity is a cluster worker.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a cluster worker process.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct WorkerId(Uuid);

impl WorkerId {
    /// Create a new random worker id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for WorkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WorkerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(WorkerId::new(), WorkerId::new());
    }

    #[test]
    fn round_trips_through_display() {
        let id = WorkerId::new();
        let parsed = WorkerId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }
}
