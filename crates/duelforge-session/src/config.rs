//! Coordinator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default delay between a terminal state and teardown.
pub const DEFAULT_TEARDOWN_GRACE_MS: u64 = 5_000;

/// Tunables for a [`Coordinator`](crate::Coordinator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// How long a finished session stays around so both participants can
    /// render the final board, in milliseconds.
    pub teardown_grace_ms: u64,
}

impl CoordinatorConfig {
    /// Config with the given grace period.
    pub fn with_grace(grace: Duration) -> Self {
        Self {
            teardown_grace_ms: grace.as_millis() as u64,
        }
    }

    /// The grace period as a `Duration`.
    pub fn teardown_grace(&self) -> Duration {
        Duration::from_millis(self.teardown_grace_ms)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            teardown_grace_ms: DEFAULT_TEARDOWN_GRACE_MS,
        }
    }
}
