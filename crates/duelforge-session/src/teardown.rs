//! Deferred teardown after a session reaches a terminal state.
//!
//! Each scheduled teardown is a small Tokio task that sleeps for the grace
//! period and then posts the session id to an expiry channel. Whoever
//! drives the coordinator drains that channel and calls
//! [`Coordinator::expire`](crate::Coordinator::expire), so the actual
//! teardown still runs as an ordinary, one-at-a-time coordinator event.
//!
//! Cancelling aborts the sleeper. A sleeper that fires anyway (it lost the
//! race with the abort) is harmless: teardown is idempotent.

use std::collections::HashMap;
use std::time::Duration;

use duelforge_protocol::SessionId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Receiving end of the expiry channel.
pub type TeardownReceiver = mpsc::UnboundedReceiver<SessionId>;

/// Pending teardown timers, keyed by session.
#[derive(Debug)]
pub struct TeardownScheduler {
    grace: Duration,
    expired_tx: mpsc::UnboundedSender<SessionId>,
    pending: HashMap<SessionId, JoinHandle<()>>,
}

impl TeardownScheduler {
    /// Creates a scheduler and the receiver its timers post to.
    pub fn new(grace: Duration) -> (Self, TeardownReceiver) {
        let (expired_tx, expired_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            grace,
            expired_tx,
            pending: HashMap::new(),
        };
        (scheduler, expired_rx)
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Starts the grace timer for `id`. Returns `false` if one is already
    /// running for that session.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule(&mut self, id: SessionId) -> bool {
        if self.pending.contains_key(&id) {
            return false;
        }
        // Deadline is fixed now, not when the task first gets polled.
        let deadline = Instant::now() + self.grace;
        let tx = self.expired_tx.clone();
        let expired = id.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = tx.send(expired);
        });
        tracing::debug!(session_id = %id, grace_ms = self.grace.as_millis() as u64, "teardown scheduled");
        self.pending.insert(id, handle);
        true
    }

    /// Cancels the timer for `id`, if any. Returns `true` if one was running.
    pub fn cancel(&mut self, id: &SessionId) -> bool {
        match self.pending.remove(id) {
            Some(handle) => {
                handle.abort();
                tracing::debug!(session_id = %id, "teardown timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Forgets the timer for `id` after it fired.
    pub fn complete(&mut self, id: &SessionId) {
        self.pending.remove(id);
    }

    pub fn is_pending(&self, id: &SessionId) -> bool {
        self.pending.contains_key(id)
    }

    /// Number of running timers.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Drop for TeardownScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }
}
