//! Worker states and connection identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle state of a [`crate::BackgroundWorker`].
///
/// `Created → Running → Stopping → Stopped`; a stopped worker may be started
/// again, which moves it back to `Running`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WorkerState {
    /// Constructed, never started.
    #[default]
    Created,
    /// Body is executing.
    Running,
    /// Cancellation requested, body has not returned yet.
    Stopping,
    /// Body has returned.
    Stopped,
}

impl WorkerState {
    /// `true` while a body is executing (including while it winds down).
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, WorkerState::Running | WorkerState::Stopping)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Created => "created",
            WorkerState::Running => "running",
            WorkerState::Stopping => "stopping",
            WorkerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a connection worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate the next identifier.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
