//! Start/stop lifecycle shared by every long-running piece of the rig.
//!
//! A [`BackgroundWorker`] does not know what it runs. Owners hand it a body
//! (`FnOnce(CancellationToken) -> Future`) at `start`; the worker spawns the
//! body under a child of the caller's token, tracks [`WorkerState`] and fires
//! a [`Completion`] when the body returns.
//!
//! ## Contract
//!
//! - `stop` on a worker that was never started returns immediately.
//! - `stop` cancels the worker's own token, then waits for the body. If the
//!   wait times out the caller gets [`RelayError::StopTimedOut`] and the body is
//!   left running; nothing is aborted.
//! - Cancelling the parent token has the same effect on the body as `stop`,
//!   without anyone waiting.
//! - When the body returns, its token is cancelled, so anything the body
//!   started under it winds down too.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{Completion, CompletionSignal};
use crate::domain::{RelayError, WorkerState};

/// Lifecycle wrapper around a spawned body.
#[derive(Debug)]
pub struct BackgroundWorker {
    name: String,
    state: Arc<Mutex<WorkerState>>,
    running: Mutex<Option<RunningBody>>,
}

#[derive(Debug)]
struct RunningBody {
    cancel: CancellationToken,
    completion: Completion,
}

/// Marks the worker stopped and fires completion when the body's task ends,
/// including by panic.
struct FinishGuard {
    state: Arc<Mutex<WorkerState>>,
    signal: CompletionSignal,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        *self.state.lock() = WorkerState::Stopped;
        self.signal.signal();
    }
}

impl BackgroundWorker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(WorkerState::Created)),
            running: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock()
    }

    /// Completion of the most recent run, if the worker was ever started.
    pub fn completion(&self) -> Option<Completion> {
        self.running.lock().as_ref().map(|r| r.completion.clone())
    }

    /// Spawn `body` under a child of `parent`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::AlreadyRunning`] if a previous run has not
    /// finished yet.
    pub fn start<F, Fut>(
        &self,
        parent: &CancellationToken,
        body: F,
    ) -> Result<Completion, RelayError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<(), RelayError>> + Send + 'static,
    {
        let mut running = self.running.lock();
        {
            let mut state = self.state.lock();
            if state.is_active() {
                return Err(RelayError::AlreadyRunning {
                    worker: self.name.clone(),
                });
            }
            *state = WorkerState::Running;
        }

        let cancel = parent.child_token();
        let (signal, completion) = CompletionSignal::pair();
        let body = body(cancel.clone());
        let guard = FinishGuard {
            state: Arc::clone(&self.state),
            signal,
        };
        let name = self.name.clone();
        let token = cancel.clone();

        tokio::spawn(async move {
            let guard = guard;
            tokio::pin!(body);
            let outcome = tokio::select! {
                outcome = &mut body => outcome,
                () = token.cancelled() => {
                    {
                        let mut state = guard.state.lock();
                        if *state == WorkerState::Running {
                            *state = WorkerState::Stopping;
                        }
                    }
                    body.await
                }
            };

            token.cancel();
            match outcome {
                Ok(()) => debug!(worker = %name, "Worker finished"),
                Err(e) => warn!(worker = %name, error = %e, "Worker finished with error"),
            }
            drop(guard);
        });

        debug!(worker = %self.name, "Worker started");
        *running = Some(RunningBody {
            cancel,
            completion: completion.clone(),
        });
        Ok(completion)
    }

    /// Request cancellation without waiting for the body.
    pub fn cancel(&self) {
        if let Some(running) = self.running.lock().as_ref() {
            self.mark_stopping();
            running.cancel.cancel();
        }
    }

    /// Cancel the body and wait up to `timeout` for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::StopTimedOut`] if the body is still running when
    /// the timeout expires.
    pub async fn stop(&self, timeout: Duration) -> Result<(), RelayError> {
        let Some((cancel, completion)) = self
            .running
            .lock()
            .as_ref()
            .map(|r| (r.cancel.clone(), r.completion.clone()))
        else {
            return Ok(());
        };

        self.mark_stopping();
        cancel.cancel();

        tokio::time::timeout(timeout, completion.wait())
            .await
            .map_err(|_| RelayError::StopTimedOut {
                worker: self.name.clone(),
                timeout,
            })
    }

    fn mark_stopping(&self) {
        let mut state = self.state.lock();
        if *state == WorkerState::Running {
            *state = WorkerState::Stopping;
        }
    }
}
