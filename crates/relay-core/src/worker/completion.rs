//! One-shot completion notification.

use tokio::sync::watch;

/// Sending half: fires the notification.
#[derive(Debug)]
pub struct CompletionSignal {
    tx: watch::Sender<bool>,
}

/// Receiving half: any number of clones may wait on it.
#[derive(Clone, Debug)]
pub struct Completion {
    rx: watch::Receiver<bool>,
}

impl CompletionSignal {
    /// Create a linked signal/listener pair.
    #[must_use]
    pub fn pair() -> (CompletionSignal, Completion) {
        let (tx, rx) = watch::channel(false);
        (CompletionSignal { tx }, Completion { rx })
    }

    /// Fire the notification.
    ///
    /// Returns `true` only for the call that actually fired it; later calls
    /// are no-ops.
    pub fn signal(&self) -> bool {
        !self.tx.send_replace(true)
    }

    /// Another listener for the same notification.
    #[must_use]
    pub fn subscribe(&self) -> Completion {
        Completion {
            rx: self.tx.subscribe(),
        }
    }
}

impl Completion {
    /// Wait until the notification fires.
    ///
    /// Also returns if the signal was dropped without firing, since the work
    /// it stood for can no longer report.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        let _ = rx.wait_for(|done| *done).await;
    }

    /// `true` once the notification has fired.
    #[must_use]
    pub fn is_done(&self) -> bool {
        *self.rx.borrow()
    }
}
