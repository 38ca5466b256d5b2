//! Write side of a connection.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::link::{is_disconnect, Link};
use super::wire;
use super::ValueHook;
use crate::buffer::Buffer;
use crate::config::HandlerConfig;
use crate::domain::{NumericValue, RelayError, WorkerState};
use crate::worker::{BackgroundWorker, Completion};

/// Drains a buffer onto a socket.
///
/// A buffer is mandatory; `start` fails with
/// [`RelayError::MissingBuffer`] without touching the socket otherwise.
pub struct Sender {
    worker: BackgroundWorker,
    buffer: Option<Arc<dyn Buffer<NumericValue>>>,
    before_send: Option<ValueHook>,
    config: HandlerConfig,
}

impl Sender {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            worker: BackgroundWorker::new(name),
            buffer: None,
            before_send: None,
            config: HandlerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_buffer(mut self, buffer: Arc<dyn Buffer<NumericValue>>) -> Self {
        self.buffer = Some(buffer);
        self
    }

    #[must_use]
    pub fn with_before_send(mut self, hook: ValueHook) -> Self {
        self.before_send = Some(hook);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: HandlerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &str {
        self.worker.name()
    }

    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn state(&self) -> WorkerState {
        self.worker.state()
    }

    /// Start the send loop on `writer`.
    ///
    /// The write half is shut down when the loop ends.
    pub fn start(
        &self,
        writer: OwnedWriteHalf,
        link: Link,
        parent: &CancellationToken,
    ) -> Result<Completion, RelayError> {
        let Some(buffer) = self.buffer.clone() else {
            return Err(RelayError::MissingBuffer {
                handler: self.worker.name().to_string(),
            });
        };
        let name = self.worker.name().to_string();
        let hook = self.before_send.clone();
        let config = self.config;

        self.worker.start(parent, move |cancel| async move {
            let mut writer = writer;
            send_loop(&name, &mut writer, &link, buffer, hook, config, cancel).await;
            if let Err(e) = writer.shutdown().await {
                debug!(handler = %name, error = %e, "Shutdown of write half failed");
            }
            Ok(())
        })
    }

    pub async fn stop(&self, timeout: Duration) -> Result<(), RelayError> {
        self.worker.stop(timeout).await
    }
}

async fn send_loop(
    name: &str,
    writer: &mut OwnedWriteHalf,
    link: &Link,
    buffer: Arc<dyn Buffer<NumericValue>>,
    hook: Option<ValueHook>,
    config: HandlerConfig,
    cancel: CancellationToken,
) {
    let mut sent: u64 = 0;

    while !cancel.is_cancelled() && link.is_alive() {
        let value = match buffer.try_pull() {
            Some(value) => value,
            None => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = link.closed() => break,
                    () = tokio::time::sleep(config.poll_interval) => {}
                }
                continue;
            }
        };

        if !config.send_delay.is_zero() {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = link.closed() => break,
                () = tokio::time::sleep(config.send_delay) => {}
            }
        }

        if let Some(hook) = &hook {
            hook(value);
        }

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            outcome = wire::write_value(writer, value) => outcome,
        };

        match outcome {
            Ok(()) => sent += 1,
            Err(e) if is_disconnect(&e) => {
                debug!(handler = %name, error = %e, "Peer gone, ending send loop");
                link.mark_closed();
            }
            Err(e) => {
                debug!(handler = %name, error = %e, "Write failed");
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(config.poll_interval) => {}
                }
            }
        }
    }

    debug!(handler = %name, sent, "Send loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{FifoBuffer, SequenceBuffer};
    use crate::transport::test_utils::socket_pair;
    use parking_lot::Mutex;
    use tokio::io::AsyncReadExt;

    const WAIT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn test_start_without_buffer_fails_before_io() {
        let (local, _remote) = socket_pair().await;
        let (_reader, writer) = local.into_split();
        let sender = Sender::new("sender");

        let err = sender
            .start(writer, Link::new(), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, RelayError::MissingBuffer { .. }));
        assert_eq!(err.to_string(), "Configuration error: sender requires a buffer");
        assert_eq!(sender.state(), WorkerState::Created);
    }

    #[tokio::test]
    async fn test_drains_buffer_in_order_with_hook() {
        let (local, mut remote) = socket_pair().await;
        let (_reader, writer) = local.into_split();
        let buffer = Arc::new(FifoBuffer::<NumericValue>::new());
        for value in [10, 20, 30] {
            buffer.push(value).unwrap();
        }
        let seen = Arc::new(Mutex::new(Vec::new()));
        let hook_seen = Arc::clone(&seen);

        let sender = Sender::new("sender")
            .with_buffer(buffer)
            .with_before_send(Arc::new(move |v| hook_seen.lock().push(v)))
            .with_config(HandlerConfig::for_testing());
        sender
            .start(writer, Link::new(), &CancellationToken::new())
            .unwrap();

        let mut got = Vec::new();
        for _ in 0..3 {
            got.push(tokio::time::timeout(WAIT, remote.read_i64_le()).await.unwrap().unwrap());
        }
        assert_eq!(got, vec![10, 20, 30]);
        assert_eq!(*seen.lock(), vec![10, 20, 30]);

        sender.stop(WAIT).await.unwrap();
        // Write half is shut down: the peer sees EOF
        let mut rest = Vec::new();
        remote.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_bounded_sequence() {
        let (local, mut remote) = socket_pair().await;
        let (_reader, writer) = local.into_split();
        let sender = Sender::new("sequence")
            .with_buffer(Arc::new(SequenceBuffer::with_limit(3)))
            .with_config(HandlerConfig::for_testing());
        sender
            .start(writer, Link::new(), &CancellationToken::new())
            .unwrap();

        for expected in 1..=3 {
            let value = tokio::time::timeout(WAIT, remote.read_i64_le()).await.unwrap().unwrap();
            assert_eq!(value, expected);
        }
        sender.stop(WAIT).await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_link_ends_loop() {
        let (local, _remote) = socket_pair().await;
        let (_reader, writer) = local.into_split();
        let sender = Sender::new("idle")
            .with_buffer(Arc::new(FifoBuffer::<NumericValue>::new()))
            .with_config(HandlerConfig::for_testing());
        let link = Link::new();

        let completion = sender
            .start(writer, link.clone(), &CancellationToken::new())
            .unwrap();
        link.mark_closed();

        tokio::time::timeout(WAIT, completion.wait()).await.unwrap();
        assert_eq!(sender.state(), WorkerState::Stopped);
    }

    #[tokio::test]
    async fn test_send_delay_paces_values() {
        let (local, mut remote) = socket_pair().await;
        let (_reader, writer) = local.into_split();
        let sender = Sender::new("paced")
            .with_buffer(Arc::new(SequenceBuffer::with_limit(2)))
            .with_config(HandlerConfig::for_testing().with_send_delay(Duration::from_millis(50)));

        let started = tokio::time::Instant::now();
        sender
            .start(writer, Link::new(), &CancellationToken::new())
            .unwrap();
        for _ in 0..2 {
            tokio::time::timeout(WAIT, remote.read_i64_le()).await.unwrap().unwrap();
        }
        assert!(started.elapsed() >= Duration::from_millis(100));
        sender.stop(WAIT).await.unwrap();
    }
}
