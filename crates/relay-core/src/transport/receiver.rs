//! Read side of a connection.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::tcp::OwnedReadHalf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::link::{probe, Link};
use super::wire;
use super::ValueHook;
use crate::buffer::Buffer;
use crate::config::HandlerConfig;
use crate::domain::{NumericValue, RelayError, WorkerState};
use crate::worker::{BackgroundWorker, Completion};

/// Reads values off a socket and hands them on.
///
/// For each value: the `after_receive` hook runs first, then the value is
/// pushed into the buffer if one is bound. Both are optional.
pub struct Receiver {
    worker: BackgroundWorker,
    buffer: Option<Arc<dyn Buffer<NumericValue>>>,
    after_receive: Option<ValueHook>,
    config: HandlerConfig,
}

impl Receiver {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            worker: BackgroundWorker::new(name),
            buffer: None,
            after_receive: None,
            config: HandlerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_buffer(mut self, buffer: Arc<dyn Buffer<NumericValue>>) -> Self {
        self.buffer = Some(buffer);
        self
    }

    #[must_use]
    pub fn with_after_receive(mut self, hook: ValueHook) -> Self {
        self.after_receive = Some(hook);
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

    pub fn state(&self) -> WorkerState {
        self.worker.state()
    }

    /// Start the receive loop on `reader`.
    ///
    /// The loop ends when `parent` (or this receiver) is cancelled, or when
    /// the connection is found dead. Either way `link` is marked closed on
    /// exit so the paired sender stops too.
    pub fn start(
        &self,
        reader: OwnedReadHalf,
        link: Link,
        parent: &CancellationToken,
    ) -> Result<Completion, RelayError> {
        let name = self.worker.name().to_string();
        let buffer = self.buffer.clone();
        let hook = self.after_receive.clone();
        let poll_interval = self.config.poll_interval;

        self.worker.start(parent, move |cancel| async move {
            let outcome = receive_loop(ReceiveLoop {
                name: &name,
                reader,
                link: &link,
                buffer,
                hook,
                poll_interval,
                cancel,
            })
            .await;
            link.mark_closed();
            outcome
        })
    }

    pub async fn stop(&self, timeout: Duration) -> Result<(), RelayError> {
        self.worker.stop(timeout).await
    }
}

struct ReceiveLoop<'a> {
    name: &'a str,
    reader: OwnedReadHalf,
    link: &'a Link,
    buffer: Option<Arc<dyn Buffer<NumericValue>>>,
    hook: Option<ValueHook>,
    poll_interval: Duration,
    cancel: CancellationToken,
}

async fn receive_loop(mut ctx: ReceiveLoop<'_>) -> Result<(), RelayError> {
    let mut received: u64 = 0;

    while !ctx.cancel.is_cancelled() && ctx.link.is_alive() {
        let outcome = tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => break,
            () = ctx.link.closed() => break,
            outcome = wire::read_value(&mut ctx.reader) => outcome,
        };

        match outcome {
            Ok(value) => {
                received += 1;
                if let Some(hook) = &ctx.hook {
                    hook(value);
                }
                if let Some(buffer) = &ctx.buffer {
                    if let Err(e) = buffer.push(value) {
                        error!(handler = %ctx.name, error = %e, "Receive buffer rejected value");
                        return Err(e.into());
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                debug!(handler = %ctx.name, "Peer closed the connection");
                ctx.link.mark_closed();
            }
            Err(e) => {
                debug!(handler = %ctx.name, error = %e, "Read failed");
                if probe(&mut ctx.reader).await {
                    tokio::select! {
                        biased;
                        () = ctx.cancel.cancelled() => break,
                        () = tokio::time::sleep(ctx.poll_interval) => {}
                    }
                } else {
                    ctx.link.mark_closed();
                }
            }
        }
    }

    debug!(handler = %ctx.name, received, "Receive loop finished");
    Ok(())
}
