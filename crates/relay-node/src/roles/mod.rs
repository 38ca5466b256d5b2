//! # Role Processes
//!
//! One type per role, each owning its buffers and driving its connections:
//!
//! - [`InitiatorNode`]: generates the sequence, logs what it sends and what
//!   comes back
//! - [`EchoNode`]: sends every received value straight back, logs it
//! - [`ProxyNode`]: accepts both and cross-wires them
//!
//! Initiator and Echo share the same body: start every connection, wait until
//! all of them have finished, then flush the ordering buffers exactly once.

mod echo;
mod initiator;
mod proxy;

pub use echo::EchoNode;
pub use initiator::InitiatorNode;
pub use proxy::ProxyNode;

use std::sync::Arc;

use async_trait::async_trait;
use relay_core::{
    ConnectionWorker, NumericValue, OrderingOutputBuffer, PeerType, RelayError, WorkerState,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Start/stop surface the console drives.
#[async_trait]
pub trait RoleService: Send + Sync {
    fn role(&self) -> PeerType;

    fn state(&self) -> WorkerState;

    /// Start the role under `parent`. Returns once everything is spawned.
    fn start(&self, parent: &CancellationToken) -> Result<(), RelayError>;

    /// Stop the role and wait, bounded by the configured stop timeout.
    async fn stop(&self) -> Result<(), RelayError>;
}

type OutputLog = Arc<OrderingOutputBuffer<NumericValue>>;

/// Body shared by the connecting roles.
async fn run_connections(
    role: PeerType,
    connections: Vec<ConnectionWorker>,
    outputs: Vec<OutputLog>,
    cancel: CancellationToken,
) -> Result<(), RelayError> {
    let mut completions = Vec::with_capacity(connections.len());
    for connection in &connections {
        completions.push(connection.start(&cancel)?);
    }
    info!(%role, connections = completions.len(), "Connections started");

    for completion in &completions {
        completion.wait().await;
    }
    info!(%role, "All connections finished");

    flush_outputs(&outputs)
}

/// Flush every log, reporting the first failure after trying all of them.
fn flush_outputs(outputs: &[OutputLog]) -> Result<(), RelayError> {
    let mut first_error = None;
    for output in outputs {
        match output.flush() {
            Ok(written) => {
                info!(path = %output.path().display(), written, "Flushed output");
            }
            Err(source) => {
                error!(path = %output.path().display(), error = %source, "Failed to flush output");
                first_error.get_or_insert(RelayError::Persist {
                    path: output.path().to_path_buf(),
                    source,
                });
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}
