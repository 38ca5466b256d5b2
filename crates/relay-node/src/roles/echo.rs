//! Echo role: returns every value it receives.

use std::sync::Arc;

use async_trait::async_trait;
use relay_core::{
    record_into, BackgroundWorker, ConnectionWorker, FifoBuffer, NumericValue,
    OrderingOutputBuffer, PeerType, Receiver, RelayError, Sender, WorkerState,
};
use tokio_util::sync::CancellationToken;

use super::{run_connections, OutputLog, RoleService};
use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::housekeeping::{clear_stale_outputs, ensure_output_dir};

/// Receives values, logs them and queues them for sending back.
///
/// One queue is shared by every connection: a value may return over a
/// different connection than the one it arrived on.
pub struct EchoNode {
    config: NodeConfig,
    queue: Arc<FifoBuffer<NumericValue>>,
    echo_log: OutputLog,
    worker: BackgroundWorker,
}

impl EchoNode {
    /// Build the node and remove the echo log from a previous run.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let echo_path = config.output_path(&config.echo_file);
        ensure_output_dir(&config.output_dir)?;
        clear_stale_outputs(&[&echo_path])?;

        Ok(Self {
            queue: Arc::new(FifoBuffer::new()),
            echo_log: Arc::new(OrderingOutputBuffer::new(echo_path, config.echo_threshold)),
            worker: BackgroundWorker::new("echo"),
            config,
        })
    }

    /// Values received and handed to the echo log so far.
    pub fn echoed_count(&self) -> u64 {
        self.echo_log.pushed()
    }

    /// Values received but not yet sent back.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    fn connections(&self) -> Vec<ConnectionWorker> {
        let handler = self.config.handler_config();

        (0..self.config.connections)
            .map(|i| {
                let receiver = Receiver::new(format!("echo-receiver-{i}"))
                    .with_buffer(self.queue.clone())
                    .with_after_receive(record_into(Arc::clone(&self.echo_log)))
                    .with_config(handler);
                let sender = Sender::new(format!("echo-sender-{i}"))
                    .with_buffer(self.queue.clone())
                    .with_config(handler);
                ConnectionWorker::outbound(
                    self.config.proxy_addr(),
                    PeerType::Echo,
                    receiver,
                    sender,
                )
            })
            .collect()
    }
}

#[async_trait]
impl RoleService for EchoNode {
    fn role(&self) -> PeerType {
        PeerType::Echo
    }

    fn state(&self) -> WorkerState {
        self.worker.state()
    }

    fn start(&self, parent: &CancellationToken) -> Result<(), RelayError> {
        let connections = self.connections();
        let outputs = vec![Arc::clone(&self.echo_log)];
        self.worker
            .start(parent, move |cancel| {
                run_connections(PeerType::Echo, connections, outputs, cancel)
            })
            .map(drop)
    }

    async fn stop(&self) -> Result<(), RelayError> {
        self.worker.stop(self.config.stop_timeout()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::transport::wire;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    const WAIT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn test_echoes_values_back_and_logs_them() {
        let dir = TempDir::new().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = NodeConfig {
            port: listener.local_addr().unwrap().port(),
            echo_threshold: 2,
            ..NodeConfig::for_testing(dir.path())
        };
        let echo_path = config.output_path(&config.echo_file);
        let node = EchoNode::new(config).unwrap();
        node.start(&CancellationToken::new()).unwrap();

        let (mut proxy_side, _) = listener.accept().await.unwrap();
        let handshake = relay_core::connection::read_handshake(&mut proxy_side, WAIT)
            .await
            .unwrap();
        assert_eq!(handshake, PeerType::Echo);

        for value in [3, 1, 2] {
            wire::write_value(&mut proxy_side, value).await.unwrap();
        }
        for expected in [3, 1, 2] {
            let value = tokio::time::timeout(WAIT, wire::read_value(&mut proxy_side))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(value, expected);
        }
        assert_eq!(node.echoed_count(), 3);

        node.stop().await.unwrap();
        assert_eq!(std::fs::read_to_string(echo_path).unwrap(), "1\n2\n3\n");
    }
}
