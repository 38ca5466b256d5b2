//! Initiator role: source and final sink of the sequence.

use std::sync::Arc;

use async_trait::async_trait;
use relay_core::{
    record_into, BackgroundWorker, ConnectionWorker, OrderingOutputBuffer, PeerType, Receiver,
    RelayError, Sender, SequenceBuffer, WorkerState,
};
use tokio_util::sync::CancellationToken;

use super::{run_connections, OutputLog, RoleService};
use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::housekeeping::{clear_stale_outputs, ensure_output_dir};

/// Sends 1, 2, 3, ... over every connection and logs both directions.
///
/// All connections pull from one shared sequence, so each value goes out
/// exactly once across the whole node.
pub struct InitiatorNode {
    config: NodeConfig,
    sequence: Arc<SequenceBuffer>,
    sent_log: OutputLog,
    received_log: OutputLog,
    worker: BackgroundWorker,
}

impl InitiatorNode {
    /// Build the node and remove output files from a previous run.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let sent_path = config.output_path(&config.initiator_send_file);
        let received_path = config.output_path(&config.initiator_receive_file);
        ensure_output_dir(&config.output_dir)?;
        clear_stale_outputs(&[&sent_path, &received_path])?;

        let sequence = match config.emit_limit {
            Some(limit) => SequenceBuffer::with_limit(limit),
            None => SequenceBuffer::new(),
        };

        Ok(Self {
            sequence: Arc::new(sequence),
            sent_log: Arc::new(OrderingOutputBuffer::new(
                sent_path,
                config.initiator_send_threshold,
            )),
            received_log: Arc::new(OrderingOutputBuffer::new(
                received_path,
                config.initiator_receive_threshold,
            )),
            worker: BackgroundWorker::new("initiator"),
            config,
        })
    }

    /// Values handed to the sent log so far.
    pub fn sent_count(&self) -> u64 {
        self.sent_log.pushed()
    }

    /// Values that came back and were handed to the received log.
    pub fn received_count(&self) -> u64 {
        self.received_log.pushed()
    }

    fn connections(&self) -> Vec<ConnectionWorker> {
        let handler = self.config.handler_config();
        let sender_config = handler.with_send_delay(self.config.send_delay());

        (0..self.config.connections)
            .map(|i| {
                let receiver = Receiver::new(format!("initiator-receiver-{i}"))
                    .with_after_receive(record_into(Arc::clone(&self.received_log)))
                    .with_config(handler);
                let sender = Sender::new(format!("initiator-sender-{i}"))
                    .with_buffer(self.sequence.clone())
                    .with_before_send(record_into(Arc::clone(&self.sent_log)))
                    .with_config(sender_config);
                ConnectionWorker::outbound(
                    self.config.proxy_addr(),
                    PeerType::Initiator,
                    receiver,
                    sender,
                )
            })
            .collect()
    }
}

#[async_trait]
impl RoleService for InitiatorNode {
    fn role(&self) -> PeerType {
        PeerType::Initiator
    }

    fn state(&self) -> WorkerState {
        self.worker.state()
    }

    fn start(&self, parent: &CancellationToken) -> Result<(), RelayError> {
        let connections = self.connections();
        let outputs = vec![Arc::clone(&self.sent_log), Arc::clone(&self.received_log)];
        self.worker
            .start(parent, move |cancel| {
                run_connections(PeerType::Initiator, connections, outputs, cancel)
            })
            .map(drop)
    }

    async fn stop(&self) -> Result<(), RelayError> {
        self.worker.stop(self.config.stop_timeout()).await
    }
}
