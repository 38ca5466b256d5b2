//! # Connection Worker
//!
//! One socket, one [`Receiver`], one [`Sender`].
//!
//! The worker establishes the socket (connect + handshake for outbound,
//! an already-classified stream for inbound), splits it, starts both handlers
//! under its own cancellation token and finishes once **both** have finished.
//! Its completion is therefore the single "connection finished" signal and
//! fires exactly once per run.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::{ConnectionId, HandshakeError, PeerType, RelayError, WorkerState};
use crate::transport::{wire, Link, Receiver, Sender};
use crate::worker::{BackgroundWorker, Completion};

enum Endpoint {
    /// Connect to `addr` and announce `local`.
    Outbound { addr: String, local: PeerType },
    /// Stream accepted and classified by a listener. Consumed by the first run.
    Inbound(Mutex<Option<TcpStream>>),
}

/// Pairs a receiver and a sender on one socket.
pub struct ConnectionWorker {
    id: ConnectionId,
    endpoint: Endpoint,
    peer_type: PeerType,
    receiver: Arc<Receiver>,
    sender: Arc<Sender>,
    worker: BackgroundWorker,
}

impl ConnectionWorker {
    /// Worker that dials `addr` and sends `local` as its handshake.
    pub fn outbound(
        addr: impl Into<String>,
        local: PeerType,
        receiver: Receiver,
        sender: Sender,
    ) -> Self {
        let id = ConnectionId::next();
        Self {
            id,
            endpoint: Endpoint::Outbound {
                addr: addr.into(),
                local,
            },
            peer_type: local,
            receiver: Arc::new(receiver),
            sender: Arc::new(sender),
            worker: BackgroundWorker::new(format!("{local}-{id}")),
        }
    }

    /// Worker for a stream whose handshake has already been read.
    pub fn inbound(
        stream: TcpStream,
        peer_type: PeerType,
        receiver: Receiver,
        sender: Sender,
    ) -> Self {
        let id = ConnectionId::next();
        Self {
            id,
            endpoint: Endpoint::Inbound(Mutex::new(Some(stream))),
            peer_type,
            receiver: Arc::new(receiver),
            sender: Arc::new(sender),
            worker: BackgroundWorker::new(format!("{peer_type}-{id}")),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Role carried by the handshake: the local role for outbound workers,
    /// the remote role for inbound ones.
    pub fn peer_type(&self) -> PeerType {
        self.peer_type
    }

    pub fn state(&self) -> WorkerState {
        self.worker.state()
    }

    /// Completion of the current run, if started.
    pub fn completion(&self) -> Option<Completion> {
        self.worker.completion()
    }

    /// Start the connection under `parent`.
    ///
    /// # Errors
    ///
    /// [`RelayError::MissingBuffer`] if the sender has no buffer; nothing is
    /// connected in that case. [`RelayError::AlreadyRunning`] if a previous run
    /// has not finished.
    pub fn start(&self, parent: &CancellationToken) -> Result<Completion, RelayError> {
        if !self.sender.has_buffer() {
            return Err(RelayError::MissingBuffer {
                handler: self.sender.name().to_string(),
            });
        }

        let id = self.id;
        let name = self.worker.name().to_string();
        let receiver = Arc::clone(&self.receiver);
        let sender = Arc::clone(&self.sender);
        let endpoint = &self.endpoint;

        self.worker.start(parent, move |cancel| {
            let pending = match endpoint {
                Endpoint::Outbound { addr, local } => Some(Pending::Connect {
                    addr: addr.clone(),
                    local: *local,
                }),
                Endpoint::Inbound(slot) => slot.lock().take().map(Pending::Accepted),
            };

            async move {
                let Some(pending) = pending else {
                    return Err(RelayError::StreamConsumed { worker: name });
                };
                let Some(stream) = establish(pending, &cancel).await? else {
                    return Ok(());
                };
                run_pair(id, stream, &receiver, &sender, &cancel).await
            }
        })
    }

    /// Stop both handlers and wait up to `timeout` for the connection to
    /// finish.
    pub async fn stop(&self, timeout: Duration) -> Result<(), RelayError> {
        self.worker.stop(timeout).await
    }
}

enum Pending {
    Connect { addr: String, local: PeerType },
    Accepted(TcpStream),
}

/// Produce a ready stream, or `None` if cancelled while connecting.
async fn establish(
    pending: Pending,
    cancel: &CancellationToken,
) -> Result<Option<TcpStream>, RelayError> {
    match pending {
        Pending::Accepted(stream) => Ok(Some(stream)),
        Pending::Connect { addr, local } => {
            let connected = tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(None),
                connected = TcpStream::connect(&addr) => connected,
            };
            let mut stream = connected.map_err(|source| RelayError::Connect {
                addr: addr.clone(),
                source,
            })?;
            wire::write_peer_type(&mut stream, local).await?;
            debug!(%addr, role = %local, "Handshake sent");
            Ok(Some(stream))
        }
    }
}

async fn run_pair(
    id: ConnectionId,
    stream: TcpStream,
    receiver: &Receiver,
    sender: &Sender,
    cancel: &CancellationToken,
) -> Result<(), RelayError> {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(connection = %id, error = %e, "Could not disable Nagle");
    }
    let (reader, writer) = stream.into_split();
    let link = Link::new();

    let sent = sender.start(writer, link.clone(), cancel)?;
    let received = match receiver.start(reader, link.clone(), cancel) {
        Ok(received) => received,
        Err(e) => {
            link.mark_closed();
            sent.wait().await;
            return Err(e);
        }
    };

    tokio::join!(sent.wait(), received.wait());
    info!(connection = %id, "Connection finished");
    Ok(())
}

/// Read the handshake of a freshly accepted stream, bounded by `timeout`.
pub async fn read_handshake(
    stream: &mut TcpStream,
    timeout: Duration,
) -> Result<PeerType, HandshakeError> {
    tokio::time::timeout(timeout, wire::read_peer_type(stream))
        .await
        .map_err(|_| HandshakeError::TimedOut(timeout))?
}
