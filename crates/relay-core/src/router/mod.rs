//! # Proxy Router
//!
//! Accepts any number of inbound connections, classifies each one by its
//! handshake byte and cross-wires it onto two shared buffers:
//!
//! | Peer type   | Receiver pushes into | Sender pulls from |
//! |-------------|----------------------|-------------------|
//! | `Initiator` | `from_initiator`     | `from_echo`       |
//! | `Echo`      | `from_echo`          | `from_initiator`  |
//!
//! Several connections of the same type compete for the same buffer; each
//! value is delivered to exactly one of them. Connections that fail the
//! handshake, or announce a type that cannot be routed, are dropped with a
//! warning and never get a worker.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::buffer::{Buffer, FifoBuffer};
use crate::config::RouterConfig;
use crate::connection::{read_handshake, ConnectionWorker};
use crate::domain::{ConnectionId, NumericValue, PeerType, RelayError, WorkerState};
use crate::transport::{Receiver, Sender};
use crate::worker::{BackgroundWorker, Completion};

type LiveTable = HashMap<PeerType, HashMap<ConnectionId, Arc<ConnectionWorker>>>;

/// (buffer the receiver pushes into, buffer the sender pulls from)
type Wiring = (Arc<dyn Buffer<NumericValue>>, Arc<dyn Buffer<NumericValue>>);

/// Proxy-side accept loop and connection table.
pub struct ProxyRouter {
    config: RouterConfig,
    local_addr: SocketAddr,
    listener: Mutex<Option<TcpListener>>,
    from_initiator: Arc<FifoBuffer<NumericValue>>,
    from_echo: Arc<FifoBuffer<NumericValue>>,
    live: RwLock<LiveTable>,
    worker: BackgroundWorker,
}

impl ProxyRouter {
    /// Bind the listening socket. Port 0 picks a free port; see
    /// [`ProxyRouter::local_addr`].
    pub async fn bind(addr: &str, config: RouterConfig) -> Result<Self, RelayError> {
        let listener = TcpListener::bind(addr).await.map_err(RelayError::Listener)?;
        let local_addr = listener.local_addr().map_err(RelayError::Listener)?;
        Ok(Self {
            config,
            local_addr,
            listener: Mutex::new(Some(listener)),
            from_initiator: Arc::new(FifoBuffer::new()),
            from_echo: Arc::new(FifoBuffer::new()),
            live: RwLock::new(HashMap::new()),
            worker: BackgroundWorker::new("proxy-router"),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> WorkerState {
        self.worker.state()
    }

    /// Start accepting under `parent`.
    ///
    /// After a stop the listener is re-bound to the same address before this
    /// returns, so a connect right after `start` succeeds.
    ///
    /// # Errors
    ///
    /// [`RelayError::AlreadyRunning`] while a previous run is active, and
    /// [`RelayError::Listener`] if the address can no longer be bound.
    pub fn start(self: &Arc<Self>, parent: &CancellationToken) -> Result<Completion, RelayError> {
        if self.worker.state().is_active() {
            return Err(RelayError::AlreadyRunning {
                worker: self.worker.name().to_string(),
            });
        }
        let listener = self.take_listener()?;
        let router = Arc::clone(self);
        self.worker.start(parent, move |cancel| router.accept_loop(listener, cancel))
    }

    /// The listener from `bind`, or a fresh one on the same address.
    fn take_listener(&self) -> Result<TcpListener, RelayError> {
        if let Some(listener) = self.listener.lock().take() {
            return Ok(listener);
        }
        let listener =
            std::net::TcpListener::bind(self.local_addr).map_err(RelayError::Listener)?;
        listener.set_nonblocking(true).map_err(RelayError::Listener)?;
        TcpListener::from_std(listener).map_err(RelayError::Listener)
    }

    /// Stop accepting, stop every live connection and wait up to `timeout`.
    pub async fn stop(&self, timeout: Duration) -> Result<(), RelayError> {
        self.worker.stop(timeout).await
    }

    /// Number of live connections classified as `peer_type`.
    pub fn live_count(&self, peer_type: PeerType) -> usize {
        self.live.read().get(&peer_type).map_or(0, HashMap::len)
    }

    /// Every live connection, ordered by id.
    pub fn live_connections(&self) -> Vec<(ConnectionId, PeerType)> {
        let mut connections: Vec<_> = self
            .live
            .read()
            .iter()
            .flat_map(|(peer, table)| table.keys().map(move |id| (*id, *peer)))
            .collect();
        connections.sort();
        connections
    }

    /// Values waiting to be forwarded away from `source`.
    pub fn queued_from(&self, source: PeerType) -> usize {
        match source {
            PeerType::Initiator => self.from_initiator.len(),
            PeerType::Echo => self.from_echo.len(),
            PeerType::Proxy => 0,
        }
    }

    async fn accept_loop(
        self: Arc<Self>,
        listener: TcpListener,
        cancel: CancellationToken,
    ) -> Result<(), RelayError> {
        info!(addr = %self.local_addr, "Proxy listening");

        let outcome = loop {
            let accepted = tokio::select! {
                biased;
                () = cancel.cancelled() => break Ok(()),
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, remote)) => {
                    let router = Arc::clone(&self);
                    let cancel = cancel.clone();
                    tokio::spawn(async move { router.admit(stream, remote, cancel).await });
                }
                Err(e) => {
                    error!(addr = %self.local_addr, error = %e, "Accept failed, closing listener");
                    break Err(RelayError::Listener(e));
                }
            }
        };

        drop(listener);
        self.stop_connections().await;
        info!(addr = %self.local_addr, "Proxy stopped listening");
        outcome
    }

    /// Classify, wire and track one accepted stream until it finishes.
    async fn admit(
        self: Arc<Self>,
        mut stream: TcpStream,
        remote: SocketAddr,
        cancel: CancellationToken,
    ) {
        let handshake = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            handshake = read_handshake(&mut stream, self.config.handshake_timeout) => handshake,
        };
        let peer = match handshake {
            Ok(peer) => peer,
            Err(e) => {
                warn!(%remote, error = %e, "Rejected connection");
                return;
            }
        };
        let Some((inbox, outbox)) = self.wiring(peer) else {
            warn!(%remote, role = %peer, "Rejected connection: peer type cannot be routed");
            return;
        };

        let handler = self.config.handler;
        let receiver = Receiver::new(format!("{peer}-receiver"))
            .with_buffer(inbox)
            .with_config(handler);
        let sender = Sender::new(format!("{peer}-sender"))
            .with_buffer(outbox)
            .with_config(handler);
        let worker = Arc::new(ConnectionWorker::inbound(stream, peer, receiver, sender));
        let id = worker.id();

        let completion = match worker.start(&cancel) {
            Ok(completion) => completion,
            Err(e) => {
                warn!(connection = %id, %remote, error = %e, "Failed to start connection");
                return;
            }
        };
        self.live
            .write()
            .entry(peer)
            .or_default()
            .insert(id, Arc::clone(&worker));
        info!(connection = %id, %remote, role = %peer, "Peer connected");

        completion.wait().await;

        let removed = self
            .live
            .write()
            .get_mut(&peer)
            .and_then(|table| table.remove(&id))
            .is_some();
        if removed {
            info!(connection = %id, role = %peer, "Peer disconnected");
        }
    }

    fn wiring(&self, peer: PeerType) -> Option<Wiring> {
        let from_initiator: Arc<dyn Buffer<NumericValue>> = self.from_initiator.clone();
        let from_echo: Arc<dyn Buffer<NumericValue>> = self.from_echo.clone();
        match peer {
            PeerType::Initiator => Some((from_initiator, from_echo)),
            PeerType::Echo => Some((from_echo, from_initiator)),
            PeerType::Proxy => None,
        }
    }

    async fn stop_connections(&self) {
        let workers: Vec<Arc<ConnectionWorker>> = self
            .live
            .read()
            .values()
            .flat_map(|table| table.values().cloned())
            .collect();

        for worker in workers {
            if let Err(e) = worker.stop(self.config.stop_timeout).await {
                warn!(connection = %worker.id(), error = %e, "Connection did not stop in time");
            }
        }
    }
}
