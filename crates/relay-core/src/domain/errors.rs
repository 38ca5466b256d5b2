//! Error types for the relay rig.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by workers, handlers and the router.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Read/write failure on an established connection.
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// A handler that needs a buffer was started without one.
    #[error("Configuration error: {handler} requires a buffer")]
    MissingBuffer { handler: String },

    /// A buffer refused an operation it does not support.
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    #[error("Handshake failed: {0}")]
    Handshake(#[from] HandshakeError),

    /// The listening socket failed; the accept loop is not restarted.
    #[error("Listener error: {0}")]
    Listener(io::Error),

    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// An output file could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Worker {worker} is already running")]
    AlreadyRunning { worker: String },

    /// An accepted stream can only be driven once.
    #[error("Worker {worker} has no stream left to drive")]
    StreamConsumed { worker: String },

    /// `stop` gave up waiting; the body keeps running.
    #[error("Timed out after {timeout:?} waiting for {worker} to stop")]
    StopTimedOut { worker: String, timeout: Duration },
}

/// Errors from buffer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Push into a pull-only buffer. Always a wiring mistake.
    #[error("Push is not supported by {buffer}")]
    PushRejected { buffer: &'static str },
}

/// Errors from the one-byte role handshake.
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("Unknown peer type code {0}")]
    UnknownPeerType(u8),

    #[error("Peer closed the connection before the handshake")]
    Closed,

    #[error("No handshake within {0:?}")]
    TimedOut(Duration),

    #[error("Handshake I/O error: {0}")]
    Io(#[from] io::Error),
}
