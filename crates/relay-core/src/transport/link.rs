//! Connection liveness shared by the two halves of one socket.

use std::future::poll_fn;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::Poll;

use tokio::io::ReadBuf;
use tokio::net::tcp::OwnedReadHalf;
use tokio_util::sync::CancellationToken;

/// Liveness of one TCP connection.
///
/// Either handler may declare the connection dead; the other observes it on
/// its next iteration, or immediately if it is waiting on [`Link::closed`].
/// Independent of the workers' cancellation tokens.
#[derive(Clone, Debug, Default)]
pub struct Link {
    closed: CancellationToken,
    marked: Arc<AtomicBool>,
}

impl Link {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_alive(&self) -> bool {
        !self.closed.is_cancelled()
    }

    /// Declare the connection dead. Returns `true` for the first caller.
    pub fn mark_closed(&self) -> bool {
        let first = !self.marked.swap(true, Ordering::AcqRel);
        self.closed.cancel();
        first
    }

    /// Resolves once the connection has been declared dead.
    pub async fn closed(&self) {
        self.closed.cancelled().await;
    }
}

/// Non-blocking liveness check.
///
/// Peeks one byte without consuming it. A zero-length result means the peer
/// closed its side; an error means the socket is unusable. Both report
/// `false`. Pending data or nothing-yet reports `true`.
pub async fn probe(reader: &mut OwnedReadHalf) -> bool {
    let mut byte = [0u8; 1];
    let mut buf = ReadBuf::new(&mut byte);
    poll_fn(|cx| match reader.poll_peek(cx, &mut buf) {
        Poll::Ready(Ok(0)) | Poll::Ready(Err(_)) => Poll::Ready(false),
        Poll::Ready(Ok(_)) | Poll::Pending => Poll::Ready(true),
    })
    .await
}

/// `true` for write/read errors that mean the peer is gone.
pub fn is_disconnect(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
    )
}
