//! # Relay Core
//!
//! Building blocks of the three-role TCP relay rig.
//!
//! ## Data Flow
//!
//! ```text
//! ┌───────────┐  values   ┌─────────────────────────────┐  values   ┌──────┐
//! │ Initiator │ ────────→ │            Proxy            │ ────────→ │ Echo │
//! │           │           │ fromInitiator    fromEcho   │           │      │
//! │           │ ←──────── │                             │ ←──────── │      │
//! └───────────┘           └─────────────────────────────┘           └──────┘
//! ```
//!
//! Every hop is a [`ConnectionWorker`]: one [`Receiver`] and one [`Sender`]
//! sharing a socket. Handlers never talk to each other directly; they hand
//! values over through [`Buffer`]s. Values that must be persisted go through an
//! [`OrderingOutputBuffer`], which releases them in ascending order.
//!
//! ## Wire Protocol
//!
//! 1. Handshake: one [`PeerType`] byte, written by the side that connects.
//! 2. Payload: an unbounded stream of 8-byte little-endian `i64` values in each
//!    direction, with no further framing.
//!
//! ## Lifecycle
//!
//! All long-running pieces (handlers, connection workers, the router) are
//! driven by a [`BackgroundWorker`]: `start` spawns the body under a child
//! cancellation token, `stop` cancels it and waits for the body to finish.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod buffer;
pub mod config;
pub mod connection;
pub mod domain;
pub mod router;
pub mod transport;
pub mod worker;

// Re-export main types
pub use buffer::{Buffer, FifoBuffer, OrderingOutputBuffer, SequenceBuffer};
pub use config::{HandlerConfig, RouterConfig};
pub use connection::ConnectionWorker;
pub use domain::{
    BufferError, ConnectionId, HandshakeError, NumericValue, PeerType, RelayError, WorkerState,
};
pub use router::ProxyRouter;
pub use transport::{record_into, Link, Receiver, Sender, ValueHook};
pub use worker::{BackgroundWorker, Completion, CompletionSignal};

/// Width in bytes of one [`NumericValue`] on the wire.
pub const VALUE_WIDTH: usize = 8;

/// Back-off applied by handlers when there is nothing to do.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;
