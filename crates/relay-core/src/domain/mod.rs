//! # Domain Layer for the Relay Rig
//!
//! Plain types shared by every other module: the role tag exchanged in the
//! handshake, worker states, connection identifiers and the error taxonomy.
//!
//! ## Contents
//!
//! - **peer_type**: `PeerType` and its one-byte wire code
//! - **state**: `WorkerState`, `ConnectionId`
//! - **errors**: `RelayError`, `BufferError`, `HandshakeError`

mod errors;
mod peer_type;
mod state;

pub use errors::*;
pub use peer_type::*;
pub use state::*;

/// The only payload exchanged between nodes and persisted to output files.
pub type NumericValue = i64;
