//! # Transport
//!
//! Per-socket handlers and the wire format they speak.
//!
//! - [`wire`]: handshake byte and 8-byte little-endian values
//! - [`Link`]: shared liveness flag for the two halves of one socket
//! - [`Receiver`] / [`Sender`]: one background loop per direction

mod hooks;
mod link;
mod receiver;
mod sender;
pub mod wire;

pub use hooks::{record_into, ValueHook};
pub use link::{is_disconnect, probe, Link};
pub use receiver::Receiver;
pub use sender::Sender;
