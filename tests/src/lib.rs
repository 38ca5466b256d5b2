//! # Relay Rig Test Suite
//!
//! Scenarios that need all three roles at once.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # Rig setup, polling and output helpers
//! └── integration/
//!     ├── round_trip.rs # Initiator -> Proxy -> Echo -> Proxy -> Initiator
//!     └── routing.rs    # Handshake rejection, fan-in, proxy shutdown
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p relay-tests
//! cargo test -p relay-tests integration::routing::
//! ```

pub mod harness;
pub mod integration;
