//! # Relay Node
//!
//! Role processes of the relay rig and everything the `relay-node` binary
//! needs around them.
//!
//! ## Roles
//!
//! | Role      | Connects / listens | Output files                                  |
//! |-----------|--------------------|-----------------------------------------------|
//! | Initiator | connects           | `initiator_send.txt`, `initiator_receive.txt` |
//! | Echo      | connects           | `echo.txt`                                    |
//! | Proxy     | listens            | none                                          |
//!
//! ## Modules
//!
//! - `config`: [`NodeConfig`] and its resolution layers
//! - `roles`: [`InitiatorNode`], [`EchoNode`], [`ProxyNode`] behind [`RoleService`]
//! - `housekeeping`: stale output cleanup
//! - `telemetry`: logging setup
//! - `command`: console commands

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod command;
pub mod config;
pub mod error;
pub mod housekeeping;
pub mod roles;
pub mod telemetry;

pub use command::Command;
pub use config::{ConfigError, NodeConfig};
pub use error::NodeError;
pub use housekeeping::clear_stale_outputs;
pub use roles::{EchoNode, InitiatorNode, ProxyNode, RoleService};
