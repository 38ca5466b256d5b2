//! Logging setup for the `relay-node` binary.

use tracing_subscriber::EnvFilter;

use crate::error::NodeError;

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "RELAY_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global `fmt` subscriber.
///
/// The filter comes from `RELAY_LOG`, then `RUST_LOG`, then `info`.
pub fn init_logging() -> Result<(), NodeError> {
    let filter = build_filter(std::env::var(LOG_ENV).ok().as_deref())?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|e| NodeError::Logging(e.to_string()))
}

fn build_filter(relay_log: Option<&str>) -> Result<EnvFilter, NodeError> {
    match relay_log {
        Some(directive) => {
            EnvFilter::try_new(directive).map_err(|e| NodeError::Logging(e.to_string()))
        }
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))),
    }
}
