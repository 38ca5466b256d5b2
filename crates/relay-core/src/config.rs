//! # Handler and Router Configuration
//!
//! Timing knobs for the transport handlers and the proxy router. Node-level
//! settings (addresses, file names, thresholds) live in `relay-node`.

use std::time::Duration;

use crate::DEFAULT_POLL_INTERVAL_MS;

/// Timing for one [`Receiver`](crate::Receiver) or [`Sender`](crate::Sender).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Back-off when there is nothing to send, or after a read error on a
    /// link that still looks alive.
    pub poll_interval: Duration,

    /// Pause before each send. Zero disables it.
    pub send_delay: Duration,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            send_delay: Duration::ZERO,
        }
    }
}

impl HandlerConfig {
    /// Create a config for testing (short back-off).
    pub fn for_testing() -> Self {
        Self {
            poll_interval: Duration::from_millis(5),
            send_delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_send_delay(mut self, send_delay: Duration) -> Self {
        self.send_delay = send_delay;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Proxy router configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouterConfig {
    /// Timing for the handlers of every accepted connection.
    pub handler: HandlerConfig,

    /// How long an accepted socket may take to send its role byte.
    pub handshake_timeout: Duration,

    /// How long `stop` waits for each connection worker.
    pub stop_timeout: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            handler: HandlerConfig::default(),
            handshake_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

impl RouterConfig {
    /// Create a config for testing (smaller values).
    pub fn for_testing() -> Self {
        Self {
            handler: HandlerConfig::for_testing(),
            handshake_timeout: Duration::from_millis(500),
            stop_timeout: Duration::from_secs(2),
        }
    }
}
