//! # Node Configuration
//!
//! Settings for one role process.
//!
//! ## Resolution Order
//!
//! 1. Built-in defaults ([`NodeConfig::default`])
//! 2. Optional TOML file ([`NodeConfig::from_file`])
//! 3. Environment (`RELAY_HOST`, `RELAY_PORT`, `RELAY_CONNECTIONS`,
//!    `RELAY_OUTPUT_DIR`, `RELAY_SEND_DELAY_MS`)
//! 4. Command-line arguments (applied by the binary)
//!
//! Every layer only overrides what it sets.

use std::path::{Path, PathBuf};
use std::time::Duration;

use relay_core::{HandlerConfig, RouterConfig, DEFAULT_POLL_INTERVAL_MS};
use serde::Deserialize;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("connections must be at least 1")]
    ZeroConnections,

    #[error("Flush threshold for {file} must be at least 1")]
    ZeroThreshold { file: String },
}

/// Complete node configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// Proxy host: where Initiator/Echo connect, where the Proxy listens.
    pub host: String,
    pub port: u16,

    /// Connections opened by an Initiator or Echo node.
    pub connections: usize,

    /// Directory holding every output file.
    pub output_dir: PathBuf,

    pub initiator_send_file: String,
    pub initiator_send_threshold: usize,
    pub initiator_receive_file: String,
    pub initiator_receive_threshold: usize,
    pub echo_file: String,
    pub echo_threshold: usize,

    /// Pause before each value the Initiator sends.
    pub send_delay_ms: u64,

    /// Stop generating after this many values. Unbounded when absent.
    pub emit_limit: Option<i64>,

    pub poll_interval_ms: u64,
    pub handshake_timeout_ms: u64,
    pub stop_timeout_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8888,
            connections: 3,
            output_dir: PathBuf::from("."),
            initiator_send_file: "initiator_send.txt".to_string(),
            initiator_send_threshold: 50,
            initiator_receive_file: "initiator_receive.txt".to_string(),
            initiator_receive_threshold: 300,
            echo_file: "echo.txt".to_string(),
            echo_threshold: 300,
            send_delay_ms: 100,
            emit_limit: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            handshake_timeout_ms: 5_000,
            stop_timeout_ms: 5_000,
        }
    }
}

impl NodeConfig {
    /// Create a config for testing: ephemeral port, no throttling, short waits.
    pub fn for_testing(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            port: 0,
            connections: 1,
            output_dir: output_dir.into(),
            send_delay_ms: 0,
            poll_interval_ms: 5,
            handshake_timeout_ms: 500,
            stop_timeout_ms: 2_000,
            ..Self::default()
        }
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Apply `RELAY_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply `RELAY_*` overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("RELAY_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("RELAY_PORT") {
            self.port = parse_var("RELAY_PORT", port)?;
        }
        if let Some(connections) = lookup("RELAY_CONNECTIONS") {
            self.connections = parse_var("RELAY_CONNECTIONS", connections)?;
        }
        if let Some(dir) = lookup("RELAY_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(delay) = lookup("RELAY_SEND_DELAY_MS") {
            self.send_delay_ms = parse_var("RELAY_SEND_DELAY_MS", delay)?;
        }
        Ok(())
    }

    /// Reject settings no role can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connections == 0 {
            return Err(ConfigError::ZeroConnections);
        }
        let thresholds = [
            (&self.initiator_send_file, self.initiator_send_threshold),
            (&self.initiator_receive_file, self.initiator_receive_threshold),
            (&self.echo_file, self.echo_threshold),
        ];
        for (file, threshold) in thresholds {
            if threshold == 0 {
                return Err(ConfigError::ZeroThreshold { file: file.clone() });
            }
        }
        Ok(())
    }

    /// `host:port` of the Proxy.
    pub fn proxy_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.send_delay_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    /// Handler timing shared by every connection of this node. Send delay is
    /// left at zero; only the Initiator's senders are throttled.
    pub fn handler_config(&self) -> HandlerConfig {
        HandlerConfig::default().with_poll_interval(Duration::from_millis(self.poll_interval_ms))
    }

    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            handler: self.handler_config(),
            handshake_timeout: Duration::from_millis(self.handshake_timeout_ms),
            stop_timeout: self.stop_timeout(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}
