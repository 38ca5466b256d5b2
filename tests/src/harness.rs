//! Shared setup for the end-to-end scenarios.

use std::path::Path;
use std::time::Duration;

use relay_core::NumericValue;
use relay_node::{NodeConfig, ProxyNode, RoleService};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Upper bound for any single wait in a scenario.
pub const SCENARIO_TIMEOUT: Duration = Duration::from_secs(10);

/// A running Proxy on an ephemeral port plus a scratch output directory.
pub struct Rig {
    pub dir: TempDir,
    pub root: CancellationToken,
    pub proxy: ProxyNode,
}

impl Rig {
    /// Bind and start the Proxy.
    ///
    /// # Panics
    ///
    /// Panics if the scratch directory or the listener cannot be created.
    pub async fn start() -> Self {
        let dir = TempDir::new().expect("scratch dir");
        let proxy = ProxyNode::bind(NodeConfig::for_testing(dir.path()))
            .await
            .expect("bind proxy");
        let root = CancellationToken::new();
        proxy.start(&root).expect("start proxy");
        Self { dir, root, proxy }
    }

    /// Config for an Initiator or Echo node pointed at this rig's Proxy.
    pub fn node_config(&self) -> NodeConfig {
        NodeConfig {
            port: self.proxy.router().local_addr().port(),
            ..NodeConfig::for_testing(self.dir.path())
        }
    }
}

/// Poll `check` every 10 ms until it holds.
///
/// # Panics
///
/// Panics with `what` if the condition does not hold within
/// [`SCENARIO_TIMEOUT`].
pub async fn eventually<F: Fn() -> bool>(what: &str, check: F) {
    let deadline = tokio::time::Instant::now() + SCENARIO_TIMEOUT;
    while !check() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Parse an output file: one decimal value per line.
///
/// # Panics
///
/// Panics if the file is missing or holds anything but values.
pub fn read_values(path: &Path) -> Vec<NumericValue> {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
        .lines()
        .map(|line| line.parse().expect("numeric line"))
        .collect()
}
