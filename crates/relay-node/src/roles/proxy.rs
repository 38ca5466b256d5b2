//! Proxy role: a [`ProxyRouter`] behind the role surface.

use std::sync::Arc;

use async_trait::async_trait;
use relay_core::{PeerType, ProxyRouter, RelayError, WorkerState};
use tokio_util::sync::CancellationToken;

use super::RoleService;
use crate::config::NodeConfig;
use crate::error::NodeError;

pub struct ProxyNode {
    config: NodeConfig,
    router: Arc<ProxyRouter>,
}

impl ProxyNode {
    /// Bind the listener on `host:port`. Accepting starts with
    /// [`RoleService::start`].
    pub async fn bind(config: NodeConfig) -> Result<Self, NodeError> {
        let router = ProxyRouter::bind(&config.proxy_addr(), config.router_config()).await?;
        Ok(Self {
            config,
            router: Arc::new(router),
        })
    }

    pub fn router(&self) -> &Arc<ProxyRouter> {
        &self.router
    }
}

#[async_trait]
impl RoleService for ProxyNode {
    fn role(&self) -> PeerType {
        PeerType::Proxy
    }

    fn state(&self) -> WorkerState {
        self.router.state()
    }

    fn start(&self, parent: &CancellationToken) -> Result<(), RelayError> {
        self.router.start(parent).map(drop)
    }

    async fn stop(&self) -> Result<(), RelayError> {
        self.router.stop(self.config.stop_timeout()).await
    }
}
