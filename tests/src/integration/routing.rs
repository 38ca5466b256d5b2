//! # Routing
//!
//! Proxy behaviour around the happy path: peers that fail the handshake,
//! several connections per role, and the Proxy going away.

#[cfg(test)]
mod tests {
    use relay_core::transport::wire;
    use relay_core::{PeerType, WorkerState};
    use relay_node::{EchoNode, InitiatorNode, NodeConfig, RoleService};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    use crate::harness::{eventually, read_values, Rig, SCENARIO_TIMEOUT};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_bogus_peer_does_not_disturb_traffic() {
        let rig = Rig::start().await;
        let config = NodeConfig {
            emit_limit: Some(30),
            ..rig.node_config()
        };
        let echo = EchoNode::new(config.clone()).unwrap();
        echo.start(&rig.root).unwrap();

        let mut bogus = TcpStream::connect(rig.proxy.router().local_addr()).await.unwrap();
        bogus.write_u8(42).await.unwrap();
        let mut byte = [0u8; 1];
        let read = tokio::time::timeout(SCENARIO_TIMEOUT, bogus.read(&mut byte))
            .await
            .unwrap();
        assert!(matches!(read, Ok(0) | Err(_)));

        let initiator = InitiatorNode::new(config.clone()).unwrap();
        initiator.start(&rig.root).unwrap();
        eventually("values back", || initiator.received_count() == 30).await;

        let live = rig.proxy.router().live_connections();
        assert_eq!(live.len(), 2);
        assert!(live.iter().all(|(_, peer)| *peer != PeerType::Proxy));

        initiator.stop().await.unwrap();
        echo.stop().await.unwrap();
        rig.proxy.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_values_split_across_echo_connections() {
        let rig = Rig::start().await;
        let router = rig.proxy.router();

        let mut initiator = TcpStream::connect(router.local_addr()).await.unwrap();
        wire::write_peer_type(&mut initiator, PeerType::Initiator).await.unwrap();
        let mut echoes = Vec::new();
        for _ in 0..2 {
            let mut echo = TcpStream::connect(router.local_addr()).await.unwrap();
            wire::write_peer_type(&mut echo, PeerType::Echo).await.unwrap();
            echoes.push(echo);
        }
        eventually("all peers classified", || {
            router.live_count(PeerType::Initiator) == 1 && router.live_count(PeerType::Echo) == 2
        })
        .await;

        for value in 1..=40 {
            wire::write_value(&mut initiator, value).await.unwrap();
        }

        // Each value reaches exactly one echo connection
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        for mut echo in echoes {
            let tx = tx.clone();
            tokio::spawn(async move {
                while let Ok(value) = wire::read_value(&mut echo).await {
                    if tx.send(value).is_err() {
                        break;
                    }
                }
            });
        }
        let mut delivered = Vec::new();
        while delivered.len() < 40 {
            let value = tokio::time::timeout(SCENARIO_TIMEOUT, rx.recv())
                .await
                .expect("values missing")
                .expect("readers alive");
            delivered.push(value);
        }
        delivered.sort_unstable();
        assert_eq!(delivered, (1..=40).collect::<Vec<_>>());

        rig.proxy.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_proxy_shutdown_ends_connected_roles() {
        let rig = Rig::start().await;
        let config = NodeConfig {
            connections: 2,
            emit_limit: Some(10),
            ..rig.node_config()
        };
        let echo = EchoNode::new(config.clone()).unwrap();
        echo.start(&rig.root).unwrap();
        let initiator = InitiatorNode::new(config.clone()).unwrap();
        initiator.start(&rig.root).unwrap();
        eventually("values back", || initiator.received_count() == 10).await;

        rig.proxy.stop().await.unwrap();
        eventually("initiator finished", || initiator.state() == WorkerState::Stopped).await;
        eventually("echo finished", || echo.state() == WorkerState::Stopped).await;

        // Both roles flushed on their own once every connection was gone
        let received = read_values(&config.output_path(&config.initiator_receive_file));
        assert_eq!(received, (1..=10).collect::<Vec<_>>());
        assert_eq!(read_values(&config.output_path(&config.echo_file)).len(), 10);
    }
}
