//! # Round Trip
//!
//! Every value the Initiator sends travels to the Echo node and back, and
//! every node's output file ends up holding exactly those values in
//! ascending order.

#[cfg(test)]
mod tests {
    use relay_core::{NumericValue, PeerType};
    use relay_node::{EchoNode, InitiatorNode, NodeConfig, RoleService};

    use crate::harness::{eventually, read_values, Rig};

    async fn run_round_trip(connections: usize, emit_limit: NumericValue) {
        let rig = Rig::start().await;
        let config = NodeConfig {
            connections,
            emit_limit: Some(emit_limit),
            ..rig.node_config()
        };

        let echo = EchoNode::new(config.clone()).unwrap();
        echo.start(&rig.root).unwrap();
        eventually("echo connections", || {
            rig.proxy.router().live_count(PeerType::Echo) == connections
        })
        .await;

        let initiator = InitiatorNode::new(config.clone()).unwrap();
        initiator.start(&rig.root).unwrap();
        eventually("all values back at the initiator", || {
            initiator.received_count() == emit_limit as u64
        })
        .await;

        assert_eq!(initiator.sent_count(), emit_limit as u64);
        assert_eq!(echo.echoed_count(), emit_limit as u64);
        assert_eq!(echo.queued(), 0);

        initiator.stop().await.unwrap();
        echo.stop().await.unwrap();
        rig.proxy.stop().await.unwrap();

        let expected: Vec<NumericValue> = (1..=emit_limit).collect();
        for file in [
            &config.initiator_send_file,
            &config.initiator_receive_file,
            &config.echo_file,
        ] {
            assert_eq!(read_values(&config.output_path(file)), expected, "{file}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_connection_round_trip() {
        run_round_trip(1, 50).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fan_in_round_trip() {
        run_round_trip(3, 200).await;
    }

    /// Windows far smaller than the run: values leave the ordering buffers by
    /// eviction while three connections push concurrently. Late values may be
    /// written out of place, but none may be lost or written twice.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_small_windows_keep_every_value_once() {
        const EMIT: NumericValue = 600;

        let rig = Rig::start().await;
        let config = NodeConfig {
            connections: 3,
            emit_limit: Some(EMIT),
            initiator_send_threshold: 10,
            initiator_receive_threshold: 20,
            echo_threshold: 20,
            ..rig.node_config()
        };

        let echo = EchoNode::new(config.clone()).unwrap();
        echo.start(&rig.root).unwrap();
        eventually("echo connections", || {
            rig.proxy.router().live_count(PeerType::Echo) == 3
        })
        .await;

        let initiator = InitiatorNode::new(config.clone()).unwrap();
        initiator.start(&rig.root).unwrap();
        eventually("all values back at the initiator", || {
            initiator.received_count() == EMIT as u64
        })
        .await;

        let evicted = read_values(&config.output_path(&config.echo_file));
        assert!(
            evicted.len() >= (EMIT as usize) - 20,
            "echo log only had {} values before flush",
            evicted.len()
        );

        initiator.stop().await.unwrap();
        echo.stop().await.unwrap();
        rig.proxy.stop().await.unwrap();

        let expected: Vec<NumericValue> = (1..=EMIT).collect();
        for file in [
            &config.initiator_send_file,
            &config.initiator_receive_file,
            &config.echo_file,
        ] {
            let mut values = read_values(&config.output_path(file));
            assert_eq!(values.len(), EMIT as usize, "{file}");
            values.sort_unstable();
            assert_eq!(values, expected, "{file}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_initiator_before_echo() {
        let rig = Rig::start().await;
        let config = NodeConfig {
            emit_limit: Some(20),
            ..rig.node_config()
        };

        let initiator = InitiatorNode::new(config.clone()).unwrap();
        initiator.start(&rig.root).unwrap();
        eventually("values queued at the proxy", || {
            rig.proxy.router().queued_from(PeerType::Initiator) == 20
        })
        .await;
        assert_eq!(initiator.received_count(), 0);

        let echo = EchoNode::new(config.clone()).unwrap();
        echo.start(&rig.root).unwrap();
        eventually("queued values returned", || initiator.received_count() == 20).await;

        rig.root.cancel();
        initiator.stop().await.unwrap();
        echo.stop().await.unwrap();
        rig.proxy.stop().await.unwrap();

        let received = read_values(&config.output_path(&config.initiator_receive_file));
        assert_eq!(received, (1..=20).collect::<Vec<_>>());
    }
}
