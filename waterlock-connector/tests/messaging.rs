use std::sync::Arc;
use waterlock_connector::{
    config::{Backend, ConnectorConfig, FanOut},
    link::{self, Platform},
    peer::PeerNode,
    sim::{SimCall, SimulatedCompanion},
    LinkError,
};

fn messaging_config(fan_out: FanOut) -> Arc<ConnectorConfig> {
    let mut config = ConnectorConfig::default();
    config.backend = Backend::Messaging;
    config.messaging.fan_out = fan_out;
    Arc::new(config)
}

fn peers(ids: &[&str]) -> Vec<PeerNode> {
    ids.iter().map(|id| PeerNode::new(*id)).collect()
}

#[tokio::test]
async fn test_no_connected_nodes_reports_no_peer_and_sends_nothing() -> anyhow::Result<()> {
    let companion = Arc::new(SimulatedCompanion::new(Vec::new()));
    let link = link::start(
        messaging_config(FanOut::Sequential),
        Platform::simulated(companion.clone()),
    );

    let result = link.enable_water_lock().await;

    assert_eq!(result, Err(LinkError::NoPeerFound));
    assert_eq!(companion.writes(), 0);
    assert_eq!(companion.calls(), vec![SimCall::ConnectedNodes]);
    Ok(())
}

#[tokio::test]
async fn test_single_node_success_sends_empty_payload_on_water_lock_path() -> anyhow::Result<()> {
    let companion = Arc::new(SimulatedCompanion::new(peers(&["watch-peer"])));
    let link = link::start(
        messaging_config(FanOut::Sequential),
        Platform::simulated(companion.clone()),
    );

    let report = link.enable_water_lock().await?;

    assert!(report.all_delivered());
    assert_eq!(report.backend, Backend::Messaging);
    assert_eq!(
        companion.calls()[1],
        SimCall::SendMessage {
            peer: "watch-peer".to_string(),
            path: "/water_lock_mode".to_string(),
            payload: Vec::new(),
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_failure_on_one_node_does_not_stop_the_others() -> anyhow::Result<()> {
    // === Arrange ===
    let companion = Arc::new(
        SimulatedCompanion::new(peers(&["a", "b", "c"])).with_send_code("b", 4004),
    );
    let link = link::start(
        messaging_config(FanOut::Sequential),
        Platform::simulated(companion.clone()),
    );

    // === Act ===
    let report = link.enable_water_lock().await?;

    // === Assert ===
    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.delivered(), 2);
    assert!(report.outcome_for("a").unwrap().is_delivered());
    assert_eq!(
        report.outcome_for("b").unwrap().result,
        Err(LinkError::SendFailed(4004))
    );
    assert!(report.outcome_for("c").unwrap().is_delivered());
    assert!(!report.all_delivered());
    assert_eq!(companion.writes(), 3);
    Ok(())
}

#[tokio::test]
async fn test_parallel_fan_out_keeps_discovery_order() -> anyhow::Result<()> {
    let companion = Arc::new(
        SimulatedCompanion::new(peers(&["first", "second", "third"]))
            .with_send_code("first", 7),
    );
    let link = link::start(
        messaging_config(FanOut::Parallel),
        Platform::simulated(companion.clone()),
    );

    let report = link.enable_water_lock().await?;

    let order: Vec<&str> = report.outcomes.iter().map(|o| o.peer.id.as_str()).collect();
    assert_eq!(order, vec!["first", "second", "third"]);
    assert_eq!(report.outcomes[0].result, Err(LinkError::SendFailed(7)));
    assert_eq!(report.delivered(), 2);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_discovery_service_is_transport_unavailable() -> anyhow::Result<()> {
    let companion = Arc::new(SimulatedCompanion::new(peers(&["a"])).with_discovery_unavailable());
    let link = link::start(
        messaging_config(FanOut::Sequential),
        Platform::simulated(companion.clone()),
    );

    let result = link.enable_water_lock().await;

    assert!(matches!(result, Err(LinkError::TransportUnavailable(_))));
    assert_eq!(companion.writes(), 0);
    Ok(())
}

#[tokio::test]
async fn test_repeated_taps_yield_identical_outcomes() -> anyhow::Result<()> {
    let companion = Arc::new(SimulatedCompanion::new(peers(&["a", "b"])).with_send_code("a", 1));
    let link = link::start(
        messaging_config(FanOut::Sequential),
        Platform::simulated(companion.clone()),
    );

    let (first, second) = tokio::join!(link.enable_water_lock(), link.enable_water_lock());

    assert_eq!(first?.outcomes, second?.outcomes);
    // Two identical writes per peer and nothing else.
    assert_eq!(companion.writes(), 4);
    Ok(())
}

#[tokio::test]
async fn test_configured_payload_is_sent_verbatim() -> anyhow::Result<()> {
    let mut config = ConnectorConfig::default();
    config.command.payload = vec![0x57, 0x4c];
    config.messaging.path = "/custom".to_string();
    let companion = Arc::new(SimulatedCompanion::new(peers(&["a"])));
    let link = link::start(Arc::new(config), Platform::simulated(companion.clone()));

    link.enable_water_lock().await?;

    assert!(companion.calls().contains(&SimCall::SendMessage {
        peer: "a".to_string(),
        path: "/custom".to_string(),
        payload: vec![0x57, 0x4c],
    }));
    Ok(())
}
