use std::sync::Arc;
use waterlock_connector::{
    config::{Backend, ConnectorConfig},
    controller::{Severity, StatusMessage, WaterLockController},
    link::{self, Platform},
    peer::PeerNode,
    sim::SimulatedCompanion,
};

fn controller_for(
    backend: Backend,
    companion: &Arc<SimulatedCompanion>,
) -> (
    WaterLockController,
    tokio::sync::mpsc::Receiver<StatusMessage>,
) {
    let mut config = ConnectorConfig::default();
    config.backend = backend;
    let config = Arc::new(config);
    let link = link::start(config.clone(), Platform::simulated(companion.clone()));
    WaterLockController::new(link, config.channels.status_buffer)
}

#[tokio::test]
async fn test_tap_with_no_peer_shows_transient_error() -> anyhow::Result<()> {
    let companion = Arc::new(SimulatedCompanion::new(Vec::new()));
    let (controller, mut status_rx) = controller_for(Backend::Messaging, &companion);

    controller.on_tap().await?;

    let status = status_rx.recv().await.expect("status message");
    assert_eq!(status.severity, Severity::Error);
    assert_eq!(status.text, "No peer available");
    assert_eq!(companion.writes(), 0);
    Ok(())
}

#[tokio::test]
async fn test_tap_with_one_peer_shows_success() -> anyhow::Result<()> {
    let companion = Arc::new(SimulatedCompanion::new(vec![PeerNode::new("gear")]));
    let (controller, mut status_rx) = controller_for(Backend::Accessory, &companion);

    controller.on_tap().await?;

    let status = status_rx.recv().await.expect("status message");
    assert!(!status.is_error());
    assert_eq!(status.to_string(), "Water Lock enabled");
    controller.link().shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_partial_delivery_is_reported_as_failure() -> anyhow::Result<()> {
    let companion = Arc::new(
        SimulatedCompanion::new(vec![PeerNode::new("a"), PeerNode::new("b")])
            .with_send_code("b", 9),
    );
    let (controller, mut status_rx) = controller_for(Backend::Messaging, &companion);

    controller.on_tap().await?;

    let status = status_rx.recv().await.expect("status message");
    assert!(status.is_error());
    assert_eq!(status.text, "Water Lock enabled on 1 of 2 devices");
    Ok(())
}

#[tokio::test]
async fn test_missing_dependency_is_not_fatal() -> anyhow::Result<()> {
    let companion = Arc::new(
        SimulatedCompanion::new(vec![PeerNode::new("gear")]).without_accessory_service(),
    );
    let (controller, mut status_rx) = controller_for(Backend::Accessory, &companion);

    controller.on_tap().await?;
    let status = status_rx.recv().await.expect("status message");
    assert_eq!(status.text, "Install the accessory service to use Water Lock");

    // Once installed, the next tap goes through.
    companion.install_accessory_service();
    controller.on_tap().await?;
    let status = status_rx.recv().await.expect("status message");
    assert_eq!(status.text, "Water Lock enabled");
    Ok(())
}
