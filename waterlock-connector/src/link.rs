use crate::{
    accessory::AccessoryLink,
    agent::AccessoryAgent,
    config::{Backend, ConnectorConfig},
    error::LinkError,
    messaging::MessagingLink,
    report::DeliveryReport,
    sim::SimulatedCompanion,
    transport::{AccessoryFramework, MessageClient, NodeClient, PackageManager},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Sends the Water Lock command to the paired companion devices.
///
/// Both backends implement this contract; callers do not know which one they hold.
#[async_trait]
pub trait WaterLockLink: Send + Sync {
    fn backend(&self) -> Backend;

    /// Performs one fire-and-forget delivery attempt.
    ///
    /// `Err` means no peer could be attempted at all (no peer, transport down, missing
    /// dependency). Per-peer failures are reported inside the [`DeliveryReport`].
    async fn enable_water_lock(&self) -> Result<DeliveryReport, LinkError>;

    /// Releases background resources held by the backend.
    async fn shutdown(&self) {}
}

/// The platform collaborators a link may need.
#[derive(Clone)]
pub struct Platform {
    pub nodes: Arc<dyn NodeClient>,
    pub messages: Arc<dyn MessageClient>,
    pub accessory: Arc<dyn AccessoryFramework>,
    pub packages: Arc<dyn PackageManager>,
}

impl Platform {
    /// Wires every seam to the same simulated companion.
    pub fn simulated(companion: Arc<SimulatedCompanion>) -> Self {
        Self {
            nodes: companion.clone(),
            messages: companion.clone(),
            accessory: companion.clone(),
            packages: companion,
        }
    }
}

/// Builds the link selected by `config.backend`.
///
/// For the accessory backend this spawns the [`AccessoryAgent`] task, so it must be
/// called from within a Tokio runtime.
pub fn start(config: Arc<ConnectorConfig>, platform: Platform) -> Arc<dyn WaterLockLink> {
    tracing::info!(backend = %config.backend, "Starting Water Lock link");
    match config.backend {
        Backend::Messaging => Arc::new(MessagingLink::new(
            config,
            platform.nodes,
            platform.messages,
        )),
        Backend::Accessory => {
            let handle = AccessoryAgent::spawn(config.clone(), platform.accessory);
            Arc::new(AccessoryLink::new(config, handle, platform.packages))
        }
    }
}
