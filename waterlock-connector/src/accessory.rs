//! # Vendor Accessory Path
//!
//! `AccessoryLink` is the tap-facing half of the accessory backend. It makes sure the
//! vendor accessory service is installed, then hands the tap to the
//! [`AccessoryAgent`](crate::agent::AccessoryAgent) that owns the socket.

use crate::{
    agent::AgentHandle,
    config::{Backend, ConnectorConfig},
    error::LinkError,
    link::WaterLockLink,
    report::DeliveryReport,
    transport::PackageManager,
};
use async_trait::async_trait;
use std::sync::Arc;

pub struct AccessoryLink {
    config: Arc<ConnectorConfig>,
    agent: AgentHandle,
    packages: Arc<dyn PackageManager>,
}

impl AccessoryLink {
    pub fn new(
        config: Arc<ConnectorConfig>,
        agent: AgentHandle,
        packages: Arc<dyn PackageManager>,
    ) -> Self {
        Self {
            config,
            agent,
            packages,
        }
    }

    pub fn agent(&self) -> &AgentHandle {
        &self.agent
    }

    /// Prompts the install flow when the accessory service is missing.
    fn ensure_service_installed(&self) -> Result<(), LinkError> {
        let accessory = &self.config.accessory;
        if self.packages.is_installed(&accessory.service_package) {
            return Ok(());
        }

        tracing::warn!(
            package = %accessory.service_package,
            "Accessory service is not installed, opening store page"
        );
        if let Err(e) = self.packages.open_store_page(&accessory.store_uri) {
            tracing::error!(uri = %accessory.store_uri, error = %e, "Failed to open store page");
        }
        Err(LinkError::DependencyMissing {
            package: accessory.service_package.clone(),
        })
    }
}

#[async_trait]
impl WaterLockLink for AccessoryLink {
    fn backend(&self) -> Backend {
        Backend::Accessory
    }

    async fn enable_water_lock(&self) -> Result<DeliveryReport, LinkError> {
        self.ensure_service_installed()?;
        self.agent.send_water_lock().await
    }

    async fn shutdown(&self) {
        self.agent.stop().await;
    }
}
