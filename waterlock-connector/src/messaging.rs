//! # Generic Messaging Path
//!
//! Lists the connected nodes and sends the command to each of them on the configured
//! path. Nothing is kept between taps: every call discovers afresh.

use crate::{
    command::Command,
    config::{Backend, ConnectorConfig, FanOut},
    error::LinkError,
    link::WaterLockLink,
    peer::PeerNode,
    report::{DeliveryReport, PeerOutcome},
    transport::{MessageClient, NodeClient},
};
use async_trait::async_trait;
use futures::future;
use std::sync::Arc;

pub struct MessagingLink {
    config: Arc<ConnectorConfig>,
    command: Command,
    nodes: Arc<dyn NodeClient>,
    messages: Arc<dyn MessageClient>,
}

impl MessagingLink {
    pub fn new(
        config: Arc<ConnectorConfig>,
        nodes: Arc<dyn NodeClient>,
        messages: Arc<dyn MessageClient>,
    ) -> Self {
        let command = Command::from_config(&config.command);
        Self {
            config,
            command,
            nodes,
            messages,
        }
    }

    /// Sends the command to one node. Failures stay local to that node.
    async fn deliver(&self, node: PeerNode) -> PeerOutcome {
        let path = &self.config.messaging.path;
        match self
            .messages
            .send_message(&node, path, self.command.as_bytes())
            .await
        {
            Ok(code) if code.is_success() => {
                tracing::info!(peer = %node, "Water Lock enabled");
                PeerOutcome::delivered(node)
            }
            Ok(code) => {
                tracing::error!(peer = %node, code = code.0, "Failed to enable Water Lock");
                PeerOutcome::failed(node, LinkError::SendFailed(code.0))
            }
            Err(e) => {
                tracing::error!(peer = %node, error = %e, "Error enabling Water Lock");
                PeerOutcome::failed(node, e)
            }
        }
    }
}

#[async_trait]
impl WaterLockLink for MessagingLink {
    fn backend(&self) -> Backend {
        Backend::Messaging
    }

    async fn enable_water_lock(&self) -> Result<DeliveryReport, LinkError> {
        tracing::debug!("Attempting to get connected nodes");
        let nodes = self.nodes.connected_nodes().await.inspect_err(|e| {
            tracing::error!(error = %e, "Node discovery failed");
        })?;

        if nodes.is_empty() {
            tracing::warn!("No connected nodes found");
            return Err(LinkError::NoPeerFound);
        }
        for node in &nodes {
            tracing::debug!(peer = %node, "Found connected node");
        }

        let mut report = DeliveryReport::new(Backend::Messaging);
        match self.config.messaging.fan_out {
            FanOut::Sequential => {
                for node in nodes {
                    report.push(self.deliver(node).await);
                }
            }
            FanOut::Parallel => {
                // join_all keeps input order, so outcomes stay in discovery order.
                let sends = nodes.into_iter().map(|node| self.deliver(node));
                for outcome in future::join_all(sends).await {
                    report.push(outcome);
                }
            }
        }
        Ok(report)
    }
}
