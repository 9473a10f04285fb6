//! # Tap Controller
//!
//! Turns a tap on the Water Lock icon into one background delivery task and reports
//! the result back to the UI as a transient [`StatusMessage`]. The UI loop never waits
//! for the transport.

use crate::{error::LinkError, link::WaterLockLink, report::DeliveryReport};
use std::{fmt, sync::Arc};
use tokio::{sync::mpsc, task::JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// A short, non-blocking notification for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub severity: Severity,
    pub text: String,
}

impl StatusMessage {
    fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn from_result(result: &Result<DeliveryReport, LinkError>) -> Self {
        match result {
            Ok(report) => Self::from(report),
            Err(e) => Self::from(e),
        }
    }
}

impl From<&DeliveryReport> for StatusMessage {
    fn from(report: &DeliveryReport) -> Self {
        let total = report.outcomes.len();
        let delivered = report.delivered();
        if report.all_delivered() {
            StatusMessage::info("Water Lock enabled")
        } else if delivered == 0 {
            StatusMessage::error("Failed to enable Water Lock")
        } else {
            StatusMessage::error(format!(
                "Water Lock enabled on {delivered} of {total} devices"
            ))
        }
    }
}

impl From<&LinkError> for StatusMessage {
    fn from(err: &LinkError) -> Self {
        match err {
            LinkError::NoPeerFound => StatusMessage::error("No peer available"),
            LinkError::DependencyMissing { .. } => {
                StatusMessage::error("Install the accessory service to use Water Lock")
            }
            LinkError::TransportUnavailable(_) | LinkError::AgentClosed => {
                StatusMessage::error("Companion connection unavailable")
            }
            LinkError::ConnectFailed(_) | LinkError::SendFailed(_) => {
                StatusMessage::error("Failed to enable Water Lock")
            }
        }
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Runs the Water Lock flow for taps coming from the UI.
#[derive(Clone)]
pub struct WaterLockController {
    link: Arc<dyn WaterLockLink>,
    status_tx: mpsc::Sender<StatusMessage>,
}

impl WaterLockController {
    /// Creates the controller and the receiver the UI reads status messages from.
    pub fn new(
        link: Arc<dyn WaterLockLink>,
        status_buffer: usize,
    ) -> (Self, mpsc::Receiver<StatusMessage>) {
        let (status_tx, status_rx) = mpsc::channel(status_buffer);
        (Self { link, status_tx }, status_rx)
    }

    pub fn link(&self) -> &Arc<dyn WaterLockLink> {
        &self.link
    }

    /// Spawns the delivery for one tap and returns immediately.
    ///
    /// Repeated taps are not serialized against each other; the command is idempotent.
    pub fn on_tap(&self) -> JoinHandle<()> {
        tracing::debug!("Icon clicked");
        let link = self.link.clone();
        let status_tx = self.status_tx.clone();
        tokio::spawn(async move {
            let result = link.enable_water_lock().await;
            match &result {
                Ok(report) => tracing::info!(
                    backend = %link.backend(),
                    delivered = report.delivered(),
                    failed = report.failed(),
                    "Water Lock delivery finished"
                ),
                Err(e) => tracing::error!(
                    backend = %link.backend(),
                    error = %e,
                    "Error enabling Water Lock"
                ),
            }
            if status_tx.send(StatusMessage::from_result(&result)).await.is_err() {
                tracing::warn!("Status receiver dropped, notification lost");
            }
        })
    }
}
