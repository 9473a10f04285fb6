//! # Platform Seams
//!
//! The connector never talks to the wearable platform or to the vendor SDK directly.
//! Every collaborator sits behind one of these traits, so the backends can run against
//! the real platform bindings, the [`crate::sim::SimulatedCompanion`], or a test double.

use crate::{
    error::LinkError,
    events::AgentEvent,
    peer::{PeerNode, ResultCode, SocketId},
};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// The platform node-discovery service.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Lists the companion devices that are currently reachable.
    ///
    /// Fails with [`LinkError::TransportUnavailable`] when the service cannot be reached.
    async fn connected_nodes(&self) -> Result<Vec<PeerNode>, LinkError>;
}

/// The platform short-message transport.
#[async_trait]
pub trait MessageClient: Send + Sync {
    /// Sends `payload` to `node` on `path` and returns the platform result code.
    async fn send_message(
        &self,
        node: &PeerNode,
        path: &str,
        payload: &[u8],
    ) -> Result<ResultCode, LinkError>;
}

/// The vendor accessory framework.
///
/// Requests return as soon as they are accepted; their responses arrive later as
/// [`AgentEvent`]s on the sender registered with [`AccessoryFramework::request_agent`].
#[async_trait]
pub trait AccessoryFramework: Send + Sync {
    /// Asks for the application agent. Answered by `AgentAvailable` or `AgentError`.
    async fn request_agent(&self, events: mpsc::Sender<AgentEvent>) -> Result<(), LinkError>;

    /// Starts a peer search. Answered by `PeersFound`.
    async fn find_peer_agents(&self) -> Result<(), LinkError>;

    /// Starts a service connection to `peer`. Answered by `ServiceConnectionResponse`.
    async fn request_service_connection(&self, peer: &PeerNode) -> Result<(), LinkError>;

    /// Writes `payload` on `channel_id` of an open socket.
    ///
    /// Exceptions raised by the SDK are reported as a non-zero code.
    async fn send(&self, socket: SocketId, channel_id: u16, payload: &[u8]) -> ResultCode;

    /// Closes a socket. Closing an unknown socket is a no-op.
    async fn close(&self, socket: SocketId);
}

/// Package presence check and store deep links.
pub trait PackageManager: Send + Sync {
    fn is_installed(&self, package: &str) -> bool;

    /// Opens the store page at `uri` so the user can install a missing package.
    fn open_store_page(&self, uri: &str) -> Result<(), LinkError>;
}
