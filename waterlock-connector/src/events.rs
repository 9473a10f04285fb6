use crate::peer::{PeerNode, ResultCode, SocketId};

/// Result code of a successful peer search or service connection.
pub const CONNECTION_SUCCESS: i32 = 0;
/// The connection was lost for a reason the framework does not know.
pub const CONNECTION_LOST_UNKNOWN_REASON: i32 = 512;
/// The peer closed the connection.
pub const CONNECTION_LOST_PEER_DISCONNECTED: i32 = 513;
/// The companion device went out of range or was unpaired.
pub const CONNECTION_LOST_DEVICE_DETACHED: i32 = 521;
/// A service connection to the peer already exists; the socket is still valid.
pub const CONNECTION_ALREADY_EXIST: i32 = 1029;
/// The peer search ran, but no companion device is attached.
pub const FINDPEER_DEVICE_NOT_CONNECTED: i32 = 1793;
/// The companion is attached but does not offer the Water Lock service.
pub const FINDPEER_SERVICE_NOT_FOUND: i32 = 1794;

/// A callback delivered by the vendor accessory framework.
///
/// The framework reports everything asynchronously: agent availability, the response
/// to a peer search, the response to a connection request and the socket notifications.
/// All of them land on one channel consumed by the [`crate::agent::AccessoryAgent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// The agent requested with `request_agent` is ready.
    AgentAvailable,
    /// The agent could not be created.
    AgentError { code: i32, message: String },
    /// Response to `find_peer_agents`.
    PeersFound {
        peers: Vec<PeerNode>,
        result: ResultCode,
    },
    /// Response to `request_service_connection`.
    ServiceConnectionResponse {
        peer: PeerNode,
        socket: Option<SocketId>,
        result: ResultCode,
    },
    /// The socket was torn down by the framework.
    ConnectionLost { socket: SocketId, reason: i32 },
    /// The socket reported an error on one of its channels.
    ChannelError {
        socket: SocketId,
        channel_id: u16,
        message: String,
        code: i32,
    },
    /// Inbound bytes. Water Lock never expects any.
    DataReceived {
        socket: SocketId,
        channel_id: u16,
        data: Vec<u8>,
    },
}

impl AgentEvent {
    /// Returns `true` for a peer-search result that means "nobody is there" rather
    /// than "the search itself failed".
    pub fn is_empty_search(result: ResultCode) -> bool {
        matches!(
            result.0,
            FINDPEER_DEVICE_NOT_CONNECTED | FINDPEER_SERVICE_NOT_FOUND
        )
    }

    /// Returns `true` for a connection response that leaves a usable socket.
    pub fn is_connected(result: ResultCode) -> bool {
        matches!(result.0, CONNECTION_SUCCESS | CONNECTION_ALREADY_EXIST)
    }
}
