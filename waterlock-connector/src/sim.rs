//! # Simulated Companion
//!
//! An in-memory stand-in for the wearable platform and the vendor accessory framework.
//! It implements every seam in [`crate::transport`], answers framework requests with the
//! same callbacks a real framework would post, and records every call it receives.
//!
//! The application shell uses it when no real platform bindings are present, and the
//! tests use it to script companion behavior.

use crate::{
    error::LinkError,
    events::{AgentEvent, CONNECTION_SUCCESS, FINDPEER_DEVICE_NOT_CONNECTED},
    peer::{PeerNode, ResultCode, SocketId},
    transport::{AccessoryFramework, MessageClient, NodeClient, PackageManager},
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};
use tokio::sync::mpsc;

/// Result code returned when writing to a socket the companion does not know.
pub const SOCKET_CLOSED: i32 = -1;

/// A call received by the simulated companion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCall {
    ConnectedNodes,
    SendMessage {
        peer: String,
        path: String,
        payload: Vec<u8>,
    },
    RequestAgent,
    FindPeerAgents,
    RequestServiceConnection {
        peer: String,
    },
    Send {
        peer: Option<String>,
        socket: SocketId,
        channel_id: u16,
        payload: Vec<u8>,
    },
    Close {
        socket: SocketId,
    },
    OpenStorePage {
        uri: String,
    },
}

impl SimCall {
    /// `true` for calls that write the command to a peer.
    pub fn is_write(&self) -> bool {
        matches!(self, SimCall::SendMessage { .. } | SimCall::Send { .. })
    }
}

struct SimState {
    peers: Vec<PeerNode>,
    discovery_available: bool,
    accessory_installed: bool,
    agent_error: Option<i32>,
    search_result: Option<i32>,
    rejected_requests: HashMap<String, i32>,
    connect_codes: HashMap<String, i32>,
    default_connect_code: i32,
    send_codes: HashMap<String, i32>,
    default_send_code: i32,
    events: Option<mpsc::Sender<AgentEvent>>,
    next_socket: u64,
    sockets: HashMap<SocketId, PeerNode>,
    calls: Vec<SimCall>,
}

pub struct SimulatedCompanion {
    state: Mutex<SimState>,
}

impl SimulatedCompanion {
    /// A companion that discovers `peers`, accepts every connection and acknowledges
    /// every write.
    pub fn new(peers: impl IntoIterator<Item = PeerNode>) -> Self {
        Self {
            state: Mutex::new(SimState {
                peers: peers.into_iter().collect(),
                discovery_available: true,
                accessory_installed: true,
                agent_error: None,
                search_result: None,
                rejected_requests: HashMap::new(),
                connect_codes: HashMap::new(),
                default_connect_code: CONNECTION_SUCCESS,
                send_codes: HashMap::new(),
                default_send_code: 0,
                events: None,
                next_socket: 1,
                sockets: HashMap::new(),
                calls: Vec::new(),
            }),
        }
    }

    pub fn with_connect_code(mut self, peer_id: &str, code: i32) -> Self {
        self.state_mut().connect_codes.insert(peer_id.to_string(), code);
        self
    }

    pub fn with_default_connect_code(mut self, code: i32) -> Self {
        self.state_mut().default_connect_code = code;
        self
    }

    pub fn with_send_code(mut self, peer_id: &str, code: i32) -> Self {
        self.state_mut().send_codes.insert(peer_id.to_string(), code);
        self
    }

    pub fn with_default_send_code(mut self, code: i32) -> Self {
        self.state_mut().default_send_code = code;
        self
    }

    pub fn without_accessory_service(mut self) -> Self {
        self.state_mut().accessory_installed = false;
        self
    }

    pub fn with_discovery_unavailable(mut self) -> Self {
        self.state_mut().discovery_available = false;
        self
    }

    /// Answers `request_agent` with `AgentError { code }` instead of `AgentAvailable`.
    pub fn with_agent_error(mut self, code: i32) -> Self {
        self.state_mut().agent_error = Some(code);
        self
    }

    /// Answers every peer search with `code`, whatever peers are known.
    pub fn with_search_result(mut self, code: i32) -> Self {
        self.state_mut().search_result = Some(code);
        self
    }

    /// Makes `request_service_connection` for `peer_id` fail outright with `code`,
    /// without posting a connection response.
    pub fn with_rejected_connection_request(mut self, peer_id: &str, code: i32) -> Self {
        self.state_mut()
            .rejected_requests
            .insert(peer_id.to_string(), code);
        self
    }

    pub fn set_peers(&self, peers: impl IntoIterator<Item = PeerNode>) {
        self.state().peers = peers.into_iter().collect();
    }

    pub fn set_send_code(&self, peer_id: &str, code: i32) {
        self.state().send_codes.insert(peer_id.to_string(), code);
    }

    pub fn install_accessory_service(&self) {
        self.state().accessory_installed = true;
    }

    pub fn calls(&self) -> Vec<SimCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Number of command writes received, over both backends.
    pub fn writes(&self) -> usize {
        self.state().calls.iter().filter(|c| c.is_write()).count()
    }

    pub fn open_sockets(&self) -> Vec<SocketId> {
        let mut sockets: Vec<SocketId> = self.state().sockets.keys().copied().collect();
        sockets.sort_by_key(|s| s.0);
        sockets
    }

    /// Tears down every open socket and posts `ConnectionLost` for each.
    pub async fn drop_connections(&self, reason: i32) {
        let dropped: Vec<SocketId> = self.state().sockets.drain().map(|(s, _)| s).collect();
        for socket in dropped {
            self.post(AgentEvent::ConnectionLost { socket, reason }).await;
        }
    }

    /// Posts an unsolicited service connection response for `peer`, opening a socket
    /// when `code` is a success.
    pub async fn push_connection_response(&self, peer: PeerNode, code: i32) -> Option<SocketId> {
        let socket = (code == CONNECTION_SUCCESS).then(|| self.open_socket(&peer));
        self.post(AgentEvent::ServiceConnectionResponse {
            peer,
            socket,
            result: ResultCode(code),
        })
        .await;
        socket
    }

    /// Posts inbound bytes on the first open socket, if there is one.
    pub async fn push_inbound(&self, channel_id: u16, data: Vec<u8>) {
        let socket = self.open_sockets().first().copied();
        if let Some(socket) = socket {
            self.post(AgentEvent::DataReceived {
                socket,
                channel_id,
                data,
            })
            .await;
        }
    }

    /// Posts a channel error on the first open socket, if there is one.
    pub async fn push_channel_error(&self, channel_id: u16, message: &str, code: i32) {
        let socket = self.open_sockets().first().copied();
        if let Some(socket) = socket {
            self.post(AgentEvent::ChannelError {
                socket,
                channel_id,
                message: message.to_string(),
                code,
            })
            .await;
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn state_mut(&mut self) -> &mut SimState {
        self.state.get_mut().unwrap_or_else(|e| e.into_inner())
    }

    fn open_socket(&self, peer: &PeerNode) -> SocketId {
        let mut state = self.state();
        let socket = SocketId(state.next_socket);
        state.next_socket += 1;
        state.sockets.insert(socket, peer.clone());
        socket
    }

    fn record(&self, call: SimCall) {
        self.state().calls.push(call);
    }

    async fn post(&self, event: AgentEvent) {
        let events = self.state().events.clone();
        match events {
            Some(events) => {
                if events.send(event).await.is_err() {
                    tracing::debug!("Agent event receiver dropped");
                }
            }
            None => tracing::debug!("No agent registered, dropping {:?}", event),
        }
    }

    fn send_code_for(&self, peer_id: &str) -> i32 {
        let state = self.state();
        state
            .send_codes
            .get(peer_id)
            .copied()
            .unwrap_or(state.default_send_code)
    }
}

#[async_trait]
impl NodeClient for SimulatedCompanion {
    async fn connected_nodes(&self) -> Result<Vec<PeerNode>, LinkError> {
        self.record(SimCall::ConnectedNodes);
        let state = self.state();
        if !state.discovery_available {
            return Err(LinkError::TransportUnavailable(
                "node discovery service is not reachable".to_string(),
            ));
        }
        Ok(state.peers.clone())
    }
}

#[async_trait]
impl MessageClient for SimulatedCompanion {
    async fn send_message(
        &self,
        node: &PeerNode,
        path: &str,
        payload: &[u8],
    ) -> Result<ResultCode, LinkError> {
        self.record(SimCall::SendMessage {
            peer: node.id.clone(),
            path: path.to_string(),
            payload: payload.to_vec(),
        });
        Ok(ResultCode(self.send_code_for(&node.id)))
    }
}

#[async_trait]
impl AccessoryFramework for SimulatedCompanion {
    async fn request_agent(&self, events: mpsc::Sender<AgentEvent>) -> Result<(), LinkError> {
        self.record(SimCall::RequestAgent);
        let agent_error = {
            let mut state = self.state();
            state.events = Some(events);
            state.agent_error
        };
        let event = match agent_error {
            Some(code) => AgentEvent::AgentError {
                code,
                message: "agent could not be created".to_string(),
            },
            None => AgentEvent::AgentAvailable,
        };
        self.post(event).await;
        Ok(())
    }

    async fn find_peer_agents(&self) -> Result<(), LinkError> {
        self.record(SimCall::FindPeerAgents);
        let (available, peers, search_result) = {
            let state = self.state();
            (state.discovery_available, state.peers.clone(), state.search_result)
        };
        if !available {
            return Err(LinkError::TransportUnavailable(
                "accessory framework is not reachable".to_string(),
            ));
        }
        let result = match search_result {
            Some(code) => ResultCode(code),
            None if peers.is_empty() => ResultCode(FINDPEER_DEVICE_NOT_CONNECTED),
            None => ResultCode::SUCCESS,
        };
        self.post(AgentEvent::PeersFound { peers, result }).await;
        Ok(())
    }

    async fn request_service_connection(&self, peer: &PeerNode) -> Result<(), LinkError> {
        self.record(SimCall::RequestServiceConnection {
            peer: peer.id.clone(),
        });
        let (rejected, code) = {
            let state = self.state();
            let code = state
                .connect_codes
                .get(&peer.id)
                .copied()
                .unwrap_or(state.default_connect_code);
            (state.rejected_requests.get(&peer.id).copied(), code)
        };
        if let Some(code) = rejected {
            return Err(LinkError::ConnectFailed(code));
        }
        self.push_connection_response(peer.clone(), code).await;
        Ok(())
    }

    async fn send(&self, socket: SocketId, channel_id: u16, payload: &[u8]) -> ResultCode {
        let peer = self.state().sockets.get(&socket).map(|p| p.id.clone());
        self.record(SimCall::Send {
            peer: peer.clone(),
            socket,
            channel_id,
            payload: payload.to_vec(),
        });
        match peer {
            Some(peer) => ResultCode(self.send_code_for(&peer)),
            None => ResultCode(SOCKET_CLOSED),
        }
    }

    async fn close(&self, socket: SocketId) {
        self.record(SimCall::Close { socket });
        self.state().sockets.remove(&socket);
    }
}

impl PackageManager for SimulatedCompanion {
    fn is_installed(&self, _package: &str) -> bool {
        self.state().accessory_installed
    }

    fn open_store_page(&self, uri: &str) -> Result<(), LinkError> {
        self.record(SimCall::OpenStorePage {
            uri: uri.to_string(),
        });
        Ok(())
    }
}
