//! # Accessory Agent
//!
//! The `AccessoryAgent` is a background task that owns the connection to the companion.
//!
//! ## Purpose
//! The vendor framework reports everything through callbacks: agent availability, peer
//! search results, connection responses and socket notifications. The agent receives all
//! of them as [`AgentEvent`]s on one channel and feeds them to the [`LinkState`] machine.
//! Taps arrive on a second channel as [`AgentCommand`]s.
//!
//! Because the agent task is the only reader and writer of the socket slot, the handoff
//! between "connection response" and "send" needs no lock: both happen on this task.
use crate::{
    command::Command,
    config::{Backend, ConnectorConfig},
    error::LinkError,
    events::AgentEvent,
    report::DeliveryReport,
    state::{Action, LinkInput, LinkState},
    transport::AccessoryFramework,
};
use std::{collections::VecDeque, sync::Arc};
use tokio::sync::{mpsc, oneshot};

type Reply = oneshot::Sender<Result<DeliveryReport, LinkError>>;

/// Defines commands that can be sent to the agent task.
#[derive(Debug)]
pub enum AgentCommand {
    /// Deliver the Water Lock command and answer on the channel once done.
    SendWaterLock(Reply),
    /// Report the current status.
    Inspect(oneshot::Sender<AgentStatus>),
    Shutdown,
}

/// A snapshot of the agent, mostly useful for tests and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentStatus {
    pub available: bool,
    pub state: LinkState,
    pub in_flight: bool,
}

#[derive(Clone, Debug)]
pub struct AgentHandle {
    command_tx: mpsc::Sender<AgentCommand>,
}

impl AgentHandle {
    /// Asks the agent to deliver the command and waits for the report.
    pub async fn send_water_lock(&self) -> Result<DeliveryReport, LinkError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(AgentCommand::SendWaterLock(reply_tx))
            .await
            .map_err(|_| LinkError::AgentClosed)?;
        reply_rx.await.map_err(|_| LinkError::AgentClosed)?
    }

    /// Returns `None` once the agent has shut down.
    pub async fn status(&self) -> Option<AgentStatus> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(AgentCommand::Inspect(reply_tx))
            .await
            .ok()?;
        reply_rx.await.ok()
    }

    pub async fn stop(&self) {
        if self.command_tx.send(AgentCommand::Shutdown).await.is_err() {
            tracing::warn!("Failed to send shutdown to accessory agent: it may already be down");
        }
    }
}

/// The single owner of the accessory connection.
pub struct AccessoryAgent {
    config: Arc<ConnectorConfig>,
    framework: Arc<dyn AccessoryFramework>,
    command: Command,
    state: LinkState,
    available: bool,
    /// The report of the attempt in flight, if any.
    attempt: Option<DeliveryReport>,
    /// Taps waiting for the attempt in flight.
    waiters: Vec<Reply>,
    command_rx: mpsc::Receiver<AgentCommand>,
    event_tx: Option<mpsc::Sender<AgentEvent>>,
    event_rx: mpsc::Receiver<AgentEvent>,
}

impl AccessoryAgent {
    /// Creates a new `AccessoryAgent` and the handle used to talk to it.
    ///
    /// The agent does nothing until [`AccessoryAgent::run`] is spawned.
    pub fn new(
        config: Arc<ConnectorConfig>,
        framework: Arc<dyn AccessoryFramework>,
    ) -> (Self, AgentHandle) {
        let (command_tx, command_rx) = mpsc::channel(config.channels.agent_command_buffer);
        let (event_tx, event_rx) = mpsc::channel(config.channels.agent_event_buffer);
        let agent = Self {
            command: Command::from_config(&config.command),
            config,
            framework,
            state: LinkState::Idle,
            available: false,
            attempt: None,
            waiters: Vec::new(),
            command_rx,
            event_tx: Some(event_tx),
            event_rx,
        };
        (agent, AgentHandle { command_tx })
    }

    /// Creates the agent and spawns it on the current Tokio runtime.
    pub fn spawn(
        config: Arc<ConnectorConfig>,
        framework: Arc<dyn AccessoryFramework>,
    ) -> AgentHandle {
        let (agent, handle) = Self::new(config, framework);
        tokio::spawn(agent.run());
        handle
    }

    /// Requests the framework agent, then runs the event loop until shutdown.
    pub async fn run(mut self) {
        tracing::info!("Accessory agent started. Requesting framework agent...");
        if let Some(event_tx) = self.event_tx.take() {
            if let Err(e) = self.framework.request_agent(event_tx).await {
                tracing::error!(error = %e, "Framework rejected the agent request");
            }
        }

        loop {
            tokio::select! {
                // Callbacks first, so a queued loss is seen before the next tap.
                biased;
                Some(event) = self.event_rx.recv() => self.handle_event(event).await,
                command = self.command_rx.recv() => match command {
                    Some(command) => {
                        if self.handle_command(command).await {
                            break;
                        }
                    }
                    None => {
                        tracing::info!("All agent handles dropped. Accessory agent shutting down.");
                        break;
                    }
                },
            }
        }

        self.teardown().await;
    }

    /// Handles an incoming command. Returns `true` if the agent should shut down.
    async fn handle_command(&mut self, command: AgentCommand) -> bool {
        match command {
            AgentCommand::SendWaterLock(reply) => self.begin_attempt(reply).await,
            AgentCommand::Inspect(reply) => {
                let _ = reply.send(AgentStatus {
                    available: self.available,
                    state: self.state.clone(),
                    in_flight: self.attempt.is_some(),
                });
            }
            AgentCommand::Shutdown => {
                tracing::info!("Received shutdown command. Exiting.");
                return true;
            }
        }
        false
    }

    async fn begin_attempt(&mut self, reply: Reply) {
        if !self.available {
            tracing::error!("Accessory agent is not available yet");
            let _ = reply.send(Err(LinkError::TransportUnavailable(
                "accessory agent is not available".to_string(),
            )));
            return;
        }

        self.waiters.push(reply);
        if self.attempt.is_some() {
            tracing::debug!("Delivery already in flight, joining it");
            return;
        }

        let input = match self.state {
            LinkState::Connected { .. } => LinkInput::SendRequested,
            LinkState::Idle => LinkInput::DiscoveryRequested,
            _ => {
                let state = self.state.name();
                tracing::warn!(state, "Agent is busy without an attempt in flight");
                self.reply(Err(LinkError::TransportUnavailable(format!(
                    "connection is {state}"
                ))));
                return;
            }
        };
        self.attempt = Some(DeliveryReport::new(Backend::Accessory));
        self.drive(input).await;
    }

    async fn handle_event(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::AgentAvailable => {
                tracing::info!("Accessory agent available");
                self.available = true;
            }
            AgentEvent::AgentError { code, message } => {
                tracing::error!(code, message = %message, "Accessory agent request failed");
                self.available = false;
            }
            AgentEvent::PeersFound { peers, result } => {
                tracing::info!(result = %result, peers = peers.len(), "Peer search finished");
                if self.state != LinkState::Discovering {
                    tracing::debug!(state = self.state.name(), "Ignoring peer search response");
                    return;
                }
                let input = if result.is_success() {
                    LinkInput::PeersFound(peers)
                } else if AgentEvent::is_empty_search(result) {
                    LinkInput::PeersFound(Vec::new())
                } else {
                    LinkInput::DiscoveryFailed(format!("peer search failed with result {}", result))
                };
                self.drive(input).await;
            }
            AgentEvent::ServiceConnectionResponse {
                peer,
                socket,
                result,
            } => {
                let expected = self.state.peer().map(|p| p.id == peer.id).unwrap_or(false)
                    && matches!(self.state, LinkState::Connecting { .. });
                if !expected {
                    tracing::warn!(peer = %peer, "Ignoring stale service connection response");
                    if let Some(socket) = socket.filter(|_| AgentEvent::is_connected(result)) {
                        self.framework.close(socket).await;
                    }
                    return;
                }
                let input = match socket {
                    Some(socket) if AgentEvent::is_connected(result) => {
                        tracing::info!(peer = %peer, %socket, "Service connection successful");
                        LinkInput::ConnectSucceeded(socket)
                    }
                    _ => {
                        tracing::error!(
                            peer = %peer,
                            result = %result,
                            "Service connection failed"
                        );
                        let code = if result.is_success() { -1 } else { result.0 };
                        LinkInput::ConnectFailed(code)
                    }
                };
                self.drive(input).await;
            }
            AgentEvent::ConnectionLost { socket, reason } => {
                if self.state.socket() != Some(socket) {
                    tracing::debug!(%socket, reason, "Loss reported for a socket no longer in use");
                    return;
                }
                tracing::error!(%socket, reason, "Service connection lost");
                self.drive(LinkInput::ConnectionLost(reason)).await;
            }
            AgentEvent::ChannelError {
                socket,
                channel_id,
                message,
                code,
            } => {
                tracing::error!(
                    %socket,
                    channel_id,
                    code,
                    message = %message,
                    "Socket channel error"
                );
            }
            AgentEvent::DataReceived {
                socket,
                channel_id,
                data,
            } => {
                tracing::debug!(
                    %socket,
                    channel_id,
                    bytes = data.len(),
                    "Data received, discarding"
                );
            }
        }
    }

    /// Applies `input` and every input produced by the resulting actions.
    async fn drive(&mut self, input: LinkInput) {
        let mut pending = VecDeque::from([input]);
        while let Some(input) = pending.pop_front() {
            let from = self.state.name();
            let actions = match self.state.step(input) {
                Ok(actions) => actions,
                Err(e) => {
                    tracing::warn!("Ignoring transition: {}", e);
                    continue;
                }
            };
            if from != self.state.name() {
                tracing::info!(from, to = self.state.name(), "Connection state changed");
            }
            for action in actions {
                if let Some(next) = self.perform(action).await {
                    pending.push_back(next);
                }
            }
        }
    }

    async fn perform(&mut self, action: Action) -> Option<LinkInput> {
        match action {
            Action::FindPeers => match self.framework.find_peer_agents().await {
                Ok(()) => None,
                Err(LinkError::TransportUnavailable(reason)) => {
                    Some(LinkInput::DiscoveryFailed(reason))
                }
                Err(e) => Some(LinkInput::DiscoveryFailed(e.to_string())),
            },
            Action::Connect(peer) => {
                tracing::info!(peer = %peer, "Requesting service connection");
                match self.framework.request_service_connection(&peer).await {
                    Ok(()) => None,
                    Err(e) => Some(LinkInput::ConnectFailed(e.result_code().unwrap_or(-1))),
                }
            }
            Action::Opened(_) => Some(LinkInput::SendRequested),
            Action::Send(socket) => {
                let code = self
                    .framework
                    .send(socket, self.config.accessory.channel_id, self.command.as_bytes())
                    .await;
                Some(LinkInput::SendCompleted(code))
            }
            Action::Close(socket) => {
                self.framework.close(socket).await;
                None
            }
            Action::Record(outcome) => {
                match &outcome.result {
                    Ok(()) => tracing::info!(peer = %outcome.peer, "Water Lock command sent"),
                    Err(e) => {
                        tracing::error!(peer = %outcome.peer, error = %e, "Water Lock command failed")
                    }
                }
                if let Some(report) = self.attempt.as_mut() {
                    report.push(outcome);
                }
                None
            }
            Action::Advance => Some(LinkInput::NextPeer),
            Action::Finished => {
                let report = self
                    .attempt
                    .take()
                    .unwrap_or_else(|| DeliveryReport::new(Backend::Accessory));
                self.reply(Ok(report));
                None
            }
            Action::Abort(e) => {
                tracing::warn!(error = %e, "Delivery aborted");
                self.attempt = None;
                self.reply(Err(e));
                None
            }
        }
    }

    fn reply(&mut self, result: Result<DeliveryReport, LinkError>) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(result.clone());
        }
    }

    async fn teardown(&mut self) {
        if let Some(socket) = self.state.socket() {
            tracing::info!(%socket, "Closing accessory socket");
            self.framework.close(socket).await;
        }
        self.state = LinkState::Idle;
        self.attempt = None;
        self.reply(Err(LinkError::AgentClosed));
    }
}
