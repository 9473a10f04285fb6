//! # Peer Connection State Machine
//!
//! A pure, synchronous model of one connection's life:
//!
//! ```text
//! Idle -> Discovering -> Connecting -> Connected <-> Sending
//!   ^          |             |            |
//!   +----------+-------------+------------+  (no peers / connect failed / lost)
//! ```
//!
//! [`LinkState::step`] consumes a [`LinkInput`] and returns the [`Action`]s its owner
//! has to carry out. The state machine performs no I/O; the
//! [`crate::agent::AccessoryAgent`] feeds it framework callbacks and executes the
//! actions against the vendor framework.

use crate::{
    error::LinkError,
    peer::{PeerNode, ResultCode, SocketId},
    report::PeerOutcome,
};
use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Idle,
    Discovering,
    Connecting {
        peer: PeerNode,
        remaining: VecDeque<PeerNode>,
    },
    Connected {
        peer: PeerNode,
        socket: SocketId,
        remaining: VecDeque<PeerNode>,
    },
    Sending {
        peer: PeerNode,
        socket: SocketId,
        remaining: VecDeque<PeerNode>,
    },
}

/// Inputs accepted by [`LinkState::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkInput {
    DiscoveryRequested,
    PeersFound(Vec<PeerNode>),
    DiscoveryFailed(String),
    ConnectSucceeded(SocketId),
    ConnectFailed(i32),
    SendRequested,
    SendCompleted(ResultCode),
    /// Move on to the next discovered peer after the current one has been served.
    NextPeer,
    ConnectionLost(i32),
}

/// Work the owner of the state machine must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    FindPeers,
    Connect(PeerNode),
    /// A socket was opened and is ready for the command.
    Opened(SocketId),
    Send(SocketId),
    Close(SocketId),
    Record(PeerOutcome),
    /// The current peer is done and more peers are waiting.
    Advance,
    /// Every discovered peer has been served.
    Finished,
    /// The attempt ended before any peer could be served.
    Abort(LinkError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    pub state: &'static str,
    pub input: LinkInput,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "input {:?} is not valid in state {}", self.input, self.state)
    }
}

impl std::error::Error for InvalidTransition {}

impl LinkState {
    pub fn name(&self) -> &'static str {
        match self {
            LinkState::Idle => "Idle",
            LinkState::Discovering => "Discovering",
            LinkState::Connecting { .. } => "Connecting",
            LinkState::Connected { .. } => "Connected",
            LinkState::Sending { .. } => "Sending",
        }
    }

    /// The open socket, if the state owns one.
    pub fn socket(&self) -> Option<SocketId> {
        match self {
            LinkState::Connected { socket, .. } | LinkState::Sending { socket, .. } => {
                Some(*socket)
            }
            _ => None,
        }
    }

    /// The peer currently being connected to or served.
    pub fn peer(&self) -> Option<&PeerNode> {
        match self {
            LinkState::Connecting { peer, .. }
            | LinkState::Connected { peer, .. }
            | LinkState::Sending { peer, .. } => Some(peer),
            _ => None,
        }
    }

    /// Applies `input`. On an invalid input the state is left unchanged.
    pub fn step(&mut self, input: LinkInput) -> Result<Vec<Action>, InvalidTransition> {
        let current = std::mem::take(self);
        match transition(current, input) {
            Ok((next, actions)) => {
                *self = next;
                Ok(actions)
            }
            Err((previous, err)) => {
                *self = previous;
                Err(err)
            }
        }
    }
}

type Transition = Result<(LinkState, Vec<Action>), (LinkState, InvalidTransition)>;

fn transition(state: LinkState, input: LinkInput) -> Transition {
    use LinkInput as In;
    use LinkState as S;

    match (state, input) {
        (S::Idle, In::DiscoveryRequested) => Ok((S::Discovering, vec![Action::FindPeers])),

        (S::Discovering, In::PeersFound(peers)) => {
            let mut remaining: VecDeque<PeerNode> = peers.into();
            match remaining.pop_front() {
                Some(peer) => Ok((
                    S::Connecting {
                        peer: peer.clone(),
                        remaining,
                    },
                    vec![Action::Connect(peer)],
                )),
                None => Ok((S::Idle, vec![Action::Abort(LinkError::NoPeerFound)])),
            }
        }
        (S::Discovering, In::DiscoveryFailed(reason)) => Ok((
            S::Idle,
            vec![Action::Abort(LinkError::TransportUnavailable(reason))],
        )),

        (S::Connecting { peer, remaining }, In::ConnectSucceeded(socket)) => Ok((
            S::Connected {
                peer,
                socket,
                remaining,
            },
            vec![Action::Opened(socket)],
        )),
        (S::Connecting { peer, mut remaining }, In::ConnectFailed(code)) => {
            let record = Action::Record(PeerOutcome::failed(peer, LinkError::ConnectFailed(code)));
            match remaining.pop_front() {
                Some(next) => Ok((
                    S::Connecting {
                        peer: next.clone(),
                        remaining,
                    },
                    vec![record, Action::Connect(next)],
                )),
                None => Ok((S::Idle, vec![record, Action::Finished])),
            }
        }

        (
            S::Connected {
                peer,
                socket,
                remaining,
            },
            In::SendRequested,
        ) => Ok((
            S::Sending {
                peer,
                socket,
                remaining,
            },
            vec![Action::Send(socket)],
        )),
        (
            S::Sending {
                peer,
                socket,
                remaining,
            },
            In::SendCompleted(code),
        ) => {
            let outcome = if code.is_success() {
                PeerOutcome::delivered(peer.clone())
            } else {
                PeerOutcome::failed(peer.clone(), LinkError::SendFailed(code.0))
            };
            let follow_up = if remaining.is_empty() {
                Action::Finished
            } else {
                Action::Advance
            };
            Ok((
                S::Connected {
                    peer,
                    socket,
                    remaining,
                },
                vec![Action::Record(outcome), follow_up],
            ))
        }
        (
            S::Connected {
                peer,
                socket,
                mut remaining,
            },
            In::NextPeer,
        ) => match remaining.pop_front() {
            Some(next) => Ok((
                S::Connecting {
                    peer: next.clone(),
                    remaining,
                },
                vec![Action::Close(socket), Action::Connect(next)],
            )),
            None => Err((
                S::Connected {
                    peer,
                    socket,
                    remaining,
                },
                InvalidTransition {
                    state: "Connected",
                    input: In::NextPeer,
                },
            )),
        },

        (S::Connected { .. }, In::ConnectionLost(_)) => Ok((S::Idle, vec![])),

        (state, input) => {
            let err = InvalidTransition {
                state: state.name(),
                input,
            };
            Err((state, err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: &str) -> PeerNode {
        PeerNode::new(id)
    }

    fn connected(id: &str, socket: u64) -> LinkState {
        LinkState::Connected {
            peer: peer(id),
            socket: SocketId(socket),
            remaining: VecDeque::new(),
        }
    }

    #[test]
    fn discovery_with_no_peers_returns_to_idle() {
        let mut state = LinkState::Idle;
        assert_eq!(
            state.step(LinkInput::DiscoveryRequested).unwrap(),
            vec![Action::FindPeers]
        );
        assert_eq!(state, LinkState::Discovering);

        let actions = state.step(LinkInput::PeersFound(vec![])).unwrap();
        assert_eq!(actions, vec![Action::Abort(LinkError::NoPeerFound)]);
        assert_eq!(state, LinkState::Idle);
    }

    #[test]
    fn discovery_failure_reports_transport_unavailable() {
        let mut state = LinkState::Discovering;
        let actions = state
            .step(LinkInput::DiscoveryFailed("service down".into()))
            .unwrap();
        assert_eq!(
            actions,
            vec![Action::Abort(LinkError::TransportUnavailable(
                "service down".into()
            ))]
        );
        assert_eq!(state, LinkState::Idle);
    }

    #[test]
    fn first_discovered_peer_is_connected_first() {
        let mut state = LinkState::Discovering;
        let actions = state
            .step(LinkInput::PeersFound(vec![peer("a"), peer("b")]))
            .unwrap();
        assert_eq!(actions, vec![Action::Connect(peer("a"))]);
        assert_eq!(state.peer(), Some(&peer("a")));
    }

    #[test]
    fn connect_failure_moves_on_to_the_next_peer() {
        let mut state = LinkState::Connecting {
            peer: peer("a"),
            remaining: VecDeque::from(vec![peer("b")]),
        };
        let actions = state.step(LinkInput::ConnectFailed(1030)).unwrap();
        assert_eq!(
            actions,
            vec![
                Action::Record(PeerOutcome::failed(peer("a"), LinkError::ConnectFailed(1030))),
                Action::Connect(peer("b")),
            ]
        );
        assert_eq!(state.name(), "Connecting");

        let actions = state.step(LinkInput::ConnectFailed(1030)).unwrap();
        assert_eq!(actions.last(), Some(&Action::Finished));
        assert_eq!(state, LinkState::Idle);
    }

    #[test]
    fn send_result_is_recorded_and_connection_is_kept() {
        let mut state = connected("a", 7);
        assert_eq!(
            state.step(LinkInput::SendRequested).unwrap(),
            vec![Action::Send(SocketId(7))]
        );
        assert_eq!(state.name(), "Sending");

        let actions = state.step(LinkInput::SendCompleted(ResultCode(4))).unwrap();
        assert_eq!(
            actions,
            vec![
                Action::Record(PeerOutcome::failed(peer("a"), LinkError::SendFailed(4))),
                Action::Finished,
            ]
        );
        assert_eq!(state, connected("a", 7));

        state.step(LinkInput::SendRequested).unwrap();
        let actions = state.step(LinkInput::SendCompleted(ResultCode::SUCCESS)).unwrap();
        assert_eq!(actions[0], Action::Record(PeerOutcome::delivered(peer("a"))));
    }

    #[test]
    fn served_peer_is_closed_before_the_next_connects() {
        let mut state = LinkState::Sending {
            peer: peer("a"),
            socket: SocketId(1),
            remaining: VecDeque::from(vec![peer("b")]),
        };
        let actions = state.step(LinkInput::SendCompleted(ResultCode::SUCCESS)).unwrap();
        assert_eq!(actions[1], Action::Advance);

        let actions = state.step(LinkInput::NextPeer).unwrap();
        assert_eq!(
            actions,
            vec![Action::Close(SocketId(1)), Action::Connect(peer("b"))]
        );
    }

    #[test]
    fn connection_loss_returns_to_idle() {
        let mut state = connected("a", 3);
        assert!(state.step(LinkInput::ConnectionLost(521)).unwrap().is_empty());
        assert_eq!(state, LinkState::Idle);
        assert_eq!(state.socket(), None);
    }

    #[test]
    fn invalid_input_leaves_state_untouched() {
        let mut state = connected("a", 3);
        let err = state.step(LinkInput::DiscoveryRequested).unwrap_err();
        assert_eq!(err.state, "Connected");
        assert_eq!(state, connected("a", 3));

        let mut idle = LinkState::Idle;
        assert!(idle.step(LinkInput::SendRequested).is_err());
        assert!(idle.step(LinkInput::ConnectionLost(513)).is_err());
        assert_eq!(idle, LinkState::Idle);
    }
}
