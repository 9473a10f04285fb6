use crate::{config::Backend, error::LinkError, peer::PeerNode};

/// The result of delivering the command to one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerOutcome {
    pub peer: PeerNode,
    pub result: Result<(), LinkError>,
}

impl PeerOutcome {
    pub fn delivered(peer: PeerNode) -> Self {
        Self {
            peer,
            result: Ok(()),
        }
    }

    pub fn failed(peer: PeerNode, error: LinkError) -> Self {
        Self {
            peer,
            result: Err(error),
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.result.is_ok()
    }
}

/// Every per-peer outcome of a single tap, in the order the peers were served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub backend: Backend,
    pub outcomes: Vec<PeerOutcome>,
}

impl DeliveryReport {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: PeerOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_delivered()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.delivered()
    }

    /// `true` when at least one peer was served and none failed.
    pub fn all_delivered(&self) -> bool {
        !self.outcomes.is_empty() && self.failed() == 0
    }

    pub fn outcome_for(&self, peer_id: &str) -> Option<&PeerOutcome> {
        self.outcomes.iter().find(|o| o.peer.id == peer_id)
    }
}
