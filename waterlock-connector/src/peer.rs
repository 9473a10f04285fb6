//! Identifiers handed out by the platform and vendor transports.

use std::fmt;

/// A companion device reachable over the short-range transport.
///
/// Peers are ephemeral: a fresh list is produced by every discovery call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerNode {
    pub id: String,
    pub display_name: Option<String>,
}

impl PeerNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

impl fmt::Display for PeerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{} ({})", self.id, name),
            None => f.write_str(&self.id),
        }
    }
}

/// An integer result reported by the platform or the vendor framework. Zero is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode(pub i32);

impl ResultCode {
    pub const SUCCESS: ResultCode = ResultCode(0);

    pub fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl From<i32> for ResultCode {
    fn from(code: i32) -> Self {
        ResultCode(code)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle of an accessory socket opened by the vendor framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId(pub u64);

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "socket#{}", self.0)
    }
}
