use thiserror::Error;

/// Defines the failures a Water Lock delivery can end with.
///
/// None of these is fatal: the caller logs them and shows a transient message.
/// The enum is `Clone` so that several taps joined to one attempt can share a result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("No connected companion device found")]
    NoPeerFound,

    #[error("Connection failed with result code {0}")]
    ConnectFailed(i32),

    #[error("Command delivery failed with result code {0}")]
    SendFailed(i32),

    #[error("Accessory service '{package}' is not installed")]
    DependencyMissing { package: String },

    #[error("Accessory agent is not running")]
    AgentClosed,
}

impl LinkError {
    /// The vendor or platform result code carried by the error, if any.
    pub fn result_code(&self) -> Option<i32> {
        match self {
            LinkError::ConnectFailed(code) | LinkError::SendFailed(code) => Some(*code),
            _ => None,
        }
    }
}
