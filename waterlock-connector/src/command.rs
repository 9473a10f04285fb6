//! The Water Lock command payload.

use crate::config::CommandConfig;

/// The fixed byte sequence meaning "enter water-lock mode".
///
/// It carries no parameters; the companion only needs to observe its arrival.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    payload: Vec<u8>,
}

impl Command {
    /// The default command: a zero-length payload.
    pub fn water_lock() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CommandConfig) -> Self {
        Self {
            payload: config.payload.clone(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }
}
