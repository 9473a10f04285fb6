#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// The top-level configuration for the `waterlock-connector` library.
///
/// This struct aggregates the backend choice, the command payload and the settings of
/// each backend. It is typically deserialized from a configuration file and passed to
/// [`crate::link::start`] upon initialization.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub struct ConnectorConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    pub backend: Backend,
    #[cfg_attr(feature = "serde", serde(default))]
    pub command: CommandConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub messaging: MessagingConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub accessory: AccessoryConfig,
    #[cfg_attr(feature = "serde", serde(default))]
    pub channels: ChannelConfig,
}

/// Selects which transport delivers the Water Lock command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Backend {
    /// Node discovery plus the platform short-message transport.
    #[default]
    Messaging,
    /// The vendor accessory agent and its socket.
    Accessory,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Messaging => f.write_str("messaging"),
            Backend::Accessory => f.write_str("accessory"),
        }
    }
}

/// The bytes written to the companion. Empty by default.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct CommandConfig {
    pub payload: Vec<u8>,
}

/// Settings for the generic messaging path.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct MessagingConfig {
    /// The logical path the message is sent on.
    pub path: String,
    /// Whether nodes are messaged one after another or all at once.
    pub fan_out: FanOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum FanOut {
    #[default]
    Sequential,
    Parallel,
}

/// Settings for the vendor accessory path.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct AccessoryConfig {
    /// The socket channel the command is written to.
    pub channel_id: u16,
    /// Package name of the vendor accessory service that must be installed.
    pub service_package: String,
    /// Store deep link opened when the accessory service is missing.
    pub store_uri: String,
}

/// Defines capacities for the MPSC channels within the connector.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct ChannelConfig {
    /// The buffer capacity for the command channel to the accessory agent.
    pub agent_command_buffer: usize,
    /// The buffer capacity for framework callbacks delivered to the agent.
    pub agent_event_buffer: usize,
    /// The buffer capacity for status messages sent back to the UI.
    pub status_buffer: usize,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            path: "/water_lock_mode".to_string(),
            fan_out: FanOut::Sequential,
        }
    }
}

impl Default for AccessoryConfig {
    fn default() -> Self {
        Self {
            channel_id: 0,
            service_package: "com.samsung.accessory".to_string(),
            store_uri: "samsungapps://ProductDetail/com.samsung.accessory".to_string(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            agent_command_buffer: 16,
            agent_event_buffer: 64,
            status_buffer: 32,
        }
    }
}
