use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use waterlock_connector::{
    config::ConnectorConfig, events::CONNECTION_SUCCESS, peer::PeerNode, sim::SimulatedCompanion,
};
use waterlock_logger::LogConfig;

/// The top-level configuration for the Water Lock application.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct AppConfig {
    #[serde(default)]
    pub connector: ConnectorConfig,
    #[serde(default)]
    pub app: AppSpecificConfig,
}

impl AppConfig {
    /// Rejects settings the connector cannot start with.
    pub fn validate(&self) -> Result<()> {
        let channels = &self.connector.channels;
        for (key, capacity) in [
            ("agent-command-buffer", channels.agent_command_buffer),
            ("agent-event-buffer", channels.agent_event_buffer),
            ("status-buffer", channels.status_buffer),
        ] {
            ensure!(capacity > 0, "connector.channels.{} must be greater than zero", key);
        }
        Ok(())
    }
}

/// Contains settings that are unique to the application binary.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct AppSpecificConfig {
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub companion: CompanionConfig,
}

/// Behavior of the simulated companion the shell talks to.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CompanionConfig {
    /// Identifiers of the discoverable companion devices.
    pub peers: Vec<String>,
    pub connect_result_code: i32,
    pub send_result_code: i32,
    pub accessory_installed: bool,
    pub discovery_available: bool,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            peers: vec!["companion-phone".to_string()],
            connect_result_code: CONNECTION_SUCCESS,
            send_result_code: 0,
            accessory_installed: true,
            discovery_available: true,
        }
    }
}

impl CompanionConfig {
    pub fn build(&self) -> SimulatedCompanion {
        let peers = self.peers.iter().map(|id| PeerNode::new(id.as_str()));
        let mut companion = SimulatedCompanion::new(peers)
            .with_default_connect_code(self.connect_result_code)
            .with_default_send_code(self.send_result_code);
        if !self.accessory_installed {
            companion = companion.without_accessory_service();
        }
        if !self.discovery_available {
            companion = companion.with_discovery_unavailable();
        }
        companion
    }
}

/// Loads the application configuration from a specified TOML file.
///
/// Values from the file can be overridden with `WATERLOCK__<SECTION>__<KEY>`
/// environment variables; `_` in a key name stands for `-`, e.g.
/// `WATERLOCK__CONNECTOR__MESSAGING__FAN_OUT=parallel`.
pub fn load_config(path: &str) -> Result<AppConfig> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(
            config::Environment::with_prefix("WATERLOCK")
                .separator("__")
                .convert_case(config::Case::Kebab),
        );

    let settings: AppConfig = builder
        .build()
        .context(format!("Failed to build configuration from '{}'", path))?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    settings
        .validate()
        .context(format!("Invalid configuration in '{}'", path))?;
    Ok(settings)
}
