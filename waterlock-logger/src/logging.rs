//! Tracing setup shared by the Water Lock binaries.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs::File, str::FromStr};
use tracing::Level;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self, writer::MakeWriterExt},
    prelude::*,
    Registry,
};

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Plain,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    File,
}

/// Logging configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "kebab-case", default)]
pub struct LogConfig {
    /// Log level, e.g., "info", "debug", "trace".
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Path to the log file, required if output is "file".
    pub file_path: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Plain,
            output: LogOutput::Stdout,
            file_path: None,
        }
    }
}

impl LogConfig {
    /// The configured level, falling back to `INFO` for unknown names.
    pub fn level(&self) -> Level {
        Level::from_str(&self.level).unwrap_or(Level::INFO)
    }
}

/// Installs the global subscriber. Must be called at most once per process.
pub fn init(config: &LogConfig) -> Result<()> {
    let log_level = config.level();
    let level_filter = LevelFilter::from_level(log_level);
    let subscriber = Registry::default().with(level_filter);

    match config.output {
        LogOutput::File => {
            let file_path = config
                .file_path
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Log output is 'file' but 'file_path' is not specified"))?;
            let log_file = File::create(file_path)
                .with_context(|| format!("Failed to create log file '{}'", file_path))?;
            let file_writer = log_file.with_max_level(log_level);

            match config.format {
                LogFormat::Json => subscriber
                    .with(fmt::layer().with_writer(file_writer).json())
                    .try_init()?,
                LogFormat::Plain => subscriber
                    .with(fmt::layer().with_writer(file_writer).with_ansi(false))
                    .try_init()?,
            }
        }
        LogOutput::Stdout => {
            let stdout_writer = std::io::stdout.with_max_level(log_level);
            match config.format {
                LogFormat::Json => subscriber
                    .with(fmt::layer().with_writer(stdout_writer).json())
                    .try_init()?,
                LogFormat::Plain => subscriber
                    .with(fmt::layer().with_writer(stdout_writer).pretty())
                    .try_init()?,
            }
        }
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_level_falls_back_to_info() {
        let config = LogConfig {
            level: "chatty".to_string(),
            ..LogConfig::default()
        };
        assert_eq!(config.level(), Level::INFO);
        assert_eq!(LogConfig::default().level(), Level::INFO);

        let debug = LogConfig {
            level: "debug".to_string(),
            ..LogConfig::default()
        };
        assert_eq!(debug.level(), Level::DEBUG);
    }

    #[test]
    fn file_output_requires_a_path() {
        let config = LogConfig {
            output: LogOutput::File,
            file_path: None,
            ..LogConfig::default()
        };
        let err = init(&config).unwrap_err();
        assert!(err.to_string().contains("file_path"));
    }

    #[test]
    fn file_output_writes_to_the_given_path() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("waterlock.log");
        let config = LogConfig {
            level: "debug".to_string(),
            format: LogFormat::Json,
            output: LogOutput::File,
            file_path: Some(path.to_string_lossy().into_owned()),
        };

        init(&config)?;
        tracing::info!(peer = "gear", "log file test");

        let written = std::fs::read_to_string(&path)?;
        let line = written
            .lines()
            .find(|line| line.contains("log file test"))
            .expect("event written to the log file");
        assert!(line.contains("\"level\":\"INFO\""));
        assert!(line.contains("\"peer\":\"gear\""));
        Ok(())
    }
}
