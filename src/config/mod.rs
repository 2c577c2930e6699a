//! # Configuration Management Module
//!
//! Configuration is a TOML file with one section per concern:
//!
//! - [`SensorConfig`] - serial device settings
//! - [`FramingConfig`] - ingest buffer and TinyFrame parameters
//! - [`PublishConfig`] - where decoded events go
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fallwatch::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Serial Port: {}", config.sensor.port);
//!     println!("Scan every {} ms", config.framing.scan_interval_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [sensor]
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//!
//! [framing]
//! buffer_capacity = 256
//! scan_interval_ms = 5000
//! sof_marker = 0x01
//! fall_frame_type = 0x0E02
//! header_len = 8
//! carry_partial_frame = false
//!
//! [publish]
//! sink = "log"            # "log", "stdout" or "file"
//! topic = "ld6002/fall_status"
//! # file = "fall_status.log"
//!
//! [logging]
//! level = "info"
//! # file = "fallwatch.log"
//! ```
//!
//! Every section may be omitted; missing values fall back to the defaults
//! above. The CLI `--port` flag overrides `sensor.port`.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;

use crate::ld6002::{layout, Framing};
use crate::publish::DEFAULT_TOPIC;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("framing.header_len must be {expected}, got {found}")]
    HeaderLen { expected: usize, found: usize },

    #[error("framing.buffer_capacity must be at least {min} bytes, got {found}")]
    BufferTooSmall { min: usize, found: usize },

    #[error("framing.scan_interval_ms must be greater than zero")]
    ZeroInterval,

    #[error("sensor.baud_rate must be greater than zero")]
    ZeroBaud,

    #[error("publish.topic must not be empty")]
    EmptyTopic,

    #[error("publish.sink = \"file\" requires publish.file")]
    MissingSinkFile,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub framing: FramingConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub port: String,
    pub baud_rate: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingConfig {
    /// Ingest buffer size in bytes. A full buffer forces a scan cycle.
    pub buffer_capacity: usize,
    /// Maximum time between scan cycles (ms).
    pub scan_interval_ms: u64,
    pub sof_marker: u8,
    pub fall_frame_type: u16,
    /// Fixed by the protocol; present so a mismatching file is rejected
    /// instead of silently misparsed.
    pub header_len: usize,
    /// Move an incomplete trailing frame to the front of the buffer at the
    /// end of a cycle instead of dropping it with the rest of the buffer.
    pub carry_partial_frame: bool,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 256,
            scan_interval_ms: 5000,
            sof_marker: layout::DEFAULT_SOF,
            fall_frame_type: layout::FALL_STATUS_TYPE,
            header_len: layout::HEADER_LEN,
            carry_partial_frame: false,
        }
    }
}

impl FramingConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn framing(&self) -> Framing {
        Framing {
            sof: self.sof_marker,
            fall_frame_type: self.fall_frame_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Log,
    Stdout,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default)]
    pub sink: SinkKind,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::Log,
            topic: default_topic(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parsed `level`; unknown values fall back to info.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config = Self::from_toml(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.framing;
        if f.header_len != layout::HEADER_LEN {
            return Err(ConfigError::HeaderLen {
                expected: layout::HEADER_LEN,
                found: f.header_len,
            });
        }
        let min = layout::frame_len(0);
        if f.buffer_capacity < min {
            return Err(ConfigError::BufferTooSmall {
                min,
                found: f.buffer_capacity,
            });
        }
        if f.scan_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.sensor.baud_rate == 0 {
            return Err(ConfigError::ZeroBaud);
        }
        if self.publish.topic.trim().is_empty() {
            return Err(ConfigError::EmptyTopic);
        }
        if self.publish.sink == SinkKind::File && self.publish.file.is_none() {
            return Err(ConfigError::MissingSinkFile);
        }
        Ok(())
    }
}
