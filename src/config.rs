//! Configuration for the snapshot publisher
//!
//! Loaded from TOML with defaults matching the public test broker setup, so
//! an empty `[mqtt]` table is a working configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Top-level publisher configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublisherConfig {
    #[serde(default)]
    pub mqtt: MqttSection,
}

/// MQTT section: broker endpoint, topic namespace, and session policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MqttSection {
    /// Broker URL with protocol and port
    #[serde(default = "default_broker_url")]
    pub broker_url: String,
    /// Namespace prepended to every caller topic on the wire
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
    /// Ask the broker to retain the last snapshot per topic
    #[serde(default = "default_retain")]
    pub retain: bool,
    /// Connection establishment timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Keep-alive interval in seconds
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

fn default_broker_url() -> String {
    "tcp://broker.hivemq.com:1883".to_string()
}

fn default_topic_prefix() -> String {
    "animal/photos".to_string()
}

fn default_retain() -> bool {
    true
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_keep_alive_secs() -> u64 {
    20
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            broker_url: default_broker_url(),
            topic_prefix: default_topic_prefix(),
            retain: default_retain(),
            connect_timeout_secs: default_connect_timeout_secs(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            mqtt: MqttSection::default(),
        }
    }
}

/// Connection parameters handed to the broker link when a session opens.
///
/// Constant configuration, no behavior. No broker-side state is kept between
/// calls, so the session is always clean.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionPolicy {
    pub clean_session: bool,
    pub connect_timeout: Duration,
    pub keep_alive: Duration,
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        Self {
            clean_session: true,
            connect_timeout: Duration::from_secs(default_connect_timeout_secs()),
            keep_alive: Duration::from_secs(default_keep_alive_secs()),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PublisherConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: PublisherConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field values beyond what serde enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt.topic_prefix.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "mqtt.topic_prefix cannot be empty".to_string(),
            ));
        }
        if self.mqtt.broker_url.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "mqtt.broker_url cannot be empty".to_string(),
            ));
        }
        if self.mqtt.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "mqtt.connect_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl MqttSection {
    /// Build the connection policy for one publish session.
    pub fn policy(&self) -> ConnectionPolicy {
        ConnectionPolicy {
            clean_session: true,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            keep_alive: Duration::from_secs(self.keep_alive_secs),
        }
    }
}
