//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::defaults::{default_max_line_len, default_port, default_realname, default_user};
use super::validation::{self, ValidationError};
use crate::dispatch::DispatchOrder;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server to connect to.
    pub server: ServerConfig,
    /// Who we are on the network.
    pub identity: IdentityConfig,
    /// Per-session behavior.
    #[serde(default)]
    pub session: SessionConfig,
    /// Runtime configuration.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Demo bot behavior.
    #[serde(default)]
    pub bot: BotConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Check the configuration, collecting every problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate(self).map_err(ConfigError::Invalid)
    }
}

/// Remote server address.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Hostname or IP literal.
    pub host: String,
    /// TCP port (default: 6667).
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Registration identity.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Nickname.
    pub nick: String,
    /// Username sent with USER (default: "slirc").
    #[serde(default = "default_user")]
    pub user: String,
    /// Real name sent with USER.
    #[serde(default = "default_realname")]
    pub realname: String,
}

/// Session defaults applied to every session the service opens.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Whether lines of one session are dispatched in arrival order.
    #[serde(default)]
    pub dispatch_order: DispatchOrder,
    /// Longest accepted line in bytes, CR LF included (default: 512).
    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dispatch_order: DispatchOrder::default(),
            max_line_len: default_max_line_len(),
        }
    }
}

/// Runtime configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceConfig {
    /// Worker threads for the runtime; 0 runs everything on the calling
    /// thread (current-thread runtime).
    #[serde(default)]
    pub worker_threads: usize,
}

/// Demo bot configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BotConfig {
    /// Channels to join after registration.
    #[serde(default)]
    pub channels: Vec<String>,
}
