//! Configuration for the server, the client and logging
//!
//! Everything can be read from a single TOML file:
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 12345
//! max_connections = 5
//! buffer_size = 1024
//!
//! [client]
//! server_host = "127.0.0.1"
//! server_port = 12345
//! connection_timeout_secs = 10
//! retry_attempts = 3
//!
//! [logging]
//! level = "info"
//! file = "server.log"
//! console = true
//! ```
//!
//! Every table and key is optional. A missing file falls back to defaults.

pub mod client;
pub mod server;

pub use client::ClientConfig;
pub use server::ServerConfig;

use crate::{AckError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Logging sink configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Log file. When unset the binary picks one per role.
    pub file: Option<PathBuf>,
    /// Also log to the console
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            console: true,
        }
    }
}

/// Full configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub logging: LoggingConfig,
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// The file did not exist, defaults are in effect
    Defaults(PathBuf),
}

impl Config {
    /// Loads and validates the file at `path`, or the defaults if it does not exist
    pub fn load(path: &Path) -> Result<(Self, ConfigSource)> {
        if !path.exists() {
            return Ok((Self::default(), ConfigSource::Defaults(path.to_path_buf())));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| AckError::ConfigRead(path.to_path_buf(), e))?;
        let config = Self::from_toml(&contents)
            .map_err(|e| match e {
                AckError::ConfigParse(_, inner) => AckError::ConfigParse(path.to_path_buf(), inner),
                other => other,
            })?;

        Ok((config, ConfigSource::File(path.to_path_buf())))
    }

    /// Parses and validates configuration text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| AckError::ConfigParse(PathBuf::new(), e))?;
        config.server.validate()?;
        config.client.validate()?;
        Ok(config)
    }
}

/// Whole-second durations in the file
mod secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }

    pub fn deserialize_opt<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|secs| secs.map(Duration::from_secs))
    }
}
