use crate::{AckError, Result};
use serde::Deserialize;
use std::time::Duration;

/// Configuration for the acknowledgment server
///
/// # Examples
///
/// ```
/// use acksrv::config::ServerConfig;
///
/// let config = ServerConfig {
///     host: "127.0.0.1".to_string(),
///     port: 0,
///     ..Default::default()
/// };
/// assert_eq!(config.buffer_size, 1024);
/// assert!(config.read_timeout.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Host or IP address to bind to
    pub host: String,
    /// Port to bind to (0 picks an ephemeral port)
    pub port: u16,
    /// Listen backlog. Does not cap concurrently served connections.
    pub max_connections: u32,
    /// Maximum number of bytes taken by a single read
    pub buffer_size: usize,
    /// Optional per-read deadline for connection handlers.
    ///
    /// Unset by default, in which case reads block until the peer sends,
    /// closes or errors.
    #[serde(rename = "read_timeout_secs", deserialize_with = "super::secs::deserialize_opt")]
    pub read_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 12345,
            max_connections: 5,
            buffer_size: 1024,
            read_timeout: None,
        }
    }
}

impl ServerConfig {
    /// `host:port` as used for binding and logging
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(AckError::Config("server.max_connections must be at least 1".into()));
        }
        if self.buffer_size == 0 {
            return Err(AckError::Config("server.buffer_size must be at least 1".into()));
        }
        if self.read_timeout == Some(Duration::ZERO) {
            return Err(AckError::Config("server.read_timeout_secs must be non-zero".into()));
        }
        Ok(())
    }
}
