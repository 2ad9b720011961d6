use crate::{AckError, Result};
use serde::Deserialize;
use std::time::Duration;

/// Configuration for the sending client
///
/// # Examples
///
/// ```
/// use acksrv::config::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default();
/// assert_eq!(config.server_host, "127.0.0.1");
/// assert_eq!(config.connection_timeout, Duration::from_secs(10));
/// assert_eq!(config.retry_attempts, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Server host name or IP address
    pub server_host: String,
    /// Server port
    pub server_port: u16,
    /// Bound on connecting, writing and awaiting the acknowledgment
    #[serde(rename = "connection_timeout_secs", deserialize_with = "super::secs::deserialize")]
    pub connection_timeout: Duration,
    /// Total number of send cycles tried by `send_data`
    pub retry_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 12345,
            connection_timeout: Duration::from_secs(10),
            retry_attempts: 3,
        }
    }
}

impl ClientConfig {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry_attempts == 0 {
            return Err(AckError::Config("client.retry_attempts must be at least 1".into()));
        }
        if self.connection_timeout.is_zero() {
            return Err(AckError::Config(
                "client.connection_timeout_secs must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
