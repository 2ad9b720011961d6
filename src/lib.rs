use std::path::PathBuf;
use thiserror::Error;

/// Error types for the acksrv library
#[derive(Error, Debug)]
pub enum AckError {
    /// Socket-level errors (bind, accept, connect, read, write, close)
    #[error("Socket error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Received bytes that are not valid UTF-8
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Payload rejected before any connection attempt
    #[error("Empty payload, nothing to send")]
    EmptyPayload,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("Failed to read config file {0}: {1}")]
    ConfigRead(PathBuf, std::io::Error),

    /// Configuration file is not valid TOML for this schema
    #[error("Failed to parse config file {0}: {1}")]
    ConfigParse(PathBuf, toml::de::Error),
}

/// Result type for the acksrv library
pub type Result<T> = std::result::Result<T, AckError>;

pub mod client;
pub mod common;
pub mod config;
pub mod logging;
pub mod protocol;
pub mod server;
pub mod shutdown;

// Re-export main types for convenience
pub use client::{ClientApp, Connector, RetryAttempt, RetryPolicy, Sender, SystemInfo, TcpConnector};
pub use config::{ClientConfig, Config, LoggingConfig, ServerConfig};
pub use server::{ConnectionHandler, ConnectionListener};
pub use shutdown::ShutdownCoordinator;
