use crate::config::ClientConfig;
use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Opens fresh connections to one fixed remote endpoint
///
/// The sender calls this once per send cycle and applies its own timeout
/// around it.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connected byte stream
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    async fn connect(&self) -> io::Result<Self::Stream>;

    /// Human-readable remote endpoint, used in logs
    fn endpoint(&self) -> String;
}

/// TCP connector for a host name or IP address and port
#[derive(Debug, Clone)]
pub struct TcpConnector {
    host: String,
    port: u16,
}

impl TcpConnector {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.server_host.clone(), config.server_port)
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self) -> io::Result<TcpStream> {
        TcpStream::connect((self.host.as_str(), self.port)).await
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
