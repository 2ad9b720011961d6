use crate::config::ServerConfig;
use crate::protocol::acknowledgment;
use crate::shutdown::ShutdownCoordinator;
use crate::{AckError, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Serves one accepted connection: read, log, acknowledge, repeat
///
/// The handler owns its stream and closes it exactly once when [`run`](Self::run)
/// returns, whatever ended the loop. Nothing but the shutdown flag is shared
/// with other handlers.
pub struct ConnectionHandler<S> {
    stream: S,
    peer: SocketAddr,
    buffer_size: usize,
    read_timeout: Option<Duration>,
    shutdown: ShutdownCoordinator,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(
        stream: S,
        peer: SocketAddr,
        config: &ServerConfig,
        shutdown: ShutdownCoordinator,
    ) -> Self {
        Self {
            stream,
            peer,
            buffer_size: config.buffer_size,
            read_timeout: config.read_timeout,
            shutdown,
        }
    }

    /// Runs the read loop to completion, then closes the connection.
    ///
    /// Errors never escape: they end this connection only and are logged.
    pub async fn run(mut self) {
        let peer = self.peer;
        info!(%peer, "New client connected");

        match self.serve().await {
            Ok(()) => {}
            Err(AckError::Io(e)) => error!(%peer, error = %e, "Socket error with client"),
            Err(e) => error!(%peer, error = %e, "Unexpected error with client"),
        }

        match self.stream.shutdown().await {
            Ok(()) => info!(%peer, "Closed connection"),
            Err(e) => error!(%peer, error = %e, "Error closing connection"),
        }
    }

    async fn serve(&mut self) -> Result<()> {
        let peer = self.peer;
        let mut buffer = vec![0u8; self.buffer_size];

        // The flag is only checked between reads; a pending read is never interrupted.
        while self.shutdown.is_running() {
            let Some(n) = self.read(&mut buffer).await? else {
                break;
            };

            if n == 0 {
                info!(%peer, "Client disconnected");
                break;
            }

            let message = std::str::from_utf8(&buffer[..n])?;
            info!(%peer, size = n, "Received from {peer}: {message}");

            let ack = acknowledgment(message);
            match self.write(ack.as_bytes()).await {
                Ok(()) => debug!(%peer, "Sent acknowledgment"),
                Err(e) => error!(%peer, error = %e, "Failed to send acknowledgment"),
            }
        }

        Ok(())
    }

    /// `None` means the optional read deadline expired
    async fn read(&mut self, buffer: &mut [u8]) -> Result<Option<usize>> {
        let Some(limit) = self.read_timeout else {
            return Ok(Some(self.stream.read(buffer).await?));
        };

        match timeout(limit, self.stream.read(buffer)).await {
            Ok(read) => Ok(Some(read?)),
            Err(_) => {
                warn!(peer = %self.peer, timeout_secs = limit.as_secs(), "Read timeout");
                Ok(None)
            }
        }
    }

    async fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.stream.write_all(data).await?;
        self.stream.flush().await
    }
}
