use super::handler::ConnectionHandler;
use crate::config::ServerConfig;
use crate::shutdown::ShutdownCoordinator;
use crate::{AckError, Result};
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpSocket, TcpStream, lookup_host};
use tracing::{Instrument, error, info};

/// Source of inbound connections for the accept loop
#[async_trait]
pub trait Acceptor: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    async fn accept(&self) -> io::Result<(Self::Stream, SocketAddr)>;
}

#[async_trait]
impl Acceptor for TcpListener {
    type Stream = TcpStream;

    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }
}

/// Accept loop of the acknowledgment server
///
/// Every accepted connection gets its own [`ConnectionHandler`] task. Tasks
/// are fire-and-forget: the listener neither tracks nor waits for them, and
/// `max_connections` only sizes the kernel's pending-accept backlog.
///
/// # Examples
///
/// ```no_run
/// use acksrv::config::ServerConfig;
/// use acksrv::{ConnectionListener, ShutdownCoordinator};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let shutdown = ShutdownCoordinator::new();
///     shutdown.install_signal_handlers();
///
///     let listener = ConnectionListener::bind(ServerConfig::default(), shutdown).await?;
///     listener.run().await?;
///     Ok(())
/// }
/// ```
pub struct ConnectionListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: ServerConfig,
    shutdown: ShutdownCoordinator,
}

impl ConnectionListener {
    /// Binds the listening socket with `SO_REUSEADDR` and a backlog of `max_connections`
    pub async fn bind(config: ServerConfig, shutdown: ShutdownCoordinator) -> Result<Self> {
        config.validate()?;

        let endpoint = config.endpoint();
        let addr = lookup_host(endpoint.as_str())
            .await?
            .next()
            .ok_or_else(|| AckError::Config(format!("No address found for {endpoint}")))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(config.max_connections)?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
            config,
            shutdown,
        })
    }

    /// Address actually bound, useful when the configured port is 0
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections until shutdown or an unexpected accept failure.
    ///
    /// An accept error ends the loop; it is only logged when the server was
    /// still meant to be running. The listening socket is closed on return.
    pub async fn run(self) -> Result<()> {
        let Self {
            listener,
            local_addr,
            config,
            shutdown,
        } = self;

        info!(address = %local_addr, "Server started successfully");
        info!(max_connections = config.max_connections, "Maximum connections: {}", config.max_connections);
        info!(buffer_size = config.buffer_size, "Buffer size: {} bytes", config.buffer_size);
        info!("Waiting for client connections...");

        accept_loop(&listener, &config, &shutdown).await;

        drop(listener);
        info!(address = %local_addr, "Server socket closed");
        Ok(())
    }
}

/// Spawns a handler per accepted connection until shutdown or an accept failure
pub async fn accept_loop<A: Acceptor>(acceptor: &A, config: &ServerConfig, shutdown: &ShutdownCoordinator) {
    while shutdown.is_running() {
        tokio::select! {
            biased;
            _ = shutdown.stopped() => break,
            accepted = acceptor.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let handler = ConnectionHandler::new(stream, peer, config, shutdown.clone());
                        let span = tracing::info_span!("connection", %peer);
                        tokio::spawn(handler.run().instrument(span));
                    }
                    Err(e) => {
                        // Accept errors during shutdown are expected and stay quiet
                        if shutdown.is_running() {
                            error!(error = %e, "Error accepting connection");
                        }
                        break;
                    }
                }
            }
        }
    }
}
