//! Server side: the accept loop and the per-connection handler

pub mod handler;
pub mod listener;

pub use handler::ConnectionHandler;
pub use listener::{Acceptor, ConnectionListener, accept_loop};

use crate::Result;
use crate::config::ServerConfig;
use crate::shutdown::ShutdownCoordinator;

/// Binds and serves until `shutdown` is triggered
pub async fn serve(config: ServerConfig, shutdown: ShutdownCoordinator) -> Result<()> {
    ConnectionListener::bind(config, shutdown).await?.run().await
}
