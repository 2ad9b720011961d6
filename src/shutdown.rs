use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Process-wide running flag shared by the accept loop and every handler
///
/// The coordinator is the only writer: it flips from running to stopped
/// once, on the first interrupt/terminate signal or [`trigger`](Self::trigger)
/// call. Clones observe the same flag.
///
/// Handlers only consult the flag at the top of their read loop. A handler
/// parked in a read does not notice shutdown until that read returns, and
/// with no read timeout configured that may be never. The process exits once
/// the accept loop returns, taking such handlers down with the runtime.
#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the server should keep accepting and serving
    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Marks the server as stopped. Calling it again has no effect.
    pub fn trigger(&self) {
        if self.is_running() {
            info!("Shutdown signal received. Stopping server...");
        }
        self.token.cancel();
    }

    /// Completes once the flag has been cleared
    pub async fn stopped(&self) {
        self.token.cancelled().await
    }

    /// Spawns a task that triggers shutdown on SIGINT or SIGTERM
    pub fn install_signal_handlers(&self) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            coordinator.trigger();
        });
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            error!(error = %e, "Failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for interrupt signal");
    }
}
