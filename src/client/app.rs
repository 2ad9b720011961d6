use super::connector::{Connector, TcpConnector};
use super::sender::Sender;
use super::system_info::SystemInfo;
use crate::Result;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

/// Client application driving a [`Sender`] in automated or interactive mode
pub struct ClientApp<C = TcpConnector> {
    sender: Sender<C>,
    step_pause: Duration,
}

impl<C: Connector> ClientApp<C> {
    pub fn new(sender: Sender<C>) -> Self {
        Self {
            sender,
            step_pause: Duration::from_secs(1),
        }
    }

    pub fn sender(&self) -> &Sender<C> {
        &self.sender
    }

    pub async fn send_test_message(&self, message: &str) -> bool {
        info!(message, "Sending test message");
        let sent = self.sender.send_data(message).await;
        if sent {
            info!("Test message sent successfully");
        } else {
            error!("Failed to send test message");
        }
        sent
    }

    pub async fn send_system_info(&self) -> bool {
        let message = SystemInfo::collect().to_message();
        info!("Sending system information to server");
        let sent = self.sender.send_data(&message).await;
        if sent {
            info!("System information sent successfully");
        } else {
            error!("Failed to send system information");
        }
        sent
    }

    /// Greeting, system information, completion notice, one second apart
    pub async fn run_automated(&self) {
        info!("Starting automated mode");

        self.send_test_message("Client started").await;
        tokio::time::sleep(self.step_pause).await;

        self.send_system_info().await;
        tokio::time::sleep(self.step_pause).await;

        self.send_test_message("Client automated sequence completed").await;

        info!("Automated mode completed");
    }

    /// Prompts for lines on `output` and acts on them until `quit` or end of input.
    ///
    /// `info` sends system information, blank lines re-prompt and anything
    /// else is sent as a message. Commands ignore case and surrounding space.
    pub async fn run_interactive<R, W>(&self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Starting interactive mode");
        output
            .write_all(
                b"Client - Interactive Mode\n\
                  Type 'quit' to exit, 'info' to send system info, or any message to send\n",
            )
            .await?;

        let mut lines = input.lines();
        loop {
            output.write_all(b"\nEnter message (or command): ").await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                info!("Input closed, leaving interactive mode");
                break;
            };

            let entry = line.trim();
            if entry.eq_ignore_ascii_case("quit") {
                info!("Exiting interactive mode");
                break;
            } else if entry.eq_ignore_ascii_case("info") {
                self.send_system_info().await;
            } else if entry.is_empty() {
                output.write_all(b"Please enter a message or command\n").await?;
            } else {
                self.send_test_message(entry).await;
            }
        }

        Ok(())
    }
}
