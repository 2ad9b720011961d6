use super::connector::{Connector, TcpConnector};
use super::retry::RetryPolicy;
use crate::config::ClientConfig;
use crate::protocol::{ACK_READ_SIZE, CONNECTION_TEST, GET_SERVER_INFO, validate_payload};
use crate::{AckError, Result};
use bytes::BytesMut;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

/// Client send pipeline
///
/// Each send cycle opens a new connection, writes the payload, waits for
/// the acknowledgment and closes the connection again, whatever happened.
/// [`send_data`](Self::send_data) wraps cycles in a [`RetryPolicy`];
/// backoff pauses suspend the calling task and cannot be cancelled.
///
/// # Examples
///
/// ```no_run
/// use acksrv::Sender;
/// use acksrv::config::ClientConfig;
///
/// #[tokio::main]
/// async fn main() {
///     let sender = Sender::new(&ClientConfig::default());
///     if !sender.send_data("Hello, Server!").await {
///         eprintln!("server unreachable");
///     }
/// }
/// ```
pub struct Sender<C = TcpConnector> {
    connector: C,
    connection_timeout: Duration,
    policy: RetryPolicy,
}

impl Sender<TcpConnector> {
    /// Sender for the configured server over TCP
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_connector(TcpConnector::from_config(config), config)
    }
}

impl<C: Connector> Sender<C> {
    pub fn with_connector(connector: C, config: &ClientConfig) -> Self {
        Self {
            connector,
            connection_timeout: config.connection_timeout,
            policy: RetryPolicy::from_config(config),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sends `payload`, retrying failed cycles with backoff.
    ///
    /// Blank payloads are rejected without touching the network. Returns
    /// whether some cycle delivered the payload; the acknowledgment is not
    /// required for success.
    pub async fn send_data(&self, payload: &str) -> bool {
        if let Err(e) = validate_payload(payload) {
            warn!(error = %e, "Empty data provided, nothing to send");
            return false;
        }

        let endpoint = self.connector.endpoint();
        info!(%endpoint, "Attempting to send data to {endpoint}");
        debug!(payload, "Data content");

        for attempt in self.policy.attempts() {
            let n = attempt.attempt_number;
            debug!(attempt = n, max_attempts = attempt.max_attempts, "Attempt {n}/{}", attempt.max_attempts);

            match self.send_once(payload).await {
                Ok(()) => {
                    info!(attempt = n, "Data sent successfully on attempt {n}");
                    return true;
                }
                Err(e) if attempt.is_last() => {
                    error!(max_attempts = attempt.max_attempts, error = %e, "All {} attempts failed", attempt.max_attempts);
                }
                Err(e) => {
                    let backoff_secs = attempt.backoff.as_secs();
                    warn!(attempt = n, backoff_secs, error = %e, "Attempt {n} failed, retrying in {backoff_secs} seconds...");
                    sleep(attempt.backoff).await;
                }
            }
        }

        false
    }

    /// Performs a single send cycle without retry.
    ///
    /// Fails only when the connection cannot be opened or the payload cannot
    /// be written. A missing or unreadable acknowledgment is logged and ignored.
    pub async fn send_once(&self, payload: &str) -> Result<()> {
        let mut stream = self.connect().await?;
        let outcome = self.deliver(&mut stream, payload).await;
        self.close(&mut stream).await;
        outcome
    }

    /// Sends once and returns the server's reply, or `None` on any failure
    pub async fn send_data_with_response(&self, payload: &str) -> Option<String> {
        let mut stream = self.connect().await.ok()?;
        let outcome = self.exchange(&mut stream, payload).await;
        self.close(&mut stream).await;

        match outcome {
            Ok(Some(response)) => {
                debug!(response = %response, "Received response");
                Some(response)
            }
            Ok(None) => {
                warn!("No response received from server");
                None
            }
            Err(e) => {
                error!(error = %e, "Error in send_data_with_response");
                None
            }
        }
    }

    /// Sends the `CONNECTION_TEST` label with retry
    pub async fn test_connection(&self) -> bool {
        info!(endpoint = %self.connector.endpoint(), "Testing connection");
        self.send_data(CONNECTION_TEST).await
    }

    /// Sends the `GET_SERVER_INFO` label once and returns the reply
    pub async fn get_server_info(&self) -> Option<String> {
        self.send_data_with_response(GET_SERVER_INFO).await
    }

    async fn connect(&self) -> Result<C::Stream> {
        let endpoint = self.connector.endpoint();
        match timeout(self.connection_timeout, self.connector.connect()).await {
            Ok(Ok(stream)) => {
                debug!(%endpoint, "Connected to server {endpoint}");
                Ok(stream)
            }
            Ok(Err(e)) => {
                error!(%endpoint, error = %e, "Socket error connecting to {endpoint}");
                Err(e.into())
            }
            Err(_) => {
                error!(%endpoint, "Connection timeout to {endpoint}");
                Err(AckError::Timeout(format!("Connection timeout to {endpoint}")))
            }
        }
    }

    async fn deliver(&self, stream: &mut C::Stream, payload: &str) -> Result<()> {
        self.write(stream, payload).await?;

        match self.read_ack(stream).await {
            Ok(Some(ack)) => debug!(ack = %ack, "Received acknowledgment"),
            Ok(None) => debug!("Server closed the connection without acknowledgment"),
            Err(AckError::Timeout(_)) => warn!("No acknowledgment received from server"),
            Err(e) => warn!(error = %e, "Error receiving acknowledgment"),
        }

        Ok(())
    }

    async fn exchange(&self, stream: &mut C::Stream, payload: &str) -> Result<Option<String>> {
        self.write(stream, payload).await?;
        self.read_ack(stream).await
    }

    async fn write(&self, stream: &mut C::Stream, payload: &str) -> Result<()> {
        let write = async {
            stream.write_all(payload.as_bytes()).await?;
            stream.flush().await
        };
        timeout(self.connection_timeout, write)
            .await
            .map_err(|_| AckError::Timeout("Write timeout".to_string()))??;

        let preview: String = payload.chars().take(50).collect();
        debug!("Data sent successfully: {preview}...");
        Ok(())
    }

    /// One read of at most [`ACK_READ_SIZE`] bytes; `None` when the server closed first
    async fn read_ack(&self, stream: &mut C::Stream) -> Result<Option<String>> {
        let mut ack = BytesMut::with_capacity(ACK_READ_SIZE);
        let n = timeout(self.connection_timeout, stream.read_buf(&mut ack))
            .await
            .map_err(|_| AckError::Timeout("Acknowledgment timeout".to_string()))??;

        if n == 0 {
            return Ok(None);
        }
        Ok(Some(std::str::from_utf8(&ack)?.to_owned()))
    }

    async fn close(&self, stream: &mut C::Stream) {
        match stream.shutdown().await {
            Ok(()) => debug!("Connection closed"),
            Err(e) => warn!(error = %e, "Error closing connection"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_utils::{Reply, ScriptedConnector};
    use tokio::time::Instant;

    fn config(retry_attempts: u32) -> ClientConfig {
        ClientConfig {
            retry_attempts,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_blank_payload_never_connects() {
        let sender = Sender::with_connector(ScriptedConnector::new(Reply::Ack), &config(3));

        assert!(!sender.send_data("").await);
        assert!(!sender.send_data("  \n\t ").await);
        assert_eq!(sender.connector().attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let sender = Sender::with_connector(ScriptedConnector::new(Reply::Ack), &config(3));
        let started = Instant::now();

        assert!(sender.send_data("hello").await);
        assert_eq!(sender.connector().attempts(), 1);
        assert_eq!(sender.connector().received(), vec!["hello".to_string()]);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_one_failure() {
        let connector = ScriptedConnector::new(Reply::Ack).failing_first(1);
        let sender = Sender::with_connector(connector, &config(3));
        let started = Instant::now();

        assert!(sender.send_data("hello").await);
        assert_eq!(sender.connector().attempts(), 2);

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_exhausts_every_attempt() {
        let connector = ScriptedConnector::new(Reply::Ack).failing_first(u32::MAX);
        let sender = Sender::with_connector(connector, &config(4));
        let started = Instant::now();

        assert!(!sender.send_data("hello").await);
        assert_eq!(sender.connector().attempts(), 4);

        // 2 + 4 + 6 seconds of backoff, none after the last attempt
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(12) && elapsed < Duration::from_secs(13), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_acknowledgment_still_succeeds() {
        let sender = Sender::with_connector(ScriptedConnector::new(Reply::Silent), &config(3));

        assert!(sender.send_once("hello").await.is_ok());
        assert!(sender.send_data("hello").await);
        assert_eq!(sender.connector().attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_timeout_fails_the_cycle() {
        let sender = Sender::with_connector(ScriptedConnector::new(Reply::Ack).hanging(), &config(1));

        assert!(matches!(sender.send_once("hello").await, Err(AckError::Timeout(_))));
        assert!(!sender.send_data("hello").await);
        assert_eq!(sender.connector().attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failure_fails_the_cycle_and_retries() {
        let sender = Sender::with_connector(ScriptedConnector::new(Reply::Ack).failing_writes(), &config(3));

        assert!(matches!(sender.send_once("hello").await, Err(AckError::Io(_))));

        let started = Instant::now();
        assert!(!sender.send_data("hello").await);
        assert_eq!(sender.connector().attempts(), 1 + sender.policy().max_attempts());

        // 2 + 4 seconds of backoff between the three attempts
        let elapsed = started.elapsed();
        let expected: Duration = sender.policy().pauses().iter().sum();
        assert_eq!(expected, Duration::from_secs(6));
        assert!(elapsed >= expected && elapsed < expected + Duration::from_secs(1), "{elapsed:?}");
        assert!(sender.connector().received().is_empty());
    }

    #[tokio::test]
    async fn test_close_failure_does_not_fail_delivery() {
        let sender = Sender::with_connector(ScriptedConnector::new(Reply::Ack).failing_close(), &config(3));

        assert!(sender.send_once("hello").await.is_ok());
        assert!(sender.send_data("again").await);
        assert_eq!(
            sender.send_data_with_response("ping").await.as_deref(),
            Some("Server received: ping")
        );
        assert_eq!(sender.connector().attempts(), 3);
        assert_eq!(
            sender.connector().received(),
            vec!["hello".to_string(), "again".to_string(), "ping".to_string()]
        );
    }

    #[tokio::test]
    async fn test_send_data_with_response() {
        let sender = Sender::with_connector(ScriptedConnector::new(Reply::Ack), &config(3));

        assert_eq!(
            sender.send_data_with_response("ping").await.as_deref(),
            Some("Server received: ping")
        );
        assert_eq!(sender.connector().attempts(), 1);
    }

    #[tokio::test]
    async fn test_send_data_with_response_does_not_retry() {
        let connector = ScriptedConnector::new(Reply::Ack).failing_first(1);
        let sender = Sender::with_connector(connector, &config(3));

        assert_eq!(sender.send_data_with_response("ping").await, None);
        assert_eq!(sender.connector().attempts(), 1);
    }

    #[tokio::test]
    async fn test_send_data_with_response_on_hangup() {
        let sender = Sender::with_connector(ScriptedConnector::new(Reply::Hangup), &config(3));

        assert_eq!(sender.send_data_with_response("ping").await, None);
    }

    #[tokio::test]
    async fn test_labelled_requests() {
        let sender = Sender::with_connector(ScriptedConnector::new(Reply::Ack), &config(3));

        assert!(sender.test_connection().await);
        assert_eq!(
            sender.get_server_info().await.as_deref(),
            Some("Server received: GET_SERVER_INFO")
        );
        assert_eq!(
            sender.connector().received(),
            vec![CONNECTION_TEST.to_string(), GET_SERVER_INFO.to_string()]
        );
    }
}
