use crate::client::Connector;
use crate::config::ServerConfig;
use crate::protocol::acknowledgment;
use crate::server::ConnectionListener;
use crate::shutdown::ShutdownCoordinator;
use crate::Result;
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf, duplex};
use tokio::task::JoinHandle;

/// A running loopback server for integration tests
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: ShutdownCoordinator,
    pub handle: JoinHandle<Result<()>>,
}

/// Binds a server on an ephemeral loopback port and runs it in the background
pub async fn spawn_test_server(config: ServerConfig) -> Result<TestServer> {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..config
    };
    let shutdown = ShutdownCoordinator::new();
    let listener = ConnectionListener::bind(config, shutdown.clone()).await?;
    let addr = listener.local_addr();
    let handle = tokio::spawn(listener.run());

    Ok(TestServer {
        addr,
        shutdown,
        handle,
    })
}

/// How a [`ScriptedConnector`]'s fake server reacts to the first message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Acknowledge like the real server
    Ack,
    /// Keep the connection open and never answer
    Silent,
    /// Close the connection without answering
    Hangup,
}

/// In-memory [`Connector`] with scripted failures, for exercising the retry
/// logic without sockets
#[derive(Debug)]
pub struct ScriptedConnector {
    reply: Reply,
    failures_left: AtomicU32,
    hang: bool,
    fail_writes: bool,
    fail_close: bool,
    attempts: AtomicU32,
    received: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnector {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            failures_left: AtomicU32::new(0),
            hang: false,
            fail_writes: false,
            fail_close: false,
            attempts: AtomicU32::new(0),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Refuses the first `failures` connection attempts
    pub fn failing_first(self, failures: u32) -> Self {
        self.failures_left.store(failures, Ordering::SeqCst);
        self
    }

    /// Connection attempts never complete
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Connections open, but every write on them fails
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Connections open, but closing them reports an error
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Connection attempts made so far
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// First message seen on each successful connection, in order
    pub fn received(&self) -> Vec<String> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Stream = ScriptedStream;

    async fn connect(&self) -> io::Result<ScriptedStream> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.hang {
            std::future::pending::<()>().await;
        }

        let refused = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if refused {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "scripted refusal"));
        }

        let (client, server) = duplex(4096);
        tokio::spawn(respond(server, self.reply, self.received.clone()));
        Ok(ScriptedStream {
            inner: client,
            fail_writes: self.fail_writes,
            fail_close: self.fail_close,
        })
    }

    fn endpoint(&self) -> String {
        "scripted:0".to_string()
    }
}

/// Client half of a [`ScriptedConnector`] connection, with optional write and close faults
#[derive(Debug)]
pub struct ScriptedStream {
    inner: DuplexStream,
    fail_writes: bool,
    fail_close: bool,
}

impl AsyncRead for ScriptedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for ScriptedStream {
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut Context<'_>, data: &[u8]) -> Poll<io::Result<usize>> {
        if self.fail_writes {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted write failure")));
        }
        Pin::new(&mut self.inner).poll_write(cx, data)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if self.fail_close {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::NotConnected, "scripted close failure")));
        }
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

async fn respond(mut server: DuplexStream, reply: Reply, received: Arc<Mutex<Vec<String>>>) {
    let mut buffer = vec![0u8; 4096];
    let n = server.read(&mut buffer).await.unwrap_or(0);
    let message = String::from_utf8_lossy(&buffer[..n]).into_owned();
    if n > 0 {
        if let Ok(mut received) = received.lock() {
            received.push(message.clone());
        }
    }

    match reply {
        Reply::Ack => {
            let _ = server.write_all(acknowledgment(&message).as_bytes()).await;
        }
        Reply::Silent => {
            let _ = server.read_to_end(&mut Vec::new()).await;
        }
        Reply::Hangup => {}
    }
}
