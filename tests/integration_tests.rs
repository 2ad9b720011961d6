use acksrv::Sender;
use acksrv::common::{TestServer, spawn_test_server};
use acksrv::config::{ClientConfig, ServerConfig};
use acksrv::protocol::acknowledgment;
use color_eyre::eyre::Result;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn client_config(addr: SocketAddr, retry_attempts: u32) -> ClientConfig {
    ClientConfig {
        server_host: addr.ip().to_string(),
        server_port: addr.port(),
        connection_timeout: Duration::from_secs(2),
        retry_attempts,
    }
}

/// Writes one message and reads back exactly its acknowledgment
async fn exchange(stream: &mut TcpStream, message: &str) -> Result<String> {
    stream.write_all(message.as_bytes()).await?;
    let mut ack = vec![0u8; acknowledgment(message).len()];
    stream.read_exact(&mut ack).await?;
    Ok(String::from_utf8(ack)?)
}

#[tokio::test]
async fn test_round_trip_acknowledgment() -> Result<()> {
    let TestServer { addr, handle, .. } = spawn_test_server(ServerConfig::default()).await?;
    let sender = Sender::new(&client_config(addr, 3));

    let response = sender.send_data_with_response("Hello, Server!").await;
    assert_eq!(response.as_deref(), Some("Server received: Hello, Server!"));

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn test_send_data_and_labels() -> Result<()> {
    let TestServer { addr, handle, .. } = spawn_test_server(ServerConfig::default()).await?;
    let sender = Sender::new(&client_config(addr, 3));

    assert!(sender.send_data("status report").await);
    assert!(sender.test_connection().await);
    assert_eq!(
        sender.get_server_info().await.as_deref(),
        Some("Server received: GET_SERVER_INFO")
    );
    assert!(!sender.send_data("   ").await);

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn test_multiple_messages_on_one_connection() -> Result<()> {
    let TestServer { addr, handle, .. } = spawn_test_server(ServerConfig::default()).await?;
    let mut stream = TcpStream::connect(addr).await?;

    assert_eq!(exchange(&mut stream, "one").await?, "Server received: one");
    assert_eq!(exchange(&mut stream, "two").await?, "Server received: two");
    assert_eq!(exchange(&mut stream, "héllo wörld").await?, "Server received: héllo wörld");

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn test_concurrent_clients_receive_their_own_ack() -> Result<()> {
    let TestServer { addr, handle, .. } = spawn_test_server(ServerConfig::default()).await?;

    // All connections are open before anything is sent
    let mut streams = Vec::new();
    for _ in 0..3 {
        streams.push(TcpStream::connect(addr).await?);
    }

    let mut tasks = Vec::new();
    for (i, mut stream) in streams.into_iter().enumerate() {
        tasks.push(tokio::spawn(async move {
            let message = format!("Message from client {i}");
            let ack = exchange(&mut stream, &message).await?;
            Ok::<_, color_eyre::eyre::Error>((message, ack))
        }));
    }

    for task in tasks {
        let (message, ack) = task.await??;
        assert_eq!(ack, acknowledgment(&message));
    }

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn test_peer_close_leaves_other_connections_alone() -> Result<()> {
    let TestServer { addr, handle, .. } = spawn_test_server(ServerConfig::default()).await?;
    let mut staying = TcpStream::connect(addr).await?;
    let mut leaving = TcpStream::connect(addr).await?;

    exchange(&mut staying, "first").await?;
    exchange(&mut leaving, "bye").await?;

    leaving.shutdown().await?;
    let mut rest = Vec::new();
    leaving.read_to_end(&mut rest).await?;
    assert!(rest.is_empty());

    assert_eq!(exchange(&mut staying, "still here").await?, "Server received: still here");

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn test_shutdown_stops_accepting_but_not_active_handlers() -> Result<()> {
    let TestServer {
        addr,
        shutdown,
        handle,
    } = spawn_test_server(ServerConfig::default()).await?;
    let mut active = TcpStream::connect(addr).await?;
    exchange(&mut active, "before shutdown").await?;

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), handle).await???;

    // The listening socket is gone
    assert!(TcpStream::connect(addr).await.is_err());

    // The active handler was parked in a read and serves one more message
    assert_eq!(exchange(&mut active, "late").await?, "Server received: late");

    // Then it sees the flag and closes
    let mut rest = Vec::new();
    active.read_to_end(&mut rest).await?;
    assert!(rest.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unreachable_server() -> Result<()> {
    // Reserve a port, then free it so nothing listens there
    let addr = std::net::TcpListener::bind("127.0.0.1:0")?.local_addr()?;
    let sender = Sender::new(&client_config(addr, 1));

    assert!(!sender.send_data("anyone there?").await);
    assert_eq!(sender.send_data_with_response("anyone there?").await, None);
    Ok(())
}

#[tokio::test]
async fn test_invalid_utf8_drops_only_that_connection() -> Result<()> {
    let TestServer { addr, handle, .. } = spawn_test_server(ServerConfig::default()).await?;
    let mut good = TcpStream::connect(addr).await?;
    let mut bad = TcpStream::connect(addr).await?;

    bad.write_all(&[0xc3, 0x28, 0xff]).await?;
    let mut rest = Vec::new();
    bad.read_to_end(&mut rest).await?;
    assert!(rest.is_empty());

    assert_eq!(exchange(&mut good, "fine").await?, "Server received: fine");

    handle.abort();
    Ok(())
}
