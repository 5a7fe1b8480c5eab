use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::{sleep, timeout};

use protoline::protocols::echo;
use protoline::{ProtocolError, Server, ServerError, ServerOptions, TelnetServer};

const WAIT: Duration = Duration::from_secs(2);

// Each test listens on its own port so they can run in parallel
const PORT_ECHO: i32 = 47101;
const PORT_FULL: i32 = 47102;
const PORT_STOP: i32 = 47103;
const PORT_WELCOME_ERROR: i32 = 47104;
const PORT_NO_HANDLER: i32 = 47105;
const PORT_IN_USE: i32 = 47106;
const PORT_RELEASE: i32 = 47107;
const PORT_CONCURRENT: i32 = 47108;
const PORT_DROPPED: i32 = 47109;

fn local_options(max_connections: usize) -> ServerOptions {
    ServerOptions {
        bind_address: "127.0.0.1".parse().unwrap(),
        max_connections,
    }
}

async fn echo_server(port: i32, max_connections: usize) -> Server {
    Server::listen_with(
        port,
        Some(Arc::new(TelnetServer::new(echo::welcome))),
        local_options(max_connections),
    )
    .await
    .unwrap()
}

// Helper to talk to the server line by line
struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    /// Next line without its terminator, `None` once the server closed the stream
    async fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match timeout(WAIT, self.reader.read_line(&mut line)).await {
            Ok(Ok(0)) | Ok(Err(_)) => None,
            Ok(Ok(_)) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(_) => panic!("timed out waiting for a line"),
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .unwrap();
    }
}

/// A refused peer either cannot connect or sees the stream close with no data.
async fn assert_refused(addr: SocketAddr) {
    let Ok(mut stream) = TcpStream::connect(addr).await else {
        return;
    };

    let mut buf = [0u8; 64];
    match timeout(WAIT, stream.read(&mut buf)).await {
        Ok(Ok(0)) | Ok(Err(_)) => {}
        Ok(Ok(n)) => panic!("refused connection received {} bytes", n),
        Err(_) => panic!("refused connection was left open"),
    }
}

async fn wait_for_active(server: &Server, expected: usize) {
    for _ in 0..200 {
        if server.active_connections() == expected {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {} active connections, found {}",
        expected,
        server.active_connections()
    );
}

#[tokio::test]
async fn test_listen_rejects_invalid_ports() {
    for port in [0, -1, 70_000] {
        let handler = Some(Arc::new(TelnetServer::new(echo::welcome)));
        match Server::listen(port, handler).await {
            Err(ServerError::InvalidPort(p)) => assert_eq!(p, port),
            Err(e) => panic!("unexpected error for port {}: {}", port, e),
            Ok(_) => panic!("listen succeeded on port {}", port),
        }
    }
}

#[tokio::test]
async fn test_listen_rejects_missing_handler() {
    let result = Server::listen_with::<TelnetServer>(PORT_NO_HANDLER, None, local_options(1)).await;
    assert!(matches!(result, Err(ServerError::MissingHandler)));

    // no socket was created, so the port is still free
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", PORT_NO_HANDLER as u16)).await;
    assert!(listener.is_ok());
}

#[tokio::test]
async fn test_listen_reports_bind_failure() {
    let _taken = tokio::net::TcpListener::bind(("127.0.0.1", PORT_IN_USE as u16))
        .await
        .unwrap();

    let result = Server::listen_with(
        PORT_IN_USE,
        Some(Arc::new(TelnetServer::new(echo::welcome))),
        local_options(1),
    )
    .await;
    assert!(matches!(result, Err(ServerError::Bind { .. })));
}

#[tokio::test]
async fn test_echo_session() {
    let server = echo_server(PORT_ECHO, 10).await;
    assert_eq!(server.port(), PORT_ECHO as u16);

    let mut client = Client::connect(server.address()).await.unwrap();
    assert_eq!(client.read_line().await.as_deref(), Some("Welcome!!!"));

    client.send("hello").await;
    let reply = client.read_line().await.unwrap();
    assert!(reply.contains("hello"));

    client.send("quit").await;
    assert_eq!(client.read_line().await.as_deref(), Some("Bye!"));
    assert_eq!(client.read_line().await, None);

    wait_for_active(&server, 0).await;
    server.stop().await;
}

#[tokio::test]
async fn test_rejects_connections_over_capacity() {
    let server = echo_server(PORT_FULL, 2).await;
    let addr = server.address();

    let mut first = Client::connect(addr).await.unwrap();
    assert_eq!(first.read_line().await.as_deref(), Some("Welcome!!!"));
    let mut second = Client::connect(addr).await.unwrap();
    assert_eq!(second.read_line().await.as_deref(), Some("Welcome!!!"));
    assert_eq!(server.active_connections(), 2);

    assert_refused(addr).await;
    assert_refused(addr).await;
    assert_eq!(server.active_connections(), 2);

    // closing one admitted connection frees exactly one slot
    first.send("bye").await;
    assert_eq!(first.read_line().await.as_deref(), Some("Bye!"));
    wait_for_active(&server, 1).await;

    let mut third = Client::connect(addr).await.unwrap();
    assert_eq!(third.read_line().await.as_deref(), Some("Welcome!!!"));
    assert_eq!(server.active_connections(), 2);
    assert_refused(addr).await;

    // the survivors are still served
    second.send("still here").await;
    assert_eq!(
        second.read_line().await.as_deref(),
        Some("You just said: still here")
    );

    server.stop().await;
}

#[tokio::test]
async fn test_stop_keeps_open_connections() {
    let server = echo_server(PORT_STOP, 10).await;
    let addr = server.address();

    let mut client = Client::connect(addr).await.unwrap();
    assert_eq!(client.read_line().await.as_deref(), Some("Welcome!!!"));
    wait_for_active(&server, 1).await;

    server.stop().await;
    assert_refused(addr).await;

    client.send("after stop").await;
    assert_eq!(
        client.read_line().await.as_deref(),
        Some("You just said: after stop")
    );
    client.send("exit").await;
    assert_eq!(client.read_line().await.as_deref(), Some("Bye!"));
    assert_eq!(client.read_line().await, None);
}

#[tokio::test]
async fn test_welcome_failure_closes_silently() {
    let handler = TelnetServer::new(|| Err(ProtocolError::Welcome("not today".into())));
    let server = Server::listen_with(PORT_WELCOME_ERROR, Some(Arc::new(handler)), local_options(4))
        .await
        .unwrap();

    assert_refused(server.address()).await;
    wait_for_active(&server, 0).await;

    server.stop().await;
}

#[tokio::test]
async fn test_peer_disconnect_releases_slot() {
    let server = echo_server(PORT_RELEASE, 1).await;
    let addr = server.address();

    let mut client = Client::connect(addr).await.unwrap();
    assert_eq!(client.read_line().await.as_deref(), Some("Welcome!!!"));
    drop(client);
    wait_for_active(&server, 0).await;

    let mut again = Client::connect(addr).await.unwrap();
    assert_eq!(again.read_line().await.as_deref(), Some("Welcome!!!"));

    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_connects_respect_capacity() {
    let server = echo_server(PORT_CONCURRENT, 3).await;
    let addr = server.address();

    let attempts: Vec<_> = (0..12)
        .map(|_| {
            tokio::spawn(async move {
                let mut client = Client::connect(addr).await.ok()?;
                let welcome = client.read_line().await?;
                assert_eq!(welcome, "Welcome!!!");
                Some(client)
            })
        })
        .collect();

    let mut admitted = Vec::new();
    for attempt in attempts {
        if let Some(client) = attempt.await.unwrap() {
            admitted.push(client);
        }
    }

    assert_eq!(admitted.len(), 3);
    assert_eq!(server.active_connections(), 3);

    drop(admitted);
    wait_for_active(&server, 0).await;
    server.stop().await;
}

#[tokio::test]
async fn test_dropped_server_stops_accepting() {
    let server = echo_server(PORT_DROPPED, 4).await;
    let addr = server.address();

    let mut client = Client::connect(addr).await.unwrap();
    assert_eq!(client.read_line().await.as_deref(), Some("Welcome!!!"));

    drop(server);
    sleep(Duration::from_millis(50)).await;
    assert_refused(addr).await;

    // like stop(), dropping leaves open connections alone
    client.send("still served").await;
    assert_eq!(
        client.read_line().await.as_deref(),
        Some("You just said: still served")
    );
}
