//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use stub_server::config::{parse_routes, ServerConfig};
use stub_server::dispatch::RandomSource;
use stub_server::net::{ConnectionTracker, Listener};
use stub_server::{HttpServer, Shutdown};

/// A stub server on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub connections: ConnectionTracker,
    shutdown: Shutdown,
    handle: JoinHandle<std::io::Result<()>>,
}

#[allow(dead_code)]
impl TestServer {
    pub async fn start(routes: &str) -> Self {
        Self::start_with(routes, None).await
    }

    pub async fn start_with_random(routes: &str, random: impl RandomSource + 'static) -> Self {
        let random: Arc<dyn RandomSource> = Arc::new(random);
        Self::start_with(routes, Some(random)).await
    }

    async fn start_with(routes: &str, random: Option<Arc<dyn RandomSource>>) -> Self {
        let table = parse_routes("test.conf", routes.as_bytes()).unwrap();
        let mut config = ServerConfig::default();
        config.http.drain_timeout_secs = 1;

        let mut server = HttpServer::new(&config, table);
        if let Some(random) = random {
            server = server.with_random_source(random);
        }
        let connections = server.connections();

        let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = tcp.local_addr().unwrap();
        let listener = Listener::from_tcp(tcp, 64);

        let shutdown = Shutdown::new();
        let receiver = shutdown.subscribe();
        let handle = tokio::spawn(server.run(listener, receiver));

        Self {
            addr,
            connections,
            shutdown,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }

    /// Wait up to `limit` for the live connection count to reach `count`.
    pub async fn wait_for_connections(&self, count: u64, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        while tokio::time::Instant::now() < deadline {
            if self.connections.active_count() == count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.connections.active_count() == count
    }
}

/// Send `request` verbatim and collect everything the server writes until
/// it closes the connection, resets it, or `limit` passes.
#[allow(dead_code)]
pub async fn raw_exchange(addr: SocketAddr, request: &str, limit: Duration) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut received = Vec::new();
    let mut buf = [0u8; 4096];
    let _ = tokio::time::timeout(limit, async {
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => received.extend_from_slice(&buf[..n]),
            }
        }
    })
    .await;
    received
}

/// Minimal `GET` request that keeps the connection open.
#[allow(dead_code)]
pub fn get_request(path: &str) -> String {
    format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n")
}
