//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

use load_balancer::balancer::{self, backend::Backend, Balancer};
use load_balancer::config::schema::{Algorithm, ProxyConfig};
use load_balancer::http::HttpServer;
use load_balancer::lifecycle::Shutdown;

/// Start a mock backend that returns a fixed 200 response.
/// Binds an ephemeral port and returns the actual address.
#[allow(dead_code)]
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    start_programmable_backend(move || async move { (200, response.to_string()) }).await
}

/// Start a programmable mock backend; the closure decides the status and
/// body of every response.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        serve_one(socket, f).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn serve_one<F, Fut>(mut socket: TcpStream, f: Arc<F>)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    // Read the request head before responding.
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
        if head.len() > 8 * 1024 {
            return;
        }
    }

    let (status, body) = f().await;
    let status_text = match status {
        200 => "200 OK",
        404 => "404 Not Found",
        418 => "418 I'm a teapot",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };

    let response_str = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response_str.as_bytes()).await;
    let _ = socket.shutdown().await;
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// Build one backend record pointing at a mock server.
pub fn backend_for(addr: SocketAddr) -> Arc<Backend> {
    let url = Url::parse(&format!("http://{addr}")).unwrap();
    Arc::new(Backend::new(url, "/health"))
}

/// Spawn the proxy over the given backends and return its address plus the
/// shutdown coordinator keeping it alive.
pub async fn start_proxy(backends: Vec<Arc<Backend>>, algorithm: Algorithm) -> (SocketAddr, Shutdown) {
    let balancer: Arc<dyn Balancer> = balancer::for_algorithm(algorithm, backends);
    let config = ProxyConfig::default();
    let server = HttpServer::new(&config, balancer);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    // Wait for the server to start accepting.
    tokio::time::sleep(Duration::from_millis(100)).await;

    (addr, shutdown)
}
