//! Minimal single-response HTTP/1.1 mock server for integration tests. No
//! mock-server crate is declared as a dependency, so this speaks just enough
//! HTTP/1.1 to satisfy `reqwest`: a status line, `Content-Length`, and
//! `Connection: close` so the client doesn't wait on a keep-alive byte that
//! never arrives.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs a `tracing` subscriber the first time any test calls it; later
/// calls are no-ops since a global subscriber can only be set once.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        _ => "OK",
    }
}

/// Starts a server on an OS-assigned loopback port that answers every
/// request with the same `(status, body)` pair, then returns its base URL.
/// The accept loop runs for the lifetime of the test process.
pub async fn spawn_mock_server(status: u16, body: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock server");
    let addr = listener.local_addr().expect("local addr");
    let body = body.to_string();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let body = body.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status} {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    reason_phrase(status),
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}
