// ABOUTME: Tests for post-start health verification.
// ABOUTME: Runs throwaway HTTP responders on ephemeral local ports.

use nonempty::NonEmpty;
use std::time::Duration;
use stevedore::health::HealthVerifier;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Answer every request on an ephemeral port with `status`. Returns the port.
async fn responder(status: &'static str) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    port
}

/// A port nothing listens on.
async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

fn verifier(ports: Vec<u16>) -> HealthVerifier {
    HealthVerifier::new(
        NonEmpty::from_vec(ports).unwrap(),
        vec!["/health".to_string(), "/".to_string()],
        Duration::ZERO,
        Duration::from_millis(500),
    )
}

#[tokio::test]
async fn first_healthy_port_wins() {
    let closed = closed_port().await;
    let healthy = responder("200 OK").await;

    let endpoint = verifier(vec![closed, healthy]).verify().await.unwrap();
    assert_eq!(endpoint.port, healthy);
    assert_eq!(endpoint.path, "/health");
    assert_eq!(endpoint.status, 200);
}

#[tokio::test]
async fn redirects_count_as_healthy() {
    let port = responder("302 Found").await;

    let endpoint = verifier(vec![port]).verify().await.unwrap();
    assert_eq!(endpoint.status, 302);
}

#[tokio::test]
async fn server_errors_are_not_healthy() {
    let port = responder("503 Service Unavailable").await;
    assert!(verifier(vec![port]).verify().await.is_none());
}

#[tokio::test]
async fn nothing_listening_is_unconfirmed() {
    let port = closed_port().await;
    assert!(verifier(vec![port]).verify().await.is_none());
}
