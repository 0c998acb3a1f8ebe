// ABOUTME: Post-restart health verification against local HTTP endpoints.
// ABOUTME: Probes each candidate port and path in order until one answers below 400.

use http_body_util::Empty;
use hyper::StatusCode;
use hyper_util::rt::TokioIo;
use nonempty::NonEmpty;
use serde::Serialize;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::config::HealthConfig;

const PROBE_HOST: &str = "127.0.0.1";

/// The endpoint that confirmed the application is up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthyEndpoint {
    pub port: u16,
    pub path: String,
    pub status: u16,
}

#[derive(Debug, Clone)]
pub struct HealthVerifier {
    ports: NonEmpty<u16>,
    paths: Vec<String>,
    settle_delay: Duration,
    probe_timeout: Duration,
}

impl HealthVerifier {
    pub fn new(
        ports: NonEmpty<u16>,
        paths: Vec<String>,
        settle_delay: Duration,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            ports,
            paths,
            settle_delay,
            probe_timeout,
        }
    }

    pub fn from_config(config: &HealthConfig) -> Self {
        Self::new(
            config.ports.clone(),
            config.paths.clone(),
            config.settle_delay,
            config.probe_timeout,
        )
    }

    /// Wait the settle delay, then probe. `None` means nothing answered healthily.
    pub async fn verify(&self) -> Option<HealthyEndpoint> {
        if !self.settle_delay.is_zero() {
            tracing::info!(
                "Waiting {}s for the application to settle",
                self.settle_delay.as_secs()
            );
            tokio::time::sleep(self.settle_delay).await;
        }

        for port in self.ports.iter().copied() {
            for path in &self.paths {
                match tokio::time::timeout(self.probe_timeout, probe(port, path)).await {
                    Ok(Ok(status)) if status.as_u16() < 400 => {
                        tracing::info!("Health check passed: {}:{}{} -> {}", PROBE_HOST, port, path, status);
                        return Some(HealthyEndpoint {
                            port,
                            path: path.clone(),
                            status: status.as_u16(),
                        });
                    }
                    Ok(Ok(status)) => {
                        tracing::debug!("{}:{}{} answered {}", PROBE_HOST, port, path, status);
                    }
                    Ok(Err(e)) => {
                        tracing::debug!("{}:{}{} unreachable: {}", PROBE_HOST, port, path, e);
                    }
                    Err(_) => {
                        tracing::debug!("{}:{}{} timed out", PROBE_HOST, port, path);
                    }
                }
            }
        }

        None
    }
}

async fn probe(port: u16, path: &str) -> Result<StatusCode, String> {
    let stream = TcpStream::connect((PROBE_HOST, port))
        .await
        .map_err(|e| format!("connect failed: {}", e))?;

    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|e| format!("HTTP handshake failed: {}", e))?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!("health probe connection error: {}", e);
        }
    });

    let req = hyper::Request::builder()
        .method("GET")
        .uri(path)
        .header("Host", format!("{}:{}", PROBE_HOST, port))
        .header("User-Agent", concat!("stevedore/", env!("CARGO_PKG_VERSION")))
        .body(Empty::<bytes::Bytes>::new())
        .map_err(|e| format!("failed to build request: {}", e))?;

    let resp = sender
        .send_request(req)
        .await
        .map_err(|e| format!("request failed: {}", e))?;

    Ok(resp.status())
}
