// ABOUTME: curl and wget transports driven as subordinate processes.
// ABOUTME: Both fail on HTTP error statuses and are bounded by the fetch timeout.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

use super::{FetchError, Transport};
use crate::process::{self, ProcessError};

/// Downloads with `curl -fsSL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlTransport;

#[async_trait]
impl Transport for CurlTransport {
    fn name(&self) -> &'static str {
        "curl"
    }

    fn is_available(&self) -> bool {
        process::find_in_path("curl").is_some()
    }

    async fn download(
        &self,
        url: &str,
        destination: &Path,
        timeout: Duration,
    ) -> Result<(), FetchError> {
        let mut command = Command::new("curl");
        command
            .args(["-fsSL", "--max-time"])
            .arg(timeout.as_secs().max(1).to_string())
            .arg("-o")
            .arg(destination)
            .arg(url);

        run_transport(self.name(), command, timeout).await
    }
}

/// Downloads with `wget -q`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WgetTransport;

#[async_trait]
impl Transport for WgetTransport {
    fn name(&self) -> &'static str {
        "wget"
    }

    fn is_available(&self) -> bool {
        process::find_in_path("wget").is_some()
    }

    async fn download(
        &self,
        url: &str,
        destination: &Path,
        timeout: Duration,
    ) -> Result<(), FetchError> {
        let mut command = Command::new("wget");
        command
            .args(["-q", "--tries=1"])
            .arg(format!("--timeout={}", timeout.as_secs().max(1)))
            .arg("-O")
            .arg(destination)
            .arg(url);

        run_transport(self.name(), command, timeout).await
    }
}

async fn run_transport(name: &str, command: Command, timeout: Duration) -> Result<(), FetchError> {
    let output = process::run_streaming(command, name, timeout)
        .await
        .map_err(|e| match e {
            ProcessError::TimedOut { timeout, .. } => FetchError::TimedOut {
                transport: name.to_string(),
                secs: timeout.as_secs(),
            },
            other => FetchError::Failed {
                transport: name.to_string(),
                detail: other.to_string(),
            },
        })?;

    if !output.success {
        return Err(FetchError::Failed {
            transport: name.to_string(),
            detail: output.describe_failure(),
        });
    }

    Ok(())
}
