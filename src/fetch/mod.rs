// ABOUTME: Artifact download through the first available HTTP transport.
// ABOUTME: Transports are probed in priority order: curl, then wget.

mod transports;

pub use transports::{CurlTransport, WgetTransport};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors from artifact download.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("no download transport available (checked: {checked})")]
    NoTransport { checked: String },

    #[error("{transport} download failed: {detail}")]
    Failed { transport: String, detail: String },

    #[error("{transport} download timed out after {secs}s")]
    TimedOut { transport: String, secs: u64 },

    #[error("{transport} reported success but wrote no file to {}", .path.display())]
    MissingOutput { transport: String, path: PathBuf },
}

/// A way of retrieving a URL into a local file.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this transport can be used on this host.
    fn is_available(&self) -> bool;

    /// Download `url` into `destination`, giving up after `timeout`.
    async fn download(
        &self,
        url: &str,
        destination: &Path,
        timeout: Duration,
    ) -> Result<(), FetchError>;
}

/// Selects a transport and downloads artifacts with it.
pub struct Fetcher {
    transports: Vec<Box<dyn Transport>>,
    timeout: Duration,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.transports.iter().map(|t| t.name()).collect();
        f.debug_struct("Fetcher")
            .field("transports", &names)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Fetcher {
    /// Fetcher using the host's curl or wget.
    pub fn new(timeout: Duration) -> Self {
        Self::with_transports(
            vec![Box::new(CurlTransport), Box::new(WgetTransport)],
            timeout,
        )
    }

    /// Fetcher with an explicit, priority-ordered transport list.
    pub fn with_transports(transports: Vec<Box<dyn Transport>>, timeout: Duration) -> Self {
        Self {
            transports,
            timeout,
        }
    }

    /// First transport reporting itself available.
    pub fn select(&self) -> Option<&dyn Transport> {
        self.transports
            .iter()
            .find(|t| t.is_available())
            .map(|t| t.as_ref())
    }

    /// Download `url` to `destination`.
    pub async fn fetch(&self, url: &str, destination: &Path) -> Result<PathBuf, FetchError> {
        let transport = self.select().ok_or_else(|| FetchError::NoTransport {
            checked: self
                .transports
                .iter()
                .map(|t| t.name())
                .collect::<Vec<_>>()
                .join(", "),
        })?;

        tracing::info!("Downloading {} via {}", url, transport.name());
        transport.download(url, destination, self.timeout).await?;

        let size = match std::fs::metadata(destination) {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => {
                return Err(FetchError::MissingOutput {
                    transport: transport.name().to_string(),
                    path: destination.to_path_buf(),
                });
            }
        };

        tracing::info!("Downloaded {} bytes to {}", size, destination.display());
        Ok(destination.to_path_buf())
    }
}
