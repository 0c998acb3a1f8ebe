// ABOUTME: In-process stand-ins for download transports and process supervisors.
// ABOUTME: Record what the pipeline asked of them so tests can assert on it.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stevedore::fetch::{FetchError, Fetcher, Transport};
use stevedore::supervisor::{
    Operation, Supervisor, SupervisorBridge, SupervisorError, SupervisorTarget,
};

/// Serves a local file for every URL.
pub struct FileTransport {
    pub source: PathBuf,
}

#[async_trait]
impl Transport for FileTransport {
    fn name(&self) -> &'static str {
        "file"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn download(
        &self,
        _url: &str,
        destination: &Path,
        _timeout: Duration,
    ) -> Result<(), FetchError> {
        tokio::fs::copy(&self.source, destination)
            .await
            .map(|_| ())
            .map_err(|e| FetchError::Failed {
                transport: "file".to_string(),
                detail: e.to_string(),
            })
    }
}

/// A transport whose download never finishes.
pub struct HangingTransport;

#[async_trait]
impl Transport for HangingTransport {
    fn name(&self) -> &'static str {
        "hanging"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn download(&self, _: &str, destination: &Path, _: Duration) -> Result<(), FetchError> {
        std::fs::write(destination, b"partial").unwrap();
        std::future::pending::<()>().await;
        Ok(())
    }
}

pub fn file_fetcher(source: &Path) -> Fetcher {
    Fetcher::with_transports(
        vec![Box::new(FileTransport {
            source: source.to_path_buf(),
        })],
        Duration::from_secs(10),
    )
}

pub fn hanging_fetcher() -> Fetcher {
    Fetcher::with_transports(vec![Box::new(HangingTransport)], Duration::from_secs(10))
}

/// Supervisor fake recording each call as "<name>:<op>".
#[derive(Clone)]
pub struct FakeSupervisor {
    pub name: &'static str,
    pub manages: bool,
    /// Can launch the app even though it does not manage it yet.
    pub launches: bool,
    pub fail_start: bool,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl FakeSupervisor {
    pub fn new(name: &'static str, manages: bool) -> Self {
        Self {
            name,
            manages,
            launches: false,
            fail_start: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn launching(mut self) -> Self {
        self.launches = true;
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Supervisor for FakeSupervisor {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn is_available(&self, _target: &SupervisorTarget, operation: Operation) -> bool {
        self.manages || (operation == Operation::Start && self.launches)
    }

    async fn stop(&self, _target: &SupervisorTarget) -> Result<(), SupervisorError> {
        self.calls.lock().unwrap().push(format!("{}:stop", self.name));
        Ok(())
    }

    async fn start_or_restart(&self, target: &SupervisorTarget) -> Result<(), SupervisorError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:start:{}", self.name, target.app_name));
        if self.fail_start {
            return Err(SupervisorError::CommandFailed {
                supervisor: self.name,
                detail: "exit code 1".to_string(),
            });
        }
        Ok(())
    }
}

pub fn bridge(supervisors: &[FakeSupervisor]) -> SupervisorBridge {
    SupervisorBridge::new(
        supervisors
            .iter()
            .cloned()
            .map(|s| Box::new(s) as Box<dyn Supervisor>)
            .collect(),
    )
}
