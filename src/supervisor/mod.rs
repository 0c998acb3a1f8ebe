// ABOUTME: Stop and start handoff to whichever process supervisor owns the app.
// ABOUTME: Probes pm2, then systemd, then docker compose; first match wins.

mod compose;
mod pm2;
mod systemd;

pub use compose::{COMPOSE_FILES, ComposeRuntime, find_compose_file};
pub use pm2::ProcessSupervisor;
pub use systemd::ServiceManager;

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::process::{self, ProcessError};

/// Timeout for availability probes such as `pm2 describe`.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// The application a supervisor operation acts on.
#[derive(Debug, Clone)]
pub struct SupervisorTarget {
    pub app_name: String,
    pub live_dir: PathBuf,
    /// Script pm2 launches when it does not know the app yet. Only ever
    /// taken from configuration.
    pub entrypoint: Option<String>,
    /// Systemd unit name.
    pub unit: String,
}

impl SupervisorTarget {
    pub fn from_config(config: &Config) -> Self {
        Self {
            app_name: config.app_name.to_string(),
            live_dir: config.live_dir.clone(),
            entrypoint: config.supervisor.entrypoint.clone(),
            unit: config.unit_name(),
        }
    }
}

/// Which operation an availability probe is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// The supervisor manages the app right now.
    Stop,
    /// The supervisor can bring the app up, possibly for the first time.
    Start,
}

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("{supervisor} failed: {detail}")]
    CommandFailed {
        supervisor: &'static str,
        detail: String,
    },

    #[error("{supervisor}: {source}")]
    Process {
        supervisor: &'static str,
        #[source]
        source: ProcessError,
    },
}

/// A process-lifecycle manager the application may be registered with.
#[async_trait]
pub trait Supervisor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this supervisor manages `target` for `operation`.
    async fn is_available(&self, target: &SupervisorTarget, operation: Operation) -> bool;

    async fn stop(&self, target: &SupervisorTarget) -> Result<(), SupervisorError>;

    async fn start_or_restart(&self, target: &SupervisorTarget) -> Result<(), SupervisorError>;
}

/// Priority-ordered list of supervisors.
pub struct SupervisorBridge {
    supervisors: Vec<Box<dyn Supervisor>>,
}

impl std::fmt::Debug for SupervisorBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.supervisors.iter().map(|s| s.name()).collect();
        f.debug_struct("SupervisorBridge")
            .field("supervisors", &names)
            .finish()
    }
}

impl SupervisorBridge {
    pub fn new(supervisors: Vec<Box<dyn Supervisor>>) -> Self {
        Self { supervisors }
    }

    /// pm2, systemd, compose, each bounded by `timeout` per command.
    pub fn with_defaults(timeout: Duration) -> Self {
        Self::new(vec![
            Box::new(ProcessSupervisor::new(timeout)),
            Box::new(ServiceManager::new(timeout)),
            Box::new(ComposeRuntime::new(timeout)),
        ])
    }

    /// First supervisor available for `operation` on `target`.
    pub async fn select(
        &self,
        target: &SupervisorTarget,
        operation: Operation,
    ) -> Option<&dyn Supervisor> {
        for supervisor in &self.supervisors {
            if supervisor.is_available(target, operation).await {
                return Some(supervisor.as_ref());
            }
        }
        None
    }

    /// Stop the app. `Ok(None)` when no supervisor manages it.
    pub async fn stop(
        &self,
        target: &SupervisorTarget,
    ) -> Result<Option<&'static str>, SupervisorError> {
        let Some(supervisor) = self.select(target, Operation::Stop).await else {
            return Ok(None);
        };
        tracing::info!("Stopping {} via {}", target.app_name, supervisor.name());
        supervisor.stop(target).await?;
        Ok(Some(supervisor.name()))
    }

    /// Start or restart the app. `Ok(None)` when no supervisor can.
    ///
    /// A supervisor already managing the app wins over one that could only
    /// launch it fresh, so start goes to the same place stop went.
    pub async fn start_or_restart(
        &self,
        target: &SupervisorTarget,
    ) -> Result<Option<&'static str>, SupervisorError> {
        let managing = self.select(target, Operation::Stop).await;
        let supervisor = match managing {
            Some(supervisor) => supervisor,
            None => match self.select(target, Operation::Start).await {
                Some(supervisor) => supervisor,
                None => return Ok(None),
            },
        };
        tracing::info!("Starting {} via {}", target.app_name, supervisor.name());
        supervisor.start_or_restart(target).await?;
        Ok(Some(supervisor.name()))
    }
}

/// Run one supervisor command, mapping failures into `SupervisorError`.
pub(crate) async fn run_command(
    supervisor: &'static str,
    command: tokio::process::Command,
    timeout: Duration,
) -> Result<(), SupervisorError> {
    let output = process::run_streaming(command, supervisor, timeout)
        .await
        .map_err(|source| SupervisorError::Process { supervisor, source })?;

    if output.success {
        Ok(())
    } else {
        Err(SupervisorError::CommandFailed {
            supervisor,
            detail: output.describe_failure(),
        })
    }
}
