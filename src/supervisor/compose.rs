// ABOUTME: Docker Compose integration for apps defined by a compose file in the live directory.
// ABOUTME: Prefers the `docker compose` plugin and falls back to standalone docker-compose.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use super::{Operation, Supervisor, SupervisorError, SupervisorTarget, run_command};
use crate::process;

const NAME: &str = "compose";

/// Recognised compose definitions, in lookup order.
pub const COMPOSE_FILES: [&str; 4] = [
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// The first compose definition present in `dir`.
pub fn find_compose_file(dir: &Path) -> Option<PathBuf> {
    COMPOSE_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

#[derive(Debug, Clone)]
pub struct ComposeRuntime {
    timeout: Duration,
}

impl ComposeRuntime {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn compose(&self, dir: &Path, args: &[&str]) -> Option<Command> {
        let mut command = if process::find_in_path("docker").is_some() {
            let mut docker = Command::new("docker");
            docker.arg("compose");
            docker
        } else if process::find_in_path("docker-compose").is_some() {
            Command::new("docker-compose")
        } else {
            return None;
        };
        command.args(args).current_dir(dir);
        Some(command)
    }

    async fn run(&self, target: &SupervisorTarget, args: &[&str]) -> Result<(), SupervisorError> {
        let command =
            self.compose(&target.live_dir, args)
                .ok_or_else(|| SupervisorError::CommandFailed {
                    supervisor: NAME,
                    detail: "neither docker nor docker-compose is installed".to_string(),
                })?;
        run_command(NAME, command, self.timeout).await
    }
}

#[async_trait]
impl Supervisor for ComposeRuntime {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn is_available(&self, target: &SupervisorTarget, _operation: Operation) -> bool {
        find_compose_file(&target.live_dir).is_some()
            && (process::find_in_path("docker").is_some()
                || process::find_in_path("docker-compose").is_some())
    }

    async fn stop(&self, target: &SupervisorTarget) -> Result<(), SupervisorError> {
        self.run(target, &["stop"]).await
    }

    async fn start_or_restart(&self, target: &SupervisorTarget) -> Result<(), SupervisorError> {
        self.run(target, &["up", "-d", "--build"]).await
    }
}
