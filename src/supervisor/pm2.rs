// ABOUTME: pm2 process manager integration.
// ABOUTME: Restarts a registered app, or registers it from the configured entrypoint on first start.

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

use super::{Operation, PROBE_TIMEOUT, Supervisor, SupervisorError, SupervisorTarget, run_command};
use crate::process;

const NAME: &str = "pm2";

#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    timeout: Duration,
}

impl ProcessSupervisor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn knows(&self, app: &str) -> bool {
        let mut describe = Command::new(NAME);
        describe.args(["describe", app]);
        process::succeeds(describe, PROBE_TIMEOUT).await
    }
}

#[async_trait]
impl Supervisor for ProcessSupervisor {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn is_available(&self, target: &SupervisorTarget, operation: Operation) -> bool {
        if process::find_in_path(NAME).is_none() {
            return false;
        }
        if self.knows(&target.app_name).await {
            return true;
        }
        // First launch needs an entrypoint from config, never a guess.
        operation == Operation::Start && target.entrypoint.is_some()
    }

    async fn stop(&self, target: &SupervisorTarget) -> Result<(), SupervisorError> {
        let mut command = Command::new(NAME);
        command.args(["stop", &target.app_name]);
        run_command(NAME, command, self.timeout).await
    }

    async fn start_or_restart(&self, target: &SupervisorTarget) -> Result<(), SupervisorError> {
        let mut command = Command::new(NAME);
        command.current_dir(&target.live_dir);

        if self.knows(&target.app_name).await {
            command.args(["restart", &target.app_name, "--update-env"]);
        } else if let Some(entrypoint) = &target.entrypoint {
            command.args(["start", entrypoint, "--name", &target.app_name]);
        } else {
            return Err(SupervisorError::CommandFailed {
                supervisor: NAME,
                detail: format!("{} is not registered and no entrypoint is known", target.app_name),
            });
        }

        run_command(NAME, command, self.timeout).await
    }
}
