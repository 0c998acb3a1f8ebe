// ABOUTME: systemd service manager integration.
// ABOUTME: Uses non-interactive sudo for unit control unless already running as root.

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

use super::{Operation, PROBE_TIMEOUT, Supervisor, SupervisorError, SupervisorTarget, run_command};
use crate::process;

const NAME: &str = "systemd";

#[derive(Debug, Clone)]
pub struct ServiceManager {
    timeout: Duration,
}

impl ServiceManager {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn systemctl(&self, action: &str, unit: &str) -> Command {
        let mut command = if is_root() {
            Command::new("systemctl")
        } else {
            let mut sudo = Command::new("sudo");
            sudo.args(["-n", "systemctl"]);
            sudo
        };
        command.args([action, unit]);
        command
    }
}

#[async_trait]
impl Supervisor for ServiceManager {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn is_available(&self, target: &SupervisorTarget, _operation: Operation) -> bool {
        if process::find_in_path("systemctl").is_none() {
            return false;
        }
        let mut cat = Command::new("systemctl");
        cat.args(["cat", &target.unit]);
        process::succeeds(cat, PROBE_TIMEOUT).await
    }

    async fn stop(&self, target: &SupervisorTarget) -> Result<(), SupervisorError> {
        run_command(NAME, self.systemctl("stop", &target.unit), self.timeout).await
    }

    async fn start_or_restart(&self, target: &SupervisorTarget) -> Result<(), SupervisorError> {
        run_command(NAME, self.systemctl("restart", &target.unit), self.timeout).await
    }
}

fn is_root() -> bool {
    current_uid().as_deref() == Some("0")
}

fn current_uid() -> Option<String> {
    std::fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| {
            status
                .lines()
                .find(|l| l.starts_with("Uid:"))
                .and_then(|l| l.split_whitespace().nth(1))
                .map(|s| s.to_string())
        })
        .or_else(|| std::env::var("UID").ok())
}
