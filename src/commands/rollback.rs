// ABOUTME: Rollback command implementation.
// ABOUTME: Restores the newest or a chosen backup through the same install pipeline.

use std::path::Path;
use std::time::Instant;
use stevedore::config::Config;
use stevedore::deploy::{DeploymentOutcome, Orchestrator};
use stevedore::error::Result;
use stevedore::output::Output;
use stevedore::signal::shutdown_signal;

/// Restore a backup. Returns whether it succeeded.
pub async fn rollback(
    config: Config,
    backup: Option<&Path>,
    force_unlock: bool,
    output: &Output,
) -> Result<bool> {
    let started = Instant::now();

    match backup {
        Some(path) => output.progress(&format!(
            "Rolling back {} to {}",
            config.app_name,
            path.display()
        )),
        None => output.progress(&format!(
            "Rolling back {} to the newest backup",
            config.app_name
        )),
    }

    let orchestrator = Orchestrator::new(config).force_unlock(force_unlock);
    let result = orchestrator.rollback_until(backup, shutdown_signal()).await;

    let outcome = DeploymentOutcome::from_result(result, started.elapsed().as_secs_f64());
    output.outcome("Rollback", &outcome);
    Ok(outcome.is_success())
}
