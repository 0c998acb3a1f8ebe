// ABOUTME: Deploy command implementation.
// ABOUTME: Runs the deployment pipeline until completion or a shutdown signal.

use std::time::Instant;
use stevedore::config::Config;
use stevedore::deploy::{DeploymentOutcome, DeploymentRequest, Orchestrator};
use stevedore::error::Result;
use stevedore::output::Output;
use stevedore::signal::shutdown_signal;

/// Deploy one release. Returns whether it succeeded.
pub async fn deploy(
    config: Config,
    artifact_url: &str,
    release_tag: &str,
    force_unlock: bool,
    output: &Output,
) -> Result<bool> {
    let started = Instant::now();
    let request = DeploymentRequest::new(artifact_url, release_tag)?;

    output.progress(&format!(
        "Deploying {} {} into {}",
        config.app_name,
        request.release_tag(),
        config.live_dir.display()
    ));

    let orchestrator = Orchestrator::new(config).force_unlock(force_unlock);
    let result = orchestrator
        .deploy_until(request, shutdown_signal())
        .await;

    let outcome = DeploymentOutcome::from_result(result, started.elapsed().as_secs_f64());
    output.outcome("Deploy", &outcome);
    Ok(outcome.is_success())
}
