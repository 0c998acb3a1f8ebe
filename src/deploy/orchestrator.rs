// ABOUTME: Sequences the deployment pipeline and decides success or failure.
// ABOUTME: Holds the deploy lock for the run and aborts cleanly on shutdown signals.

use std::future::Future;
use std::path::Path;
use std::time::Instant;
use tokio::sync::watch;

use snafu::ResultExt;

use super::error::{
    BackupsSnafu, DeployError, DeploymentFailure, InvalidRequestSnafu, NoBackupSnafu,
};
use super::lock::DeployLock;
use super::outcome::{DeploymentReport, Stage};
use super::request::DeploymentRequest;
use super::state::BackedUp;
use super::{Deployment, Initialized};
use crate::backup::{BackupArchive, BackupManager};
use crate::config::Config;
use crate::diagnostics::Warning;
use crate::fetch::Fetcher;
use crate::health::HealthVerifier;
use crate::install::Installer;
use crate::supervisor::{SupervisorBridge, SupervisorTarget};

/// Where a run is, and the warnings it has recorded so far.
#[derive(Debug, Clone)]
struct Progress {
    stage: Stage,
    warnings: Vec<Warning>,
}

impl Progress {
    fn start() -> watch::Sender<Progress> {
        watch::Sender::new(Progress {
            stage: Stage::Init,
            warnings: Vec::new(),
        })
    }
}

/// Publish `stage` along with the warnings `deployment` holds.
fn advance<S>(progress: &watch::Sender<Progress>, stage: Stage, deployment: &Deployment<S>) {
    progress.send_modify(|p| {
        p.stage = stage;
        p.warnings = deployment.diagnostics().warnings().to_vec();
    });
}

/// Runs deployments and rollbacks for one configured application.
#[derive(Debug)]
pub struct Orchestrator {
    config: Config,
    fetcher: Fetcher,
    supervisors: SupervisorBridge,
    installer: Installer,
    backups: BackupManager,
    health: HealthVerifier,
    force_unlock: bool,
}

impl Orchestrator {
    /// Orchestrator using the host's transports and supervisors.
    pub fn new(config: Config) -> Self {
        Self {
            fetcher: Fetcher::new(config.fetch.timeout),
            supervisors: SupervisorBridge::with_defaults(config.supervisor.timeout),
            installer: Installer::from_config(&config),
            backups: BackupManager::from_config(&config),
            health: HealthVerifier::from_config(&config.health),
            force_unlock: false,
            config,
        }
    }

    pub fn with_fetcher(mut self, fetcher: Fetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_supervisors(mut self, supervisors: SupervisorBridge) -> Self {
        self.supervisors = supervisors;
        self
    }

    /// Break an existing deploy lock regardless of its age.
    pub fn force_unlock(mut self, force: bool) -> Self {
        self.force_unlock = force;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Deploy a release, running to completion.
    pub async fn deploy(
        &self,
        request: DeploymentRequest,
    ) -> Result<DeploymentReport, DeploymentFailure> {
        self.deploy_until(request, std::future::pending()).await
    }

    /// Deploy a release, aborting if `shutdown` completes first.
    pub async fn deploy_until(
        &self,
        request: DeploymentRequest,
        shutdown: impl Future<Output = ()>,
    ) -> Result<DeploymentReport, DeploymentFailure> {
        tracing::info!(
            "Deploying {} release {} from {}",
            self.config.app_name,
            request.release_tag(),
            request.artifact_url()
        );
        let progress = Progress::start();
        self.supervise(self.run_deploy(request, &progress), shutdown, &progress)
            .await
    }

    /// Restore the newest backup, or `backup` when given.
    pub async fn rollback(
        &self,
        backup: Option<&Path>,
    ) -> Result<DeploymentReport, DeploymentFailure> {
        self.rollback_until(backup, std::future::pending()).await
    }

    /// Restore a backup, aborting if `shutdown` completes first.
    pub async fn rollback_until(
        &self,
        backup: Option<&Path>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<DeploymentReport, DeploymentFailure> {
        let archive = match self.resolve_backup(backup) {
            Ok(archive) => archive,
            Err(e) => {
                log_failure(&e);
                return Err(e.into());
            }
        };
        tracing::info!(
            "Rolling back {} to {}",
            self.config.app_name,
            archive.path.display()
        );
        let progress = Progress::start();
        self.supervise(self.run_rollback(archive, &progress), shutdown, &progress)
            .await
    }

    fn resolve_backup(&self, backup: Option<&Path>) -> Result<BackupArchive, DeployError> {
        let app = &self.config.app_name;
        match backup {
            Some(path) => BackupArchive::at_path(path, app).map_err(|e| {
                InvalidRequestSnafu {
                    reason: format!("cannot use backup {}: {}", path.display(), e),
                }
                .build()
            }),
            None => self
                .backups
                .latest(app)
                .context(BackupsSnafu)?
                .ok_or_else(|| NoBackupSnafu { app: app.to_string() }.build()),
        }
    }

    /// Lock, run `pipeline` against `shutdown`, then log and release.
    ///
    /// `pipeline` is not polled until the lock is held. A failure carries the
    /// warnings `progress` held when it ended.
    async fn supervise(
        &self,
        pipeline: impl Future<Output = Result<DeploymentReport, DeployError>>,
        shutdown: impl Future<Output = ()>,
        progress: &watch::Sender<Progress>,
    ) -> Result<DeploymentReport, DeploymentFailure> {
        let started = Instant::now();

        let lock = match DeployLock::acquire(
            self.config.lock_dir(),
            &self.config.app_name,
            self.force_unlock,
        ) {
            Ok(lock) => lock,
            Err(e) => {
                log_failure(&e);
                return Err(e.into());
            }
        };

        let result = tokio::select! {
            result = pipeline => result,
            () = shutdown => {
                let stage = progress.borrow().stage;
                tracing::warn!("Shutdown requested during {}, aborting", stage);
                Err(DeployError::Cancelled { stage })
            }
        };

        let lock_result = lock.release();

        match result {
            Ok(mut report) => {
                if let Err(e) = lock_result {
                    let warning = Warning::lock_release(format!("failed to remove lock file: {e}"));
                    tracing::warn!("{}", warning.message);
                    report.warnings.push(warning);
                }
                report.duration_secs = started.elapsed().as_secs_f64();
                tracing::info!(
                    "Deployment of {} finished in {:.1}s with {} warning(s)",
                    report.app_name,
                    report.duration_secs,
                    report.warnings.len()
                );
                Ok(report)
            }
            Err(e) => {
                let mut warnings = progress.borrow().warnings.clone();
                if let Err(release_err) = lock_result {
                    let warning =
                        Warning::lock_release(format!("failed to remove lock file: {release_err}"));
                    tracing::warn!("{}", warning.message);
                    warnings.push(warning);
                }
                log_failure(&e);
                if e.touched_live_dir() {
                    self.log_rollback_hint();
                }
                Err(DeploymentFailure::new(e, warnings))
            }
        }
    }

    async fn run_deploy(
        &self,
        request: DeploymentRequest,
        progress: &watch::Sender<Progress>,
    ) -> Result<DeploymentReport, DeployError> {
        let app = &self.config.app_name;

        let deployment = Deployment::<Initialized>::new(request, app, &self.config.scratch_dir)?;
        tracing::debug!("Scratch workspace at {}", deployment.workspace_root().display());

        advance(progress, Stage::Fetching, &deployment);
        let deployment = deployment.fetch(&self.fetcher).await?;

        advance(progress, Stage::Validating, &deployment);
        let deployment = deployment.validate().await?;

        advance(progress, Stage::Extracting, &deployment);
        let deployment = deployment.extract().await?;

        advance(progress, Stage::BackingUp, &deployment);
        let deployment = deployment
            .back_up(&self.backups, &self.config.live_dir)
            .await;

        self.release(deployment, progress).await
    }

    async fn run_rollback(
        &self,
        archive: BackupArchive,
        progress: &watch::Sender<Progress>,
    ) -> Result<DeploymentReport, DeployError> {
        progress.send_modify(|p| p.stage = Stage::Extracting);
        let deployment = Deployment::<BackedUp>::restore(
            &archive,
            &self.config.app_name,
            &self.config.scratch_dir,
        )
        .await?;

        self.release(deployment, progress).await
    }

    /// Stop, install, start, and verify. Shared by deploy and rollback.
    async fn release(
        &self,
        deployment: Deployment<BackedUp>,
        progress: &watch::Sender<Progress>,
    ) -> Result<DeploymentReport, DeployError> {
        let target = SupervisorTarget::from_config(&self.config);

        advance(progress, Stage::Stopping, &deployment);
        let deployment = deployment.stop(&self.supervisors, &target).await;

        advance(progress, Stage::Installing, &deployment);
        let deployment = deployment
            .install(&self.installer, &self.config.live_dir)
            .await?;

        advance(progress, Stage::Starting, &deployment);
        let deployment = deployment.start(&self.supervisors, &target).await;

        advance(progress, Stage::HealthChecking, &deployment);
        let deployment = deployment.health_check(&self.health).await;

        advance(progress, Stage::Done, &deployment);
        Ok(deployment.finish())
    }

    fn log_rollback_hint(&self) {
        match self.backups.latest(&self.config.app_name) {
            Ok(Some(latest)) => tracing::error!(
                "Live directory may be inconsistent; restore with `stevedore rollback` (newest backup: {})",
                latest.path.display()
            ),
            Ok(None) => tracing::error!("Live directory may be inconsistent and no backup exists"),
            Err(e) => tracing::error!("Live directory may be inconsistent; failed to list backups: {}", e),
        }
    }
}

fn log_failure(error: &DeployError) {
    tracing::error!(stage = %error.stage(), "{}", error);
}
