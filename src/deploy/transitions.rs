// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state; fatal stages return Result.

use snafu::ResultExt;
use std::path::Path;

use super::Deployment;
use super::error::{
    DeployError, ExtractionSnafu, FetchSnafu, InstallSnafu, TaskSnafu, ValidationSnafu,
    WorkspaceSnafu,
};
use super::outcome::{DeploymentReport, Stage};
use super::request::DeploymentRequest;
use super::state::{
    BackedUp, Completed, Extracted, Fetched, Initialized, Installed, Started, Stopped, Validated,
};
use crate::archive;
use crate::backup::{BackupArchive, BackupManager};
use crate::diagnostics::{Diagnostics, Warning};
use crate::fetch::Fetcher;
use crate::health::HealthVerifier;
use crate::install::Installer;
use crate::supervisor::{SupervisorBridge, SupervisorTarget};
use crate::types::AppName;
use crate::workspace::ScratchWorkspace;

/// Run blocking filesystem work off the async runtime.
async fn blocking<T, F>(stage: Stage, work: F) -> Result<T, DeployError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| {
            TaskSnafu {
                stage,
                message: e.to_string(),
            }
            .build()
        })
}

fn new_deployment(
    app_name: &AppName,
    release: String,
    scratch_dir: &Path,
) -> Result<Deployment<()>, DeployError> {
    let workspace = ScratchWorkspace::create(scratch_dir, app_name).context(WorkspaceSnafu)?;
    Ok(Deployment {
        app_name: app_name.clone(),
        release,
        workspace,
        diagnostics: Diagnostics::default(),
        artifact: None,
        backup: None,
        restored_from: None,
        supervisor: None,
        health: None,
        state: (),
    })
}

// =============================================================================
// Entry points
// =============================================================================

impl Deployment<Initialized> {
    /// Create the scratch workspace for a new release.
    pub fn new(
        request: DeploymentRequest,
        app_name: &AppName,
        scratch_dir: &Path,
    ) -> Result<Self, DeployError> {
        let deployment = new_deployment(app_name, request.release_tag().to_string(), scratch_dir)?;
        Ok(deployment.transition(Initialized {
            artifact_url: request.artifact_url().to_string(),
        }))
    }
}

impl Deployment<BackedUp> {
    /// Unpack a backup archive as the release to install. No new backup is taken.
    ///
    /// Backups are rooted at the live directory, so the content root is the
    /// extraction directory itself.
    pub async fn restore(
        backup: &BackupArchive,
        app_name: &AppName,
        scratch_dir: &Path,
    ) -> Result<Self, DeployError> {
        let release = backup
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| backup.path.display().to_string());

        let mut deployment = new_deployment(app_name, release, scratch_dir)?;
        deployment.restored_from = Some(backup.path.clone());

        let backup_path = backup.path.clone();
        let destination = deployment.workspace.extract_dir();
        let content_root = destination.clone();

        tracing::info!("Restoring backup {}", backup_path.display());
        blocking(Stage::Extracting, move || archive::unpack(&backup_path, &destination))
            .await?
            .context(ExtractionSnafu)?;

        Ok(deployment.transition(BackedUp { content_root }))
    }
}

// =============================================================================
// Initialized -> Fetched -> Validated -> Extracted
// =============================================================================

impl Deployment<Initialized> {
    /// Download the artifact into the workspace.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Fetch` when no transport is available, the
    /// transport fails, or the download times out.
    #[must_use = "deployment state must be used"]
    pub async fn fetch(self, fetcher: &Fetcher) -> Result<Deployment<Fetched>, DeployError> {
        let destination = self.workspace.archive_path();
        let archive = fetcher
            .fetch(&self.state.artifact_url, &destination)
            .await
            .context(FetchSnafu)?;
        Ok(self.transition(Fetched { archive }))
    }
}

impl Deployment<Fetched> {
    /// Check size, gzip signature, and stream integrity.
    #[must_use = "deployment state must be used"]
    pub async fn validate(mut self) -> Result<Deployment<Validated>, DeployError> {
        let artifact_path = self.state.archive.clone();
        let metadata = blocking(Stage::Validating, move || archive::validate(&artifact_path))
            .await?
            .context(ValidationSnafu)?;

        tracing::info!(
            "Artifact valid: {} bytes, {}",
            metadata.size_bytes,
            metadata.detected_type
        );
        self.artifact = Some(metadata);
        let archive = self.state.archive.clone();
        Ok(self.transition(Validated { archive }))
    }
}

impl Deployment<Validated> {
    /// Unpack into the workspace and resolve the content root.
    #[must_use = "deployment state must be used"]
    pub async fn extract(self) -> Result<Deployment<Extracted>, DeployError> {
        let artifact_path = self.state.archive.clone();
        let destination = self.workspace.extract_dir();
        let content_root = blocking(Stage::Extracting, move || {
            archive::extract(&artifact_path, &destination)
        })
        .await?
        .context(ExtractionSnafu)?;

        Ok(self.transition(Extracted { content_root }))
    }
}

// =============================================================================
// Extracted -> BackedUp -> Stopped
// =============================================================================

impl Deployment<Extracted> {
    /// Snapshot the live directory, then rotate old snapshots. Failures are warnings.
    pub async fn back_up(mut self, backups: &BackupManager, live_dir: &Path) -> Deployment<BackedUp> {
        let manager = backups.clone();
        let live = live_dir.to_path_buf();
        let app = self.app_name.clone();

        let snapshot = {
            let manager = manager.clone();
            let app = app.clone();
            blocking(Stage::BackingUp, move || manager.snapshot(&live, &app)).await
        };
        match snapshot {
            Ok(Ok(backup)) => self.backup = backup,
            Ok(Err(e)) => self.warn(Warning::backup(format!("backup failed: {e}"))),
            Err(e) => self.warn(Warning::backup(e.to_string())),
        }

        // The new archive is kept even when older ones cannot be removed.
        if self.backup.is_some() {
            match blocking(Stage::BackingUp, move || manager.prune(&app)).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => self.warn(Warning::backup_rotation(format!(
                    "backup written but old backups were not pruned: {e}"
                ))),
                Err(e) => self.warn(Warning::backup_rotation(e.to_string())),
            }
        }

        let content_root = self.state.content_root.clone();
        self.transition(BackedUp { content_root })
    }

    /// Proceed without taking a backup.
    pub fn without_backup(self) -> Deployment<BackedUp> {
        let content_root = self.state.content_root.clone();
        self.transition(BackedUp { content_root })
    }
}

impl Deployment<BackedUp> {
    /// Stop the running application. Failure is a warning.
    pub async fn stop(
        mut self,
        supervisors: &SupervisorBridge,
        target: &SupervisorTarget,
    ) -> Deployment<Stopped> {
        match supervisors.stop(target).await {
            Ok(Some(name)) => tracing::info!("Stopped {} via {}", target.app_name, name),
            Ok(None) => tracing::info!("No supervisor manages {}, nothing to stop", target.app_name),
            Err(e) => self.warn(Warning::supervisor_stop(format!("stop failed: {e}"))),
        }

        let content_root = self.state.content_root.clone();
        self.transition(Stopped { content_root })
    }
}

// =============================================================================
// Stopped -> Installed
// =============================================================================

impl Deployment<Stopped> {
    /// Replace the live directory and run release steps.
    ///
    /// # Errors
    ///
    /// Copy, dependency install, and build failures are fatal. A failed
    /// migration is recorded as a warning.
    #[must_use = "deployment state must be used"]
    pub async fn install(
        mut self,
        installer: &Installer,
        live_dir: &Path,
    ) -> Result<Deployment<Installed>, DeployError> {
        installer
            .install_files(&self.state.content_root, live_dir)
            .await
            .context(InstallSnafu)?;

        let steps = installer
            .run_release_steps(live_dir)
            .await
            .context(InstallSnafu)?;

        if let Some(e) = steps.migration_error {
            self.warn(Warning::migration(e.to_string()));
        }

        Ok(self.transition(Installed {
            entrypoint_hint: steps.entrypoint_hint,
        }))
    }
}

// =============================================================================
// Installed -> Started -> Completed
// =============================================================================

impl Deployment<Installed> {
    /// `main` from the installed package manifest, if any.
    pub fn entrypoint_hint(&self) -> Option<&str> {
        self.state.entrypoint_hint.as_deref()
    }

    /// Start or restart through the first matching supervisor. Failure is a warning.
    pub async fn start(
        mut self,
        supervisors: &SupervisorBridge,
        target: &SupervisorTarget,
    ) -> Deployment<Started> {
        match supervisors.start_or_restart(target).await {
            Ok(Some(name)) => self.supervisor = Some(name),
            Ok(None) => {
                let warning =
                    Warning::manual_start_required(&target.app_name, self.state.entrypoint_hint.as_deref());
                self.warn(warning);
            }
            Err(e) => self.warn(Warning::supervisor_start(format!("start failed: {e}"))),
        }
        self.transition(Started)
    }
}

impl Deployment<Started> {
    /// Probe local endpoints. An unconfirmed result is a warning.
    pub async fn health_check(mut self, verifier: &HealthVerifier) -> Deployment<Completed> {
        match verifier.verify().await {
            Some(endpoint) => self.health = Some(endpoint),
            None => self.warn(Warning::health_unconfirmed(
                "no health endpoint responded; check the application manually",
            )),
        }
        self.transition(Completed)
    }
}

impl Deployment<Completed> {
    /// Remove the workspace and produce the report.
    pub fn finish(self) -> DeploymentReport {
        let Deployment {
            app_name,
            release,
            workspace,
            mut diagnostics,
            artifact,
            backup,
            restored_from,
            supervisor,
            health,
            state: Completed,
        } = self;

        if let Err(e) = workspace.close() {
            diagnostics.warn(Warning::workspace_cleanup(format!(
                "failed to remove scratch workspace: {e}"
            )));
        }

        DeploymentReport {
            app_name: app_name.to_string(),
            release,
            artifact,
            backup,
            restored_from,
            supervisor,
            health,
            warnings: diagnostics.into_warnings(),
            duration_secs: 0.0,
        }
    }
}
