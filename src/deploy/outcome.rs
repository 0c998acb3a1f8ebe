// ABOUTME: Pipeline stages and the final result of a deployment run.
// ABOUTME: Reports are serializable so the CLI can emit them as JSON.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use super::DeploymentFailure;
use crate::archive::ArtifactMetadata;
use crate::backup::BackupArchive;
use crate::diagnostics::Warning;
use crate::health::HealthyEndpoint;

/// Pipeline position, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    Locking,
    Fetching,
    Validating,
    Extracting,
    BackingUp,
    Stopping,
    Installing,
    Starting,
    HealthChecking,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Locking => "locking",
            Stage::Fetching => "fetching",
            Stage::Validating => "validating",
            Stage::Extracting => "extracting",
            Stage::BackingUp => "backing_up",
            Stage::Stopping => "stopping",
            Stage::Installing => "installing",
            Stage::Starting => "starting",
            Stage::HealthChecking => "health_checking",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentReport {
    pub app_name: String,
    /// Release tag, or the backup file name for a rollback.
    pub release: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactMetadata>,
    /// Snapshot taken of the previous release.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupArchive>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restored_from: Option<PathBuf>,
    /// Supervisor that started the release.
    pub supervisor: Option<&'static str>,
    pub health: Option<HealthyEndpoint>,
    pub warnings: Vec<Warning>,
    pub duration_secs: f64,
}

/// Terminal state of a run.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeploymentOutcome {
    Success(DeploymentReport),
    Failed {
        stage: Stage,
        error: String,
        /// Warnings recorded before the run failed.
        warnings: Vec<Warning>,
        duration_secs: f64,
    },
}

impl DeploymentOutcome {
    pub fn from_result(
        result: Result<DeploymentReport, DeploymentFailure>,
        duration_secs: f64,
    ) -> Self {
        match result {
            Ok(report) => DeploymentOutcome::Success(report),
            Err(failure) => DeploymentOutcome::Failed {
                stage: failure.stage(),
                error: failure.error.to_string(),
                warnings: failure.warnings,
                duration_secs,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeploymentOutcome::Success(_))
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }
}
