// ABOUTME: Deployment error types with SNAFU pattern.
// ABOUTME: Wraps component errors and maps each to the pipeline stage it ends.

use chrono::{DateTime, Utc};
use snafu::Snafu;

use super::outcome::Stage;
use crate::archive::{ExtractError, ValidationError};
use crate::backup::BackupError;
use crate::diagnostics::Warning;
use crate::fetch::FetchError;
use crate::install::InstallError;

/// Fatal errors of a deployment or rollback run.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DeployError {
    #[snafu(display("invalid deployment request: {reason}"))]
    InvalidRequest { reason: String },

    #[snafu(display("failed to create scratch workspace: {source}"))]
    Workspace { source: std::io::Error },

    #[snafu(display(
        "deploy lock for {app} is held by {holder} (pid {pid}) since {started_at}"
    ))]
    LockHeld {
        app: String,
        holder: String,
        pid: u32,
        started_at: DateTime<Utc>,
    },

    #[snafu(display("deploy lock error: {message}"))]
    Lock { message: String },

    #[snafu(display("download failed: {source}"))]
    Fetch { source: FetchError },

    #[snafu(display("artifact rejected: {source}"))]
    Validation { source: ValidationError },

    #[snafu(display("extraction failed: {source}"))]
    Extraction { source: ExtractError },

    #[snafu(display("install failed: {source}"))]
    Install { source: InstallError },

    #[snafu(display("no backup available for {app}"))]
    NoBackup { app: String },

    #[snafu(display("failed to read backups: {source}"))]
    Backups { source: BackupError },

    #[snafu(display("{stage} task failed: {message}"))]
    Task { stage: Stage, message: String },

    #[snafu(display("deployment cancelled during {stage}"))]
    Cancelled { stage: Stage },
}

/// Details of the process holding a deploy lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockHolderInfo {
    pub holder: String,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    InvalidRequest,
    Workspace,
    LockHeld,
    Lock,
    /// Neither curl nor wget is installed.
    NoTransport,
    Download,
    DownloadTimeout,
    TooSmall,
    WrongType,
    Corrupt,
    ArtifactMissing,
    Extraction,
    AmbiguousRoot,
    InstallCopy,
    DependencyInstall,
    Build,
    Manifest,
    NoBackup,
    Internal,
    Cancelled,
}

impl DeployError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::InvalidRequest { .. } => DeployErrorKind::InvalidRequest,
            DeployError::Workspace { .. } => DeployErrorKind::Workspace,
            DeployError::LockHeld { .. } => DeployErrorKind::LockHeld,
            DeployError::Lock { .. } => DeployErrorKind::Lock,
            DeployError::Fetch { source } => match source {
                FetchError::NoTransport { .. } => DeployErrorKind::NoTransport,
                FetchError::TimedOut { .. } => DeployErrorKind::DownloadTimeout,
                FetchError::Failed { .. } | FetchError::MissingOutput { .. } => {
                    DeployErrorKind::Download
                }
            },
            DeployError::Validation { source } => match source {
                ValidationError::Missing(_) => DeployErrorKind::ArtifactMissing,
                ValidationError::TooSmall { .. } => DeployErrorKind::TooSmall,
                ValidationError::WrongType { .. } => DeployErrorKind::WrongType,
                ValidationError::Corrupt(_) | ValidationError::Io(_) => DeployErrorKind::Corrupt,
            },
            DeployError::Extraction { source } => match source {
                ExtractError::Failed { .. } => DeployErrorKind::Extraction,
                ExtractError::AmbiguousRoot(_) => DeployErrorKind::AmbiguousRoot,
            },
            DeployError::Install { source } => match source {
                InstallError::Copy { .. } => DeployErrorKind::InstallCopy,
                InstallError::DependencyInstall(_) => DeployErrorKind::DependencyInstall,
                InstallError::Build(_) => DeployErrorKind::Build,
                InstallError::Manifest(_) => DeployErrorKind::Manifest,
                InstallError::Migration(_) | InstallError::Task(_) => DeployErrorKind::Internal,
            },
            DeployError::NoBackup { .. } | DeployError::Backups { .. } => DeployErrorKind::NoBackup,
            DeployError::Task { .. } => DeployErrorKind::Internal,
            DeployError::Cancelled { .. } => DeployErrorKind::Cancelled,
        }
    }

    /// The stage this error terminated.
    pub fn stage(&self) -> Stage {
        match self {
            DeployError::InvalidRequest { .. }
            | DeployError::Workspace { .. }
            | DeployError::NoBackup { .. }
            | DeployError::Backups { .. } => Stage::Init,
            DeployError::LockHeld { .. } | DeployError::Lock { .. } => Stage::Locking,
            DeployError::Fetch { .. } => Stage::Fetching,
            DeployError::Validation { .. } => Stage::Validating,
            DeployError::Extraction { .. } => Stage::Extracting,
            DeployError::Install { .. } => Stage::Installing,
            DeployError::Task { stage, .. } | DeployError::Cancelled { stage } => *stage,
        }
    }

    /// Returns lock holder details if this is a lock contention error.
    pub fn lock_holder_info(&self) -> Option<LockHolderInfo> {
        match self {
            DeployError::LockHeld {
                holder,
                pid,
                started_at,
                ..
            } => Some(LockHolderInfo {
                holder: holder.clone(),
                pid: *pid,
                started_at: *started_at,
            }),
            _ => None,
        }
    }

    /// Whether the live directory may have been modified before the failure.
    pub fn touched_live_dir(&self) -> bool {
        self.stage() >= Stage::Installing
    }
}

/// A failed run, with the warnings recorded before the fatal error.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct DeploymentFailure {
    pub error: DeployError,
    pub warnings: Vec<Warning>,
}

impl DeploymentFailure {
    pub fn new(error: DeployError, warnings: Vec<Warning>) -> Self {
        Self { error, warnings }
    }

    pub fn kind(&self) -> DeployErrorKind {
        self.error.kind()
    }

    pub fn stage(&self) -> Stage {
        self.error.stage()
    }

    pub fn lock_holder_info(&self) -> Option<LockHolderInfo> {
        self.error.lock_holder_info()
    }

    pub fn touched_live_dir(&self) -> bool {
        self.error.touched_live_dir()
    }
}

impl From<DeployError> for DeploymentFailure {
    fn from(error: DeployError) -> Self {
        Self::new(error, Vec::new())
    }
}
