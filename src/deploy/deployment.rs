// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: Owns the scratch workspace, so dropping a deployment in any state removes it.

use std::path::{Path, PathBuf};

use crate::archive::ArtifactMetadata;
use crate::backup::BackupArchive;
use crate::diagnostics::{Diagnostics, Warning};
use crate::health::HealthyEndpoint;
use crate::types::AppName;
use crate::workspace::ScratchWorkspace;

/// A deployment in progress, parameterized by its current state.
///
/// Fields common to every state accumulate as the pipeline advances; the
/// state type `S` holds what only the next transition needs.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) app_name: AppName,
    pub(crate) release: String,
    pub(crate) workspace: ScratchWorkspace,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) artifact: Option<ArtifactMetadata>,
    pub(crate) backup: Option<BackupArchive>,
    pub(crate) restored_from: Option<PathBuf>,
    pub(crate) supervisor: Option<&'static str>,
    pub(crate) health: Option<HealthyEndpoint>,
    pub(crate) state: S,
}

impl<S> Deployment<S> {
    pub fn app_name(&self) -> &AppName {
        &self.app_name
    }

    /// Release tag, or the backup name for a rollback.
    pub fn release(&self) -> &str {
        &self.release
    }

    pub fn workspace_root(&self) -> &Path {
        self.workspace.root()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn artifact(&self) -> Option<&ArtifactMetadata> {
        self.artifact.as_ref()
    }

    /// Snapshot of the previous release taken by this run.
    pub fn backup(&self) -> Option<&BackupArchive> {
        self.backup.as_ref()
    }

    pub(crate) fn warn(&mut self, warning: Warning) {
        self.diagnostics.warn(warning);
    }

    /// Move to state `T`, carrying the common fields.
    pub(crate) fn transition<T>(self, state: T) -> Deployment<T> {
        Deployment {
            app_name: self.app_name,
            release: self.release,
            workspace: self.workspace,
            diagnostics: self.diagnostics,
            artifact: self.artifact,
            backup: self.backup,
            restored_from: self.restored_from,
            supervisor: self.supervisor,
            health: self.health,
            state,
        }
    }
}
