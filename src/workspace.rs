// ABOUTME: Disposable per-run scratch directory for downloads and extraction.
// ABOUTME: The directory tree is removed when the workspace is dropped, on every exit path.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::types::AppName;

const ARCHIVE_FILENAME: &str = "artifact.tar.gz";
const EXTRACT_DIRNAME: &str = "extracted";

/// Scratch space owned by exactly one deployment run.
#[derive(Debug)]
pub struct ScratchWorkspace {
    dir: TempDir,
}

impl ScratchWorkspace {
    /// Create a uniquely-named workspace under `scratch_dir`.
    pub fn create(scratch_dir: &Path, app: &AppName) -> io::Result<Self> {
        std::fs::create_dir_all(scratch_dir)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("stevedore-{}-", app))
            .tempdir_in(scratch_dir)?;
        tracing::debug!("Created scratch workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Where the transport writes the downloaded artifact.
    pub fn archive_path(&self) -> PathBuf {
        self.dir.path().join(ARCHIVE_FILENAME)
    }

    /// Fresh directory the archive is unpacked into.
    pub fn extract_dir(&self) -> PathBuf {
        self.dir.path().join(EXTRACT_DIRNAME)
    }

    /// Remove the workspace now, reporting failures instead of ignoring them.
    pub fn close(self) -> io::Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!("Removed scratch workspace {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_is_removed_on_drop() {
        let scratch = tempfile::tempdir().unwrap();
        let app = AppName::new("demo").unwrap();

        let root = {
            let workspace = ScratchWorkspace::create(scratch.path(), &app).unwrap();
            std::fs::write(workspace.archive_path(), b"data").unwrap();
            workspace.root().to_path_buf()
        };

        assert!(!root.exists());
    }

    #[test]
    fn workspaces_are_disjoint() {
        let scratch = tempfile::tempdir().unwrap();
        let app = AppName::new("demo").unwrap();

        let a = ScratchWorkspace::create(scratch.path(), &app).unwrap();
        let b = ScratchWorkspace::create(scratch.path(), &app).unwrap();

        assert_ne!(a.root(), b.root());
        assert!(a.root().starts_with(scratch.path()));
    }

    #[test]
    fn close_removes_directory() {
        let scratch = tempfile::tempdir().unwrap();
        let app = AppName::new("demo").unwrap();
        let workspace = ScratchWorkspace::create(scratch.path(), &app).unwrap();
        let root = workspace.root().to_path_buf();

        workspace.close().unwrap();
        assert!(!root.exists());
    }
}
