// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: Each state carries only the data the next transition needs.

use std::path::PathBuf;

/// Initial state: scratch workspace created, nothing downloaded.
/// Available actions: `fetch()`
#[derive(Debug, Clone)]
pub struct Initialized {
    pub(crate) artifact_url: String,
}

/// Artifact downloaded into the workspace.
/// Available actions: `validate()`
#[derive(Debug, Clone)]
pub struct Fetched {
    pub(crate) archive: PathBuf,
}

/// Artifact passed size, type, and integrity checks.
/// Available actions: `extract()`
#[derive(Debug, Clone)]
pub struct Validated {
    pub(crate) archive: PathBuf,
}

/// Release unpacked and its content root resolved.
/// Available actions: `back_up()`, `without_backup()`
#[derive(Debug, Clone)]
pub struct Extracted {
    pub(crate) content_root: PathBuf,
}

/// Previous release snapshotted (or skipped).
/// Available actions: `stop()`
#[derive(Debug, Clone)]
pub struct BackedUp {
    pub(crate) content_root: PathBuf,
}

/// Running application stopped (or was not managed).
/// Available actions: `install()`
#[derive(Debug, Clone)]
pub struct Stopped {
    pub(crate) content_root: PathBuf,
}

/// Live directory replaced and release steps run.
/// Available actions: `start()`
#[derive(Debug, Clone)]
pub struct Installed {
    pub(crate) entrypoint_hint: Option<String>,
}

/// Start handed to the supervisor.
/// Available actions: `health_check()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Started;

/// Completed: health probed, ready to report.
/// Available actions: `finish()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Completed;
