// ABOUTME: Diagnostics accumulator for non-fatal warnings during deployment.
// ABOUTME: Collects warnings that shouldn't fail a deployment but should be shown to users.

use serde::Serialize;

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether a warning of `kind` was recorded.
    pub fn contains(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a lock release warning.
    pub fn lock_release(message: impl Into<String>) -> Self {
        Self::new(WarningKind::LockRelease, message)
    }

    pub fn backup(message: impl Into<String>) -> Self {
        Self::new(WarningKind::Backup, message)
    }

    pub fn backup_rotation(message: impl Into<String>) -> Self {
        Self::new(WarningKind::BackupRotation, message)
    }

    pub fn supervisor_stop(message: impl Into<String>) -> Self {
        Self::new(WarningKind::SupervisorStop, message)
    }

    pub fn migration(message: impl Into<String>) -> Self {
        Self::new(WarningKind::Migration, message)
    }

    pub fn supervisor_start(message: impl Into<String>) -> Self {
        Self::new(WarningKind::SupervisorStart, message)
    }

    pub fn manual_start_required(app: &str, entrypoint: Option<&str>) -> Self {
        let message = match entrypoint {
            Some(entrypoint) => format!(
                "no supervisor manages {app}; manual start required (package main: {entrypoint})"
            ),
            None => format!("no supervisor manages {app}; manual start required"),
        };
        Self::new(WarningKind::ManualStartRequired, message)
    }

    pub fn health_unconfirmed(message: impl Into<String>) -> Self {
        Self::new(WarningKind::HealthUnconfirmed, message)
    }

    pub fn workspace_cleanup(message: impl Into<String>) -> Self {
        Self::new(WarningKind::WorkspaceCleanup, message)
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Snapshot of the previous release could not be written.
    Backup,
    /// A backup was written but older ones could not be pruned.
    BackupRotation,
    /// The running application could not be stopped.
    SupervisorStop,
    /// Migration script failed.
    Migration,
    /// The supervisor failed to start the new release.
    SupervisorStart,
    /// No supervisor manages the application.
    ManualStartRequired,
    /// No health endpoint answered after restart.
    HealthUnconfirmed,
    /// Scratch workspace could not be removed.
    WorkspaceCleanup,
    /// Failed to release deploy lock (lock file may remain).
    LockRelease,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::backup("disk full"));
        diag.warn(Warning::manual_start_required("blog", None));

        assert!(diag.has_warnings());
        assert_eq!(diag.warnings().len(), 2);
        assert!(diag.contains(WarningKind::ManualStartRequired));
        assert!(!diag.contains(WarningKind::Migration));
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        assert_eq!(Warning::lock_release("x").kind, WarningKind::LockRelease);
        assert_eq!(Warning::backup_rotation("x").kind, WarningKind::BackupRotation);
        assert_eq!(Warning::supervisor_stop("x").kind, WarningKind::SupervisorStop);
        assert_eq!(Warning::migration("x").kind, WarningKind::Migration);
        assert_eq!(Warning::supervisor_start("x").kind, WarningKind::SupervisorStart);
        assert_eq!(Warning::health_unconfirmed("x").kind, WarningKind::HealthUnconfirmed);
    }

    #[test]
    fn warning_kinds_serialize_snake_case() {
        let json = serde_json::to_string(&Warning::manual_start_required("blog", None)).unwrap();
        assert!(json.contains("\"manual_start_required\""));
    }
}
