// ABOUTME: Deploy lock to prevent concurrent deployments to the same application.
// ABOUTME: Uses atomic file creation with lock info stored as JSON in the lock directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::error::{DeployError, LockHeldSnafu, LockSnafu};
use crate::types::AppName;

/// Information about who holds a deploy lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
    /// Application being deployed.
    pub app: String,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn new(app: &AppName) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            app: app.to_string(),
        }
    }

    /// Check if this lock is stale (older than 1 hour).
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }

    /// Path to the lock file for an application.
    pub fn lock_path(lock_dir: &Path, app: &AppName) -> PathBuf {
        lock_dir.join(format!("{}.lock", app))
    }
}

/// A held deploy lock that releases on drop.
#[derive(Debug)]
pub struct DeployLock {
    path: PathBuf,
    released: bool,
}

impl DeployLock {
    /// Acquire the deploy lock for `app`.
    ///
    /// Uses `create_new` for atomic acquisition (no TOCTOU race).
    /// Returns an error if the lock is held by another process.
    /// Auto-breaks stale (>1 hour), unreadable, or corrupted locks with a
    /// warning; `force` breaks any lock.
    pub fn acquire(lock_dir: &Path, app: &AppName, force: bool) -> Result<Self, DeployError> {
        fs::create_dir_all(lock_dir).map_err(|e| {
            LockSnafu {
                message: format!("failed to create lock directory {}: {}", lock_dir.display(), e),
            }
            .build()
        })?;

        let path = LockInfo::lock_path(lock_dir, app);
        let info = LockInfo::new(app);

        match try_create(&path, &info) {
            Ok(()) => return Ok(Self::held(path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return LockSnafu {
                    message: format!("failed to create {}: {}", path.display(), e),
                }
                .fail();
            }
        }

        if !should_break(&path, app, force) {
            return Err(held_by_other(&path, app));
        }

        tracing::debug!("Removing stale/forced lock at {}", path.display());
        if let Err(e) = fs::remove_file(&path)
            && e.kind() != io::ErrorKind::NotFound
        {
            return LockSnafu {
                message: format!("failed to break lock {}: {}", path.display(), e),
            }
            .fail();
        }

        match try_create(&path, &info) {
            Ok(()) => Ok(Self::held(path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => LockSnafu {
                message: "lock acquired by another process during break",
            }
            .fail(),
            Err(e) => LockSnafu {
                message: format!("failed to create {}: {}", path.display(), e),
            }
            .fail(),
        }
    }

    fn held(path: PathBuf) -> Self {
        tracing::debug!("Acquired deploy lock {}", path.display());
        Self {
            path,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock, reporting a failure to remove the lock file.
    pub fn release(mut self) -> io::Result<()> {
        self.released = true;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for DeployLock {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = fs::remove_file(&self.path)
            && e.kind() != io::ErrorKind::NotFound
        {
            tracing::warn!("failed to remove deploy lock {}: {}", self.path.display(), e);
        }
    }
}

fn try_create(path: &Path, info: &LockInfo) -> io::Result<()> {
    let json = serde_json::to_string(info).map_err(io::Error::other)?;
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()
}

fn read_info(path: &Path) -> Option<LockInfo> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Check if an existing lock should be broken (stale, forced, or corrupted).
fn should_break(path: &Path, app: &AppName, force: bool) -> bool {
    let Some(existing) = read_info(path) else {
        tracing::warn!("Lock info for {} unreadable or corrupted, breaking lock", app);
        return true;
    };

    if force {
        tracing::warn!(
            "Breaking lock held by {} (pid {}) since {}",
            existing.holder,
            existing.pid,
            existing.started_at
        );
        true
    } else if existing.is_stale() {
        tracing::warn!(
            "Auto-breaking stale lock held by {} (pid {}) since {}",
            existing.holder,
            existing.pid,
            existing.started_at
        );
        true
    } else {
        false
    }
}

/// Error naming the current holder.
fn held_by_other(path: &Path, app: &AppName) -> DeployError {
    match read_info(path) {
        Some(existing) => LockHeldSnafu {
            app: app.to_string(),
            holder: existing.holder,
            pid: existing.pid,
            started_at: existing.started_at,
        }
        .build(),
        None => LockSnafu {
            message: "lock held by another process",
        }
        .build(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_info_creates_with_current_host_and_pid() {
        let app = AppName::new("test-app").unwrap();
        let info = LockInfo::new(&app);

        assert_eq!(info.app, "test-app");
        assert_eq!(info.pid, std::process::id());
        assert!(!info.holder.is_empty());
    }

    #[test]
    fn lock_path_is_named_after_app() {
        let app = AppName::new("myapp").unwrap();
        assert_eq!(
            LockInfo::lock_path(Path::new("/run/stevedore"), &app),
            PathBuf::from("/run/stevedore/myapp.lock")
        );
    }

    #[test]
    fn fresh_lock_is_not_stale() {
        let app = AppName::new("test").unwrap();
        let info = LockInfo::new(&app);
        assert!(!info.is_stale());
    }

    #[test]
    fn old_lock_is_stale() {
        let app = AppName::new("test").unwrap();
        let mut info = LockInfo::new(&app);
        // Set to 2 hours ago
        info.started_at = Utc::now() - chrono::Duration::hours(2);
        assert!(info.is_stale());
    }
}
