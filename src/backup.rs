// ABOUTME: Rotated tar.gz snapshots of the live deployment directory.
// ABOUTME: One archive per deploy, pruned to the newest N per application.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::types::{AppName, ExcludePattern, is_excluded};

/// Fixed-width so that file-name order is creation order.
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";
const PARSE_FORMAT: &str = "%Y%m%dT%H%M%S%.fZ";
const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// A retained snapshot of a previous deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupArchive {
    pub app_name: String,
    pub timestamp: DateTime<Utc>,
    pub path: PathBuf,
}

impl BackupArchive {
    /// Describe an explicitly chosen archive file.
    pub fn at_path(path: &Path, app: &AppName) -> io::Result<Self> {
        let meta = fs::metadata(path)?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            ));
        }

        let timestamp = path
            .file_name()
            .and_then(|name| parse_archive_name(&name.to_string_lossy(), app))
            .or_else(|| meta.modified().ok().map(DateTime::<Utc>::from))
            .unwrap_or_else(Utc::now);

        Ok(Self {
            app_name: app.to_string(),
            timestamp,
            path: path.to_path_buf(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BackupError {
    fn io(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> BackupError {
        let path = path.to_path_buf();
        move |source| BackupError::Io {
            action,
            path,
            source,
        }
    }
}

/// Creates, lists, and prunes backups under one directory.
#[derive(Debug, Clone)]
pub struct BackupManager {
    backup_dir: PathBuf,
    retained: usize,
    exclude: Vec<ExcludePattern>,
}

impl BackupManager {
    pub fn new(backup_dir: impl Into<PathBuf>, retained: usize, exclude: Vec<ExcludePattern>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            retained: retained.max(1),
            exclude,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.backup_dir.clone(),
            config.retained_backups,
            config.backup.exclude.clone(),
        )
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Snapshot `live_dir`. Returns `None` when there is nothing to back up.
    ///
    /// Rotation is left to [`BackupManager::prune`], so a finished archive is
    /// never lost to a failure while removing older ones.
    pub fn snapshot(&self, live_dir: &Path, app: &AppName) -> Result<Option<BackupArchive>, BackupError> {
        if is_empty_dir(live_dir).map_err(BackupError::io("read", live_dir))? {
            tracing::info!("No existing deployment in {}, skipping backup", live_dir.display());
            return Ok(None);
        }

        fs::create_dir_all(&self.backup_dir)
            .map_err(BackupError::io("create backup directory", &self.backup_dir))?;

        let (timestamp, path) = self.next_archive_path(app);
        let partial = path.with_extension("partial");

        if let Err(e) = self.write_archive(live_dir, &partial) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        fs::rename(&partial, &path).map_err(BackupError::io("finalize", &path))?;

        let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        tracing::info!("Backup created: {} ({} bytes)", path.display(), size);

        Ok(Some(BackupArchive {
            app_name: app.to_string(),
            timestamp,
            path,
        }))
    }

    /// Delete all but the newest `retained` backups for `app`. Returns removed paths.
    pub fn prune(&self, app: &AppName) -> Result<Vec<PathBuf>, BackupError> {
        let backups = self.list(app)?;
        let mut removed = Vec::new();
        for stale in backups.into_iter().skip(self.retained) {
            fs::remove_file(&stale.path).map_err(BackupError::io("remove", &stale.path))?;
            tracing::debug!("Removed old backup {}", stale.path.display());
            removed.push(stale.path);
        }
        if !removed.is_empty() {
            tracing::info!("Pruned {} old backup(s)", removed.len());
        }
        Ok(removed)
    }

    /// Backups for `app`, newest first.
    pub fn list(&self, app: &AppName) -> Result<Vec<BackupArchive>, BackupError> {
        let entries = match fs::read_dir(&self.backup_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BackupError::io("read", &self.backup_dir)(e)),
        };

        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry.map_err(BackupError::io("read", &self.backup_dir))?;
            let name = entry.file_name();
            if let Some(timestamp) = parse_archive_name(&name.to_string_lossy(), app) {
                backups.push(BackupArchive {
                    app_name: app.to_string(),
                    timestamp,
                    path: entry.path(),
                });
            }
        }

        backups.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(backups)
    }

    /// The most recent backup for `app`, if any.
    pub fn latest(&self, app: &AppName) -> Result<Option<BackupArchive>, BackupError> {
        Ok(self.list(app)?.into_iter().next())
    }

    fn next_archive_path(&self, app: &AppName) -> (DateTime<Utc>, PathBuf) {
        loop {
            let now = Utc::now().trunc_subsecs(6);
            let path = self.backup_dir.join(archive_name(app, now));
            if !path.exists() {
                return (now, path);
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }

    fn write_archive(&self, live_dir: &Path, target: &Path) -> Result<(), BackupError> {
        let file = File::create(target).map_err(BackupError::io("create", target))?;
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        builder.follow_symlinks(false);

        // Excluded names are skipped at any depth, along with everything below them.
        let walker = WalkDir::new(live_dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_excluded(&self.exclude, &e.file_name().to_string_lossy()));

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| live_dir.to_path_buf());
                BackupError::io("read", &path)(e.into())
            })?;
            let path = entry.path();
            let archive_path = path
                .strip_prefix(live_dir)
                .map_err(|e| BackupError::io("archive", path)(io::Error::other(e)))?;
            builder
                .append_path_with_name(path, archive_path)
                .map_err(BackupError::io("archive", path))?;
        }

        let encoder = builder
            .into_inner()
            .map_err(BackupError::io("write", target))?;
        encoder.finish().map_err(BackupError::io("write", target))?;
        Ok(())
    }
}

fn archive_name(app: &AppName, timestamp: DateTime<Utc>) -> String {
    format!("{}_{}{}", app, timestamp.format(TIMESTAMP_FORMAT), ARCHIVE_SUFFIX)
}

fn parse_archive_name(name: &str, app: &AppName) -> Option<DateTime<Utc>> {
    let stamp = name
        .strip_prefix(app.as_str())?
        .strip_prefix('_')?
        .strip_suffix(ARCHIVE_SUFFIX)?;
    NaiveDateTime::parse_from_str(stamp, PARSE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn is_empty_dir(dir: &Path) -> io::Result<bool> {
    match fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e),
    }
}
