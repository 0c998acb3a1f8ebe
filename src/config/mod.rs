// ABOUTME: Configuration types and parsing for stevedore.yml.
// ABOUTME: Handles YAML parsing, defaults, validation, and config discovery.

mod commands;
mod deserialize;
mod health;
mod init;
mod install;

pub use commands::{CommandsConfig, FetchConfig};
pub use health::HealthConfig;
pub use init::init_config;
pub use install::{BackupConfig, InstallConfig, InstallStrategy, SupervisorConfig};

use crate::error::{Error, Result};
use crate::types::AppName;
use deserialize::deserialize_app_name;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "stevedore.yml";
pub const CONFIG_FILENAME_ALT: &str = "stevedore.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".stevedore/config.yml";

/// Default number of backup archives kept per application.
pub const DEFAULT_RETAINED_BACKUPS: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_app_name")]
    pub app_name: AppName,

    pub live_dir: PathBuf,

    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Where deploy lock files live; falls back to `scratch_dir`.
    #[serde(default)]
    pub lock_dir: Option<PathBuf>,

    #[serde(default = "default_retained_backups")]
    pub retained_backups: usize,

    #[serde(default)]
    pub log_file: Option<PathBuf>,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub commands: CommandsConfig,

    #[serde(default)]
    pub install: InstallConfig,

    #[serde(default)]
    pub backup: BackupConfig,

    #[serde(default)]
    pub supervisor: SupervisorConfig,
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("/var/backups/stevedore")
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_retained_backups() -> usize {
    DEFAULT_RETAINED_BACKUPS
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Check cross-field invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.retained_backups == 0 {
            return Err(Error::InvalidConfig(
                "retained_backups must be at least 1".to_string(),
            ));
        }

        if self.live_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("live_dir cannot be empty".to_string()));
        }

        if self.live_dir == self.backup_dir || self.backup_dir.starts_with(&self.live_dir) {
            return Err(Error::InvalidConfig(
                "backup_dir must live outside live_dir".to_string(),
            ));
        }

        if self.scratch_dir.starts_with(&self.live_dir) {
            return Err(Error::InvalidConfig(
                "scratch_dir must live outside live_dir".to_string(),
            ));
        }

        Ok(())
    }

    /// Directory holding deploy lock files.
    pub fn lock_dir(&self) -> &Path {
        self.lock_dir.as_deref().unwrap_or(&self.scratch_dir)
    }

    /// Systemd unit managing the application.
    pub fn unit_name(&self) -> String {
        self.supervisor
            .unit
            .clone()
            .unwrap_or_else(|| self.app_name.unit_name())
    }

    pub fn template() -> Self {
        Config {
            app_name: AppName::new("my-app").expect("template app name is valid"),
            live_dir: PathBuf::from("/srv/my-app"),
            backup_dir: default_backup_dir(),
            scratch_dir: default_scratch_dir(),
            lock_dir: None,
            retained_backups: DEFAULT_RETAINED_BACKUPS,
            log_file: None,
            fetch: FetchConfig::default(),
            health: HealthConfig::default(),
            commands: CommandsConfig::default(),
            install: InstallConfig::default(),
            backup: BackupConfig::default(),
            supervisor: SupervisorConfig::default(),
        }
    }
}
