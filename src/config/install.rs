// ABOUTME: Install strategy, backup, and supervisor settings.
// ABOUTME: Exclude lists protect per-environment state across redeploys.

use serde::Deserialize;
use std::time::Duration;

use crate::types::ExcludePattern;

/// How release files replace the live directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallStrategy {
    /// Sync onto the live directory, deleting stale entries but keeping excluded ones.
    #[default]
    Mirror,
    /// Empty the live directory completely, then copy.
    Clear,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallConfig {
    #[serde(default)]
    pub strategy: InstallStrategy,

    #[serde(default = "default_install_exclude")]
    pub exclude: Vec<ExcludePattern>,
}

fn default_install_exclude() -> Vec<ExcludePattern> {
    ["node_modules", ".env", "logs", "*.log"]
        .into_iter()
        .filter_map(|p| ExcludePattern::parse(p).ok())
        .collect()
}

impl Default for InstallConfig {
    fn default() -> Self {
        InstallConfig {
            strategy: InstallStrategy::default(),
            exclude: default_install_exclude(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackupConfig {
    #[serde(default = "default_backup_exclude")]
    pub exclude: Vec<ExcludePattern>,
}

fn default_backup_exclude() -> Vec<ExcludePattern> {
    ["node_modules", ".git"]
        .into_iter()
        .filter_map(|p| ExcludePattern::parse(p).ok())
        .collect()
}

impl Default for BackupConfig {
    fn default() -> Self {
        BackupConfig {
            exclude: default_backup_exclude(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorConfig {
    /// Script handed to pm2 when the app is not yet registered with it.
    #[serde(default)]
    pub entrypoint: Option<String>,

    /// Overrides the `<app>.service` unit name.
    #[serde(default)]
    pub unit: Option<String>,

    #[serde(default = "default_supervisor_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_supervisor_timeout() -> Duration {
    Duration::from_secs(120)
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        SupervisorConfig {
            entrypoint: None,
            unit: None,
            timeout: default_supervisor_timeout(),
        }
    }
}
