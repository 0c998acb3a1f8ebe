// ABOUTME: Subordinate command configuration for release steps.
// ABOUTME: Dependency install, build, and migrate command lines with a shared timeout.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct CommandsConfig {
    #[serde(default = "default_install")]
    pub install: String,

    #[serde(default = "default_build")]
    pub build: String,

    #[serde(default = "default_migrate")]
    pub migrate: String,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_install() -> String {
    "npm ci --omit=dev".to_string()
}

fn default_build() -> String {
    "npm run build".to_string()
}

fn default_migrate() -> String {
    "npm run migrate".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(600)
}

impl Default for CommandsConfig {
    fn default() -> Self {
        CommandsConfig {
            install: default_install(),
            build: default_build(),
            migrate: default_migrate(),
            timeout: default_timeout(),
        }
    }
}

/// Artifact download settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(300)
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout: default_fetch_timeout(),
        }
    }
}
