// ABOUTME: Release installation into the live directory.
// ABOUTME: Copies release files, then runs dependency install, build, and migration.

mod manifest;
mod mirror;

pub use manifest::{MANIFEST_FILE, PackageManifest};
pub use mirror::{clear_and_copy, mirror};

use std::path::{Path, PathBuf};

use crate::config::{CommandsConfig, Config, InstallStrategy};
use crate::process;
use crate::types::ExcludePattern;

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("failed to copy {}: {source}", .path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dependency install failed: {0}")]
    DependencyInstall(String),

    #[error("build failed: {0}")]
    Build(String),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("invalid package manifest: {0}")]
    Manifest(String),

    #[error("install task failed: {0}")]
    Task(String),
}

/// What ran after the files were copied.
#[derive(Debug, Default)]
pub struct ReleaseSteps {
    pub installed_dependencies: bool,
    pub built: bool,
    pub migrated: bool,
    /// A failed migration does not fail the release.
    pub migration_error: Option<InstallError>,
    /// `main` from the manifest, used when registering the app with pm2.
    pub entrypoint_hint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Installer {
    strategy: InstallStrategy,
    exclude: Vec<ExcludePattern>,
    commands: CommandsConfig,
}

impl Installer {
    pub fn new(
        strategy: InstallStrategy,
        exclude: Vec<ExcludePattern>,
        commands: CommandsConfig,
    ) -> Self {
        Self {
            strategy,
            exclude,
            commands,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.install.strategy,
            config.install.exclude.clone(),
            config.commands.clone(),
        )
    }

    /// Replace the live directory's contents with `content_root`.
    pub async fn install_files(&self, content_root: &Path, live_dir: &Path) -> Result<(), InstallError> {
        let source = content_root.to_path_buf();
        let live = live_dir.to_path_buf();
        let exclude = self.exclude.clone();
        let strategy = self.strategy;

        tracing::info!(
            "Installing files into {} ({:?} strategy)",
            live.display(),
            strategy
        );

        tokio::task::spawn_blocking(move || match strategy {
            InstallStrategy::Mirror => mirror(&source, &live, &exclude),
            InstallStrategy::Clear => clear_and_copy(&source, &live, &exclude),
        })
        .await
        .map_err(|e| InstallError::Task(e.to_string()))?
    }

    /// Run dependency install, build, and migrate as the manifest calls for.
    pub async fn run_release_steps(&self, live_dir: &Path) -> Result<ReleaseSteps, InstallError> {
        let Some(manifest) = PackageManifest::load(live_dir)? else {
            tracing::info!("No {} found, skipping release steps", MANIFEST_FILE);
            return Ok(ReleaseSteps::default());
        };

        let mut steps = ReleaseSteps {
            entrypoint_hint: manifest.main.clone(),
            ..ReleaseSteps::default()
        };

        self.run_step("install", &self.commands.install, live_dir)
            .await
            .map_err(InstallError::DependencyInstall)?;
        steps.installed_dependencies = true;

        if manifest.has_script("build") {
            self.run_step("build", &self.commands.build, live_dir)
                .await
                .map_err(InstallError::Build)?;
            steps.built = true;
        }

        if manifest.has_script("migrate") {
            match self.run_step("migrate", &self.commands.migrate, live_dir).await {
                Ok(()) => steps.migrated = true,
                Err(detail) => steps.migration_error = Some(InstallError::Migration(detail)),
            }
        }

        Ok(steps)
    }

    async fn run_step(&self, label: &str, command_line: &str, dir: &Path) -> Result<(), String> {
        tracing::info!("Running {}: {}", label, command_line);
        let output = process::run_streaming(
            process::shell(command_line, dir),
            label,
            self.commands.timeout,
        )
        .await
        .map_err(|e| e.to_string())?;

        if output.success {
            Ok(())
        } else {
            Err(output.describe_failure())
        }
    }
}
