// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stevedore::output::OutputMode;

#[derive(Parser)]
#[command(name = "stevedore")]
#[command(about = "Webhook-triggered release deployment for a single host")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file (default: discovered in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, value_enum, global = true, default_value_t = OutputMode::Normal)]
    pub output: OutputMode,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new stevedore.yml configuration file
    Init {
        /// Application name
        #[arg(short, long)]
        app: Option<String>,

        /// Directory the application is served from
        #[arg(short, long)]
        live_dir: Option<PathBuf>,

        /// Overwrite existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Download, validate, and install a release
    Deploy {
        /// URL of the release archive (.tar.gz)
        artifact_url: String,

        /// Release tag, used in logs
        release_tag: String,

        /// Break an existing deploy lock
        #[arg(long)]
        force_unlock: bool,
    },

    /// Restore a previous release from backup
    Rollback {
        /// Backup archive to restore (default: the newest)
        #[arg(short, long)]
        backup: Option<PathBuf>,

        /// Break an existing deploy lock
        #[arg(long)]
        force_unlock: bool,
    },

    /// List retained backups, newest first
    Backups,
}
