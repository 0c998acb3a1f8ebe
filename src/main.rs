// ABOUTME: Entry point for the stevedore CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use std::path::Path;
use stevedore::config::{self, Config};
use stevedore::error::Result;
use stevedore::logging;
use stevedore::output::Output;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = Output::new(cli.output);

    match run(cli, &output).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            output.error(&e.to_string());
            std::process::exit(1);
        }
    }
}

/// Returns whether the command succeeded.
async fn run(cli: Cli, output: &Output) -> Result<bool> {
    let cwd = env::current_dir()?;

    match cli.command {
        Commands::Init {
            app,
            live_dir,
            force,
        } => {
            logging::init(cli.verbose, None);
            config::init_config(&cwd, app.as_deref(), live_dir.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(true)
        }
        Commands::Deploy {
            artifact_url,
            release_tag,
            force_unlock,
        } => {
            let config = load_config(cli.config.as_deref(), &cwd, cli.verbose)?;
            commands::deploy(config, &artifact_url, &release_tag, force_unlock, output).await
        }
        Commands::Rollback {
            backup,
            force_unlock,
        } => {
            let config = load_config(cli.config.as_deref(), &cwd, cli.verbose)?;
            commands::rollback(config, backup.as_deref(), force_unlock, output).await
        }
        Commands::Backups => {
            let config = load_config(cli.config.as_deref(), &cwd, cli.verbose)?;
            commands::list_backups(&config, output)?;
            Ok(true)
        }
    }
}

/// Load the config, then start logging with its log file.
fn load_config(path: Option<&Path>, cwd: &Path, verbose: bool) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path),
        None => Config::discover(cwd),
    };
    match config {
        Ok(config) => {
            logging::init(verbose, config.log_file.as_deref());
            Ok(config)
        }
        Err(e) => {
            logging::init(verbose, None);
            Err(e)
        }
    }
}
