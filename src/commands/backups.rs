// ABOUTME: Backup listing command implementation.
// ABOUTME: Prints the retained backups for the configured application.

use stevedore::backup::BackupManager;
use stevedore::config::Config;
use stevedore::error::Result;
use stevedore::output::Output;

pub fn list_backups(config: &Config, output: &Output) -> Result<()> {
    let backups = BackupManager::from_config(config).list(&config.app_name)?;
    output.backups(&backups);
    Ok(())
}
