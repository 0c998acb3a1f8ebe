// ABOUTME: Command module aggregator for the stevedore CLI.
// ABOUTME: Re-exports deploy, rollback, and backup listing command handlers.

mod backups;
mod deploy;
mod rollback;

pub use backups::list_backups;
pub use deploy::deploy;
pub use rollback::rollback;
