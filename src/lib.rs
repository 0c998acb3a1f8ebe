// ABOUTME: Library root for stevedore - exposes the deployment pipeline for the CLI and tests.
// ABOUTME: The main binary is in main.rs.

pub mod archive;
pub mod backup;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod fetch;
pub mod health;
pub mod install;
pub mod logging;
pub mod output;
pub mod process;
pub mod signal;
pub mod supervisor;
pub mod types;
pub mod workspace;
