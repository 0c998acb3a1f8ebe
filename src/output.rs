// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use clap::ValueEnum;
use serde::Serialize;

use crate::backup::BackupArchive;
use crate::deploy::{DeploymentOutcome, DeploymentReport};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    #[default]
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a warning (suppressed in quiet/json mode; JSON carries warnings in the outcome).
    pub fn warning(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("  ! {message}");
        }
    }

    /// Print a success message.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => emit_json("success", message),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Print the final result of a deploy or rollback run.
    pub fn outcome(&self, action: &str, outcome: &DeploymentOutcome) {
        match (self.mode, outcome) {
            (OutputMode::Json, _) => {
                if let Ok(json) = serde_json::to_string(outcome) {
                    println!("{json}");
                }
            }
            (_, DeploymentOutcome::Success(report)) => {
                for warning in &report.warnings {
                    self.warning(&warning.message);
                }
                self.success(&success_line(action, report));
            }
            (
                _,
                DeploymentOutcome::Failed {
                    stage,
                    error,
                    warnings,
                    ..
                },
            ) => {
                for warning in warnings {
                    self.warning(&warning.message);
                }
                self.error(&format!("{action} failed during {stage}: {error}"));
            }
        }
    }

    /// Print retained backups, newest first.
    pub fn backups(&self, backups: &[BackupArchive]) {
        match self.mode {
            OutputMode::Json => {
                if let Ok(json) = serde_json::to_string(backups) {
                    println!("{json}");
                }
            }
            OutputMode::Normal | OutputMode::Quiet => {
                if backups.is_empty() && self.mode == OutputMode::Normal {
                    println!("No backups found");
                }
                for backup in backups {
                    println!(
                        "{}  {}",
                        backup.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                        backup.path.display()
                    );
                }
            }
        }
    }

}

fn emit_json(event: &str, message: &str) {
    let event = JsonEvent { event, message };
    if let Ok(json) = serde_json::to_string(&event) {
        println!("{json}");
    }
}

fn success_line(action: &str, report: &DeploymentReport) -> String {
    let mut line = format!("{} {} {} complete", action, report.app_name, report.release);
    match &report.health {
        Some(endpoint) => line.push_str(&format!(
            " (healthy on :{}{})",
            endpoint.port, endpoint.path
        )),
        None => line.push_str(" (health unconfirmed)"),
    }
    if !report.warnings.is_empty() {
        line.push_str(&format!(" with {} warning(s)", report.warnings.len()));
    }
    line.push_str(&format!(" in {:.1}s", report.duration_secs));
    line
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
}
