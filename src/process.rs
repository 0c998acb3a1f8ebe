// ABOUTME: Runs subordinate commands with streamed output and a hard timeout.
// ABOUTME: Children are killed when they time out or their future is dropped.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Number of trailing stderr lines kept for error messages.
const STDERR_TAIL_LINES: usize = 20;

/// How long output readers may lag behind process exit.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` timed out after {}s", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("failed waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result of a finished subordinate command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// Last lines written to stderr, newline separated.
    pub stderr_tail: String,
}

impl CommandOutput {
    /// Short human description of a failure, for error messages.
    pub fn describe_failure(&self) -> String {
        let code = self
            .exit_code
            .map(|c| format!("exit code {c}"))
            .unwrap_or_else(|| "terminated by signal".to_string());
        if self.stderr_tail.is_empty() {
            code
        } else {
            format!("{code}: {}", self.stderr_tail)
        }
    }
}

/// Build a `sh -c` command running in `dir`.
pub fn shell(command_line: &str, dir: &Path) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(command_line).current_dir(dir);
    command
}

/// Run `command`, logging each output line under `label` as it arrives.
pub async fn run_streaming(
    mut command: Command,
    label: &str,
    timeout: Duration,
) -> Result<CommandOutput, ProcessError> {
    let program = program_name(&command);

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
        program: program.clone(),
        source,
    })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_label = label.to_string();
    let read_stdout = tokio::spawn(async move {
        if let Some(stdout) = stdout {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::info!("[{stdout_label}] {line}");
            }
        }
    });

    let stderr_label = label.to_string();
    let read_stderr = tokio::spawn(async move {
        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
        if let Some(stderr) = stderr {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::info!("[{stderr_label}] {line}");
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }
        tail.into_iter().collect::<Vec<_>>().join("\n")
    });

    let waited = tokio::time::timeout(timeout, child.wait()).await;
    let status = match waited {
        Ok(status) => status.map_err(|source| ProcessError::Wait {
            program: program.clone(),
            source,
        })?,
        Err(_) => {
            if let Err(e) = child.kill().await {
                tracing::warn!("failed to kill timed out `{}`: {}", program, e);
            }
            read_stdout.abort();
            read_stderr.abort();
            return Err(ProcessError::TimedOut { program, timeout });
        }
    };

    // Daemonizing children can keep the pipes open after the direct child exits.
    let _ = tokio::time::timeout(OUTPUT_DRAIN_GRACE, read_stdout).await;
    let stderr_tail = match tokio::time::timeout(OUTPUT_DRAIN_GRACE, read_stderr).await {
        Ok(Ok(tail)) => tail,
        _ => String::new(),
    };

    Ok(CommandOutput {
        success: status.success(),
        exit_code: status.code(),
        stderr_tail,
    })
}

/// Run a probe command quietly; true when it exits successfully in time.
pub async fn succeeds(mut command: Command, timeout: Duration) -> bool {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    match tokio::time::timeout(timeout, command.status()).await {
        Ok(Ok(status)) => status.success(),
        _ => false,
    }
}

/// Locate an executable on `PATH`.
pub fn find_in_path(binary: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn program_name(command: &Command) -> String {
    let std_command = command.as_std();
    let mut parts = vec![std_command.get_program().to_string_lossy().into_owned()];
    parts.extend(
        std_command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned()),
    );
    parts.join(" ")
}
