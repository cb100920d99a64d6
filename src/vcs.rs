//! Version-control publishing through external `dvc` and `git` processes.
//!
//! The working tree is expected to be initialized already, with remotes
//! configured for both tools. Publishing a file is five commands run in a
//! fixed order:
//!
//! | Step | Command | Purpose |
//! |------|---------|---------|
//! | 1 | `dvc add <file>` | Snapshot the data file |
//! | 2 | `git add <file>.dvc` | Stage the pointer file |
//! | 3 | `git commit -m <message>` | Commit the pointer |
//! | 4 | `dvc push` | Upload the snapshot |
//! | 5 | `git push` | Upload the commit |
//!
//! Each command reports a [`CommandOutcome`]. The first failure stops the
//! sequence; steps that already ran are left as they are.

use crate::config::ToolConfig;
use crate::utils::truncate_for_log;
use itertools::Itertools;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use thiserror::Error;
use tokio::process::Command;
use tracing::{error, info, instrument, warn};

/// Errors raised at the process boundary.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` {}: {stderr}", describe_exit(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{0}` not found on PATH")]
    ToolMissing(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ExternalCommand {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            std::iter::once(&self.program).chain(&self.args).join(" ")
        )
    }
}

/// Result of running one external command to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Succeeded {
        command: String,
    },
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Succeeded { .. })
    }
}

/// Runs external commands inside a working directory.
pub trait CommandRunner {
    /// Run `command` to completion in `work_dir`.
    ///
    /// A non-zero exit is reported as [`CommandOutcome::Failed`]; only a
    /// failure to start the process is an `Err`.
    async fn run(
        &self,
        command: &ExternalCommand,
        work_dir: &Path,
    ) -> Result<CommandOutcome, VcsError>;
}

/// [`CommandRunner`] that spawns real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    #[instrument(level = "info", skip_all, fields(command = %command))]
    async fn run(
        &self,
        command: &ExternalCommand,
        work_dir: &Path,
    ) -> Result<CommandOutcome, VcsError> {
        let t0 = Instant::now();
        let output = Command::new(&command.program)
            .args(&command.args)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| VcsError::Spawn {
                command: command.to_string(),
                source,
            })?;
        let elapsed_ms = t0.elapsed().as_millis();

        if output.status.success() {
            info!(elapsed_ms, "Command succeeded");
            Ok(CommandOutcome::Succeeded {
                command: command.to_string(),
            })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(
                elapsed_ms,
                code = ?output.status.code(),
                stderr = %truncate_for_log(&stderr, 300),
                "Command exited unsuccessfully"
            );
            Ok(CommandOutcome::Failed {
                command: command.to_string(),
                code: output.status.code(),
                stderr,
            })
        }
    }
}

/// The five publishing commands for `file`, in execution order.
///
/// `file` is passed through as given, so it should be relative to the
/// working directory the commands run in.
pub fn publish_commands(tools: &ToolConfig, file: &Path, message: &str) -> Vec<ExternalCommand> {
    let file = file.display().to_string();
    let pointer = format!("{file}.dvc");
    vec![
        ExternalCommand::new(&tools.dvc, ["add", file.as_str()]),
        ExternalCommand::new(&tools.git, ["add", pointer.as_str()]),
        ExternalCommand::new(&tools.git, ["commit", "-m", message]),
        ExternalCommand::new(&tools.dvc, ["push"]),
        ExternalCommand::new(&tools.git, ["push"]),
    ]
}

/// Run `commands` one at a time, stopping at the first failure.
///
/// # Returns
///
/// The outcome of every command when all of them succeed.
///
/// # Errors
///
/// [`VcsError::CommandFailed`] for the first command that exits non-zero,
/// or [`VcsError::Spawn`] if a program cannot be started. Later commands are
/// not run and earlier ones are not undone.
#[instrument(level = "info", skip_all, fields(work_dir = %work_dir.display(), steps = commands.len()))]
pub async fn run_sequence<R: CommandRunner>(
    runner: &R,
    commands: &[ExternalCommand],
    work_dir: &Path,
) -> Result<Vec<CommandOutcome>, VcsError> {
    let mut outcomes = Vec::with_capacity(commands.len());

    for (index, cmd) in commands.iter().enumerate() {
        let step = index + 1;
        match runner.run(cmd, work_dir).await {
            Ok(outcome @ CommandOutcome::Succeeded { .. }) => {
                info!(step, command = %cmd, "Publish step completed");
                outcomes.push(outcome);
            }
            Ok(CommandOutcome::Failed {
                command,
                code,
                stderr,
            }) => {
                error!(
                    step,
                    %command,
                    ?code,
                    skipped = commands.len() - step,
                    "Publish step failed; aborting sequence"
                );
                return Err(VcsError::CommandFailed {
                    command,
                    code,
                    stderr,
                });
            }
            Err(e) => {
                error!(step, command = %cmd, error = %e, "Publish step could not start");
                return Err(e);
            }
        }
    }

    Ok(outcomes)
}

/// Check that `tool` can be found on `PATH`.
pub async fn check_tool_available(tool: &str) -> Result<(), VcsError> {
    let status = Command::new("which")
        .arg(tool)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|source| VcsError::Spawn {
            command: format!("which {tool}"),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(VcsError::ToolMissing(tool.to_string()))
    }
}
