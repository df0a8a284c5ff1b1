//! Shell task execution - one subprocess per command, output streamed live

use crate::blueprint::{Step, TaskDefinition};
use crate::engine::shutdown::Shutdown;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{error, info, warn};

/// Errors from running a step's task
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command '{command}' exited with code {code}")]
    CommandFailed { command: String, code: i32 },

    #[error("run cancelled")]
    Cancelled,
}

/// Runs shell tasks rooted at the project directory
#[derive(Debug, Clone)]
pub struct ShellRunner {
    project_root: PathBuf,
}

impl ShellRunner {
    pub fn new(project_root: PathBuf) -> Self {
        Self { project_root }
    }

    /// Execute a step's task to completion or first failure
    ///
    /// Commands run in declared order, each as its own `sh -c` subprocess in
    /// the step's working directory. The first non-zero exit stops the
    /// remaining commands.
    pub async fn run_task(
        &self,
        step: &Step,
        environment: &[(String, String)],
        shutdown: &Shutdown,
    ) -> Result<(), ExecutionError> {
        let TaskDefinition::Shell { commands } = &step.task;

        let cwd = match &step.working_directory {
            Some(dir) => self.project_root.join(dir),
            None => self.project_root.clone(),
        };

        for command in commands {
            self.run_command(command, &cwd, environment, &step.id, shutdown)
                .await?;
        }
        Ok(())
    }

    async fn run_command(
        &self,
        command: &str,
        cwd: &Path,
        environment: &[(String, String)],
        step_id: &str,
        shutdown: &Shutdown,
    ) -> Result<(), ExecutionError> {
        info!(step = %step_id, "$ {}", command);

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(cwd)
            .envs(environment.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                command: command.to_string(),
                source,
            })?;

        // One reader per stream keeps each stream's lines in write order.
        let stdout_task = child
            .stdout
            .take()
            .map(|out| tokio::spawn(stream_lines(out, step_id.to_string(), false)));
        let stderr_task = child
            .stderr
            .take()
            .map(|err| tokio::spawn(stream_lines(err, step_id.to_string(), true)));

        let status = tokio::select! {
            status = child.wait() => status.map_err(|source| ExecutionError::Spawn {
                command: command.to_string(),
                source,
            })?,
            _ = shutdown.triggered() => {
                warn!(step = %step_id, "cancellation requested, terminating '{}'", command);
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(ExecutionError::Cancelled);
            }
        };

        // Drain whatever the process wrote before it exited.
        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        if let Some(task) = stderr_task {
            let _ = task.await;
        }

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            error!(step = %step_id, "command '{}' exited with code {}", command, code);
            return Err(ExecutionError::CommandFailed {
                command: command.to_string(),
                code,
            });
        }

        Ok(())
    }
}

async fn stream_lines<R: AsyncRead + Unpin>(reader: R, step_id: String, is_stderr: bool) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if is_stderr {
            warn!(step = %step_id, stream = "stderr", "{}", line);
        } else {
            info!(step = %step_id, stream = "stdout", "{}", line);
        }
    }
}
