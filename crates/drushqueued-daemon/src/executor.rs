//! Task execution through an external runner process.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use drushqueued_protocols::TaskId;

use crate::config::RunnerConfig;
use crate::error::ExecutorError;

/// Runs one queued task.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Execute `task` and wait for it to finish.
    async fn execute(&self, task: TaskId) -> Result<(), ExecutorError>;
}

/// Executes tasks by running `<program> <args...> <task id>`.
///
/// The child inherits stdout and stderr so drush output ends up next to the
/// daemon's own log. There is no timeout: a runner that never exits stalls
/// the queue.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    program: String,
    args: Vec<String>,
}

impl CommandExecutor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument vector for `task`, program first.
    pub fn command_line(&self, task: TaskId) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .chain(std::iter::once(task.to_string()))
            .collect()
    }
}

#[async_trait]
impl TaskExecutor for CommandExecutor {
    async fn execute(&self, task: TaskId) -> Result<(), ExecutorError> {
        debug!("Running {}", self.command_line(task).join(" "));

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(task.to_string())
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|source| ExecutorError::Spawn {
                program: self.program.clone(),
                task,
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ExecutorError::TaskFailed {
                task,
                code: status.code(),
            })
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
