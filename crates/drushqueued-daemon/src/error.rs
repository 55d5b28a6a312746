//! Daemon-related errors.

use thiserror::Error;

use drushqueued_protocols::TaskId;

/// Errors that can occur while setting up the daemon.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors reported by a task executor. Never fatal to the queue runner.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The runner process exited unsuccessfully. `code` is `None` when it was
    /// killed by a signal.
    #[error("Executing task {task} failed (exit code: {code:?})")]
    TaskFailed { task: TaskId, code: Option<i32> },

    /// The runner process could not be started.
    #[error("Failed to start {program} for task {task}: {source}")]
    Spawn {
        program: String,
        task: TaskId,
        #[source]
        source: std::io::Error,
    },
}

impl ExecutorError {
    /// Task the error belongs to.
    pub fn task(&self) -> TaskId {
        match self {
            ExecutorError::TaskFailed { task, .. } | ExecutorError::Spawn { task, .. } => *task,
        }
    }
}

/// Queue runner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunnerState {
    /// No store connection; connecting or waiting to retry.
    Disconnected = 0,
    /// Connection established, first poll not started yet.
    Connected = 1,
    /// Waiting for the poll interval or fetching a batch.
    Polling = 2,
    /// Executing the tasks of a batch.
    Dispatching = 3,
}

impl From<u8> for RunnerState {
    fn from(v: u8) -> Self {
        match v {
            1 => RunnerState::Connected,
            2 => RunnerState::Polling,
            3 => RunnerState::Dispatching,
            _ => RunnerState::Disconnected,
        }
    }
}

impl std::fmt::Display for RunnerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunnerState::Disconnected => write!(f, "disconnected"),
            RunnerState::Connected => write!(f, "connected"),
            RunnerState::Polling => write!(f, "polling"),
            RunnerState::Dispatching => write!(f, "dispatching"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_failed_error() {
        let err = ExecutorError::TaskFailed {
            task: TaskId::new(101),
            code: Some(1),
        };
        let msg = err.to_string();
        assert!(msg.contains("101"));
        assert!(msg.contains("failed"));
        assert_eq!(err.task(), TaskId::new(101));
    }

    #[test]
    fn test_spawn_error() {
        let err = ExecutorError::Spawn {
            program: "drush".to_string(),
            task: TaskId::new(7),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("drush"));
        assert!(msg.contains("No such file"));
        assert_eq!(err.task(), TaskId::new(7));
    }

    #[test]
    fn test_config_error() {
        let err = DaemonError::Config("program must not be empty".to_string());
        assert!(err.to_string().contains("program"));
    }

    #[test]
    fn test_runner_state_conversion() {
        assert_eq!(RunnerState::from(0), RunnerState::Disconnected);
        assert_eq!(RunnerState::from(1), RunnerState::Connected);
        assert_eq!(RunnerState::from(2), RunnerState::Polling);
        assert_eq!(RunnerState::from(3), RunnerState::Dispatching);
        assert_eq!(RunnerState::from(99), RunnerState::Disconnected);
    }

    #[test]
    fn test_runner_state_display() {
        assert_eq!(RunnerState::Disconnected.to_string(), "disconnected");
        assert_eq!(RunnerState::Connected.to_string(), "connected");
        assert_eq!(RunnerState::Polling.to_string(), "polling");
        assert_eq!(RunnerState::Dispatching.to_string(), "dispatching");
    }
}
