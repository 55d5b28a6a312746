//! Queue runner configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Queue runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Seconds to sleep before each poll.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds to wait after a failed connect attempt.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,

    /// Milliseconds to wait before dispatching each task.
    #[serde(default = "default_dispatch_delay")]
    pub dispatch_delay_ms: u64,

    /// Program that runs one task.
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments passed before the task id.
    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

fn default_poll_interval() -> u64 {
    1
}

fn default_reconnect_delay() -> u64 {
    5
}

fn default_dispatch_delay() -> u64 {
    100
}

fn default_program() -> String {
    "drush".to_string()
}

fn default_args() -> Vec<String> {
    vec!["@hostmaster".to_string(), "hosting-task".to_string()]
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            reconnect_delay_secs: default_reconnect_delay(),
            dispatch_delay_ms: default_dispatch_delay(),
            program: default_program(),
            args: default_args(),
        }
    }
}

impl RunnerConfig {
    /// Use `alias` as the drush site alias (`drush <alias> hosting-task <id>`).
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.args = vec![alias.into(), "hosting-task".to_string()];
        self
    }

    /// Get the poll interval as a Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Get the reconnect delay as a Duration.
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// Get the dispatch delay as a Duration.
    pub fn dispatch_delay(&self) -> Duration {
        Duration::from_millis(self.dispatch_delay_ms)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.program.trim().is_empty() {
            return Err("program must not be empty".to_string());
        }

        Ok(())
    }
}
