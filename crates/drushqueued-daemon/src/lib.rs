//! # drushqueued Daemon
//!
//! The long-running half of drushqueued: poll the hosting queue, run each
//! pending task through drush, and tell listeners about it.
//!
//! ## Features
//!
//! - Reconnect/poll/dispatch state machine that never exits on its own
//! - Sequential task execution in batch order
//! - Task failures logged and skipped, store failures trigger a full reconnect
//! - Task lifecycle events fanned out to any number of [`EventSink`]s
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use drushqueued_daemon::{CommandExecutor, EventPublisher, QueueRunner, RunnerConfig};
//! use drushqueued_store::{ConnectOptions, MySqlTaskStore};
//!
//! let config = RunnerConfig::default();
//! let store = Arc::new(MySqlTaskStore::new(ConnectOptions::from_database("hostmaster", None)?));
//! let executor = Arc::new(CommandExecutor::from_config(&config));
//! let runner = QueueRunner::new(config, store, executor, EventPublisher::new())?;
//! runner.run().await;
//! ```
//!
//! [`EventSink`]: drushqueued_protocols::EventSink

pub mod config;
pub mod error;
pub mod executor;
pub mod publisher;
pub mod runner;

pub use config::RunnerConfig;
pub use error::{DaemonError, ExecutorError, RunnerState};
pub use executor::{CommandExecutor, TaskExecutor};
pub use publisher::EventPublisher;
pub use runner::{QueueRunner, RunnerStats};
