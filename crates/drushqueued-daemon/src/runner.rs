//! The reconnect/poll/dispatch loop.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info};

use drushqueued_protocols::{TaskEvent, TaskId};
use drushqueued_store::{StoreError, TaskConnection, TaskStore};

use crate::config::RunnerConfig;
use crate::error::{DaemonError, RunnerState};
use crate::executor::TaskExecutor;
use crate::publisher::EventPublisher;

/// Counters describing what the runner has done so far.
#[derive(Debug, Default)]
pub struct RunnerStats {
    connects: AtomicU64,
    connect_failures: AtomicU64,
    polls: AtomicU64,
    tasks_succeeded: AtomicU64,
    tasks_failed: AtomicU64,
}

impl RunnerStats {
    /// Successful connects, including reconnects.
    pub fn connects(&self) -> u64 {
        self.connects.load(Ordering::Relaxed)
    }

    /// Failed connect attempts.
    pub fn connect_failures(&self) -> u64 {
        self.connect_failures.load(Ordering::Relaxed)
    }

    /// Completed batch fetches.
    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::Relaxed)
    }

    pub fn tasks_succeeded(&self) -> u64 {
        self.tasks_succeeded.load(Ordering::Relaxed)
    }

    pub fn tasks_failed(&self) -> u64 {
        self.tasks_failed.load(Ordering::Relaxed)
    }

    /// Tasks dispatched, whatever their outcome.
    pub fn tasks_dispatched(&self) -> u64 {
        self.tasks_succeeded() + self.tasks_failed()
    }
}

/// Polls the task store and runs every pending task, forever.
///
/// Task failures are logged and the batch continues. Any store error drops
/// the connection and starts a new connect cycle. Connect failures are
/// retried after the configured backoff. Nothing in here ends the loop.
pub struct QueueRunner {
    config: RunnerConfig,
    store: Arc<dyn TaskStore>,
    executor: Arc<dyn TaskExecutor>,
    publisher: EventPublisher,
    state: AtomicU8,
    stats: RunnerStats,
}

impl QueueRunner {
    /// Create a new runner.
    pub fn new(
        config: RunnerConfig,
        store: Arc<dyn TaskStore>,
        executor: Arc<dyn TaskExecutor>,
        publisher: EventPublisher,
    ) -> Result<Self, DaemonError> {
        config.validate().map_err(DaemonError::Config)?;

        Ok(Self {
            config,
            store,
            executor,
            publisher,
            state: AtomicU8::new(RunnerState::Disconnected as u8),
            stats: RunnerStats::default(),
        })
    }

    /// Current state of the loop.
    pub fn state(&self) -> RunnerState {
        RunnerState::from(self.state.load(Ordering::SeqCst))
    }

    /// Runner statistics.
    pub fn stats(&self) -> &RunnerStats {
        &self.stats
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    fn set_state(&self, state: RunnerState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    /// Run the loop. Only returns if the surrounding task is dropped.
    pub async fn run(&self) {
        info!(
            "Queue runner started (poll interval: {:?}, sinks: {})",
            self.config.poll_interval(),
            self.publisher.sink_count()
        );

        loop {
            let mut conn = self.connect().await;
            self.set_state(RunnerState::Connected);

            loop {
                self.set_state(RunnerState::Polling);
                tokio::time::sleep(self.config.poll_interval()).await;

                if let Err(e) = self.poll_once(conn.as_mut()).await {
                    error!(error = %e, "Lost database connection, reconnecting");
                    break;
                }
            }

            drop(conn);
            self.set_state(RunnerState::Disconnected);
        }
    }

    /// Connect, retrying after the backoff until it works.
    async fn connect(&self) -> Box<dyn TaskConnection> {
        self.set_state(RunnerState::Disconnected);

        loop {
            info!(database = %self.store.target(), "Connecting to database");

            match self.store.connect().await {
                Ok(conn) => {
                    self.stats.connects.fetch_add(1, Ordering::Relaxed);
                    info!("Connected");
                    return conn;
                }
                Err(e) => {
                    self.stats.connect_failures.fetch_add(1, Ordering::Relaxed);
                    error!(
                        error = %e,
                        retry_in_secs = self.config.reconnect_delay_secs,
                        "Failed to connect, retrying"
                    );
                    tokio::time::sleep(self.config.reconnect_delay()).await;
                }
            }
        }
    }

    /// Fetch one batch and dispatch it. Returns the batch size.
    pub async fn poll_once(&self, conn: &mut dyn TaskConnection) -> Result<usize, StoreError> {
        let batch = conn.fetch_pending_batch().await?;
        self.stats.polls.fetch_add(1, Ordering::Relaxed);

        if batch.is_empty() {
            return Ok(0);
        }

        debug!(count = batch.len(), "Fetched pending tasks");
        self.set_state(RunnerState::Dispatching);

        for task in &batch {
            self.dispatch_one(*task).await;
        }

        Ok(batch.len())
    }

    /// Run one task between its start and finished events.
    async fn dispatch_one(&self, task: TaskId) {
        tokio::time::sleep(self.config.dispatch_delay()).await;

        self.publisher.publish(&TaskEvent::start(task)).await;
        info!(task = %task, "Executing task");

        match self.executor.execute(task).await {
            Ok(()) => {
                self.stats.tasks_succeeded.fetch_add(1, Ordering::Relaxed);
                info!(task = %task, "Task finished");
            }
            Err(e) => {
                self.stats.tasks_failed.fetch_add(1, Ordering::Relaxed);
                error!(task = %e.task(), error = %e, "Task failed");
            }
        }

        self.publisher.publish(&TaskEvent::finished(task)).await;
    }
}
