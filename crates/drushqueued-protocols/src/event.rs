//! Task identifiers and lifecycle events.
//!
//! Events are ephemeral: they are built by the queue runner around each task
//! execution and handed to every configured sink. Nothing stores them.

use std::fmt;

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

/// Identifier of one hosting task (the task node id in the store).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    /// Wrap a raw task node id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw numeric id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of task lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// The runner is about to execute the task.
    TaskStart,
    /// The runner process exited, successfully or not.
    TaskFinished,
}

impl EventKind {
    /// Wire name of the event, used as the webhook `name` and the SSE event name.
    pub const fn as_str(self) -> &'static str {
        match self {
            EventKind::TaskStart => "task-start",
            EventKind::TaskFinished => "task-finished",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEvent {
    /// What happened.
    pub kind: EventKind,
    /// The task it happened to.
    pub task: TaskId,
}

impl TaskEvent {
    /// Create a new event.
    pub fn new(kind: EventKind, task: TaskId) -> Self {
        Self { kind, task }
    }

    /// A `task-start` event for `task`.
    pub fn start(task: TaskId) -> Self {
        Self::new(EventKind::TaskStart, task)
    }

    /// A `task-finished` event for `task`.
    pub fn finished(task: TaskId) -> Self {
        Self::new(EventKind::TaskFinished, task)
    }

    /// Event name on the wire.
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Event data on the wire: the task id as a decimal string.
    pub fn data(&self) -> String {
        self.task.to_string()
    }
}

impl fmt::Display for TaskEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.task)
    }
}
