//! # drushqueued Protocols
//!
//! Shared definitions for the drushqueued crates. Contains only types and
//! interfaces - no implementations.
//!
//! ## Core Types
//!
//! - [`TaskId`] - Identifier of one queued hosting task
//! - [`TaskEvent`] - A task lifecycle notification (`task-start`, `task-finished`)
//! - [`EventSink`] - Trait for destinations that receive task events

pub mod error;
pub mod event;
pub mod sink;

pub use error::{ChannelError, SinkError};
pub use event::{EventKind, TaskEvent, TaskId};
pub use sink::EventSink;
