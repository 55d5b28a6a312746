//! Event sink protocol definitions.
//!
//! A sink is a destination for task lifecycle events: an outbound webhook, the
//! in-process event-stream broadcaster, or anything else that wants to know
//! when tasks start and finish.

use async_trait::async_trait;

use crate::error::SinkError;
use crate::event::TaskEvent;

/// Destination for task lifecycle events.
///
/// Implementations must not block the caller for long: the queue runner awaits
/// `publish` between task executions. Slow deliveries belong in a spawned task.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    /// Deliver one event.
    async fn publish(&self, event: &TaskEvent) -> Result<(), SinkError>;
}
