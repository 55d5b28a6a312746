//! Event fan-out to the configured sinks.

use std::sync::Arc;

use tracing::{debug, error};

use drushqueued_protocols::{EventSink, TaskEvent};

/// Publishes task lifecycle events to every configured sink.
///
/// A failing sink is logged and skipped; it never affects the other sinks or
/// the caller. With no sinks configured `publish` does nothing.
#[derive(Clone, Default)]
pub struct EventPublisher {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl EventPublisher {
    /// Create a publisher without sinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Add a sink in place.
    pub fn add_sink(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Number of configured sinks.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Whether no sink is configured.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Names of the configured sinks.
    pub fn sink_names(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.name().to_string()).collect()
    }

    /// Deliver `event` to every sink.
    pub async fn publish(&self, event: &TaskEvent) {
        for sink in &self.sinks {
            match sink.publish(event).await {
                Ok(()) => debug!(sink = sink.name(), "Published {}", event),
                Err(e) => error!(sink = sink.name(), error = %e, "Failed to publish {}", event),
            }
        }
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("sinks", &self.sink_names())
            .finish()
    }
}
