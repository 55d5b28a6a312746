//! Event sink feeding the subscriber registry.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use drushqueued_protocols::{EventSink, SinkError, TaskEvent};

use crate::registry::SubscriberRegistry;

/// Broadcasts every event to the connected event-stream clients.
#[derive(Debug, Clone)]
pub struct SseSink {
    registry: Arc<SubscriberRegistry>,
}

impl SseSink {
    pub fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }
}

#[async_trait]
impl EventSink for SseSink {
    fn name(&self) -> &str {
        "eventsource"
    }

    async fn publish(&self, event: &TaskEvent) -> Result<(), SinkError> {
        let delivered = self.registry.broadcast(event);
        debug!("Broadcast {} to {} subscriber(s)", event, delivered);
        Ok(())
    }
}
