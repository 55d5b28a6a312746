//! # drushqueued Channel - Webhook
//!
//! Forwards task lifecycle events to an HTTP endpoint as JSON:
//!
//! ```json
//! {"type": "event", "name": "task-start", "data": "42"}
//! ```
//!
//! Delivery is best-effort. Events go through a bounded queue to one
//! delivery task, so a slow endpoint never holds up the queue runner and
//! events arrive in order. Failures are logged and dropped, never retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error};

use drushqueued_protocols::{EventSink, SinkError, TaskEvent};

/// Webhook configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL.
    pub url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    10
}

impl WebhookConfig {
    /// Configuration for `url` with the default timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Webhook payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    pub name: String,
    pub data: String,
}

impl From<&TaskEvent> for WebhookPayload {
    fn from(event: &TaskEvent) -> Self {
        Self {
            event_type: "event".to_string(),
            name: event.name().to_string(),
            data: event.data(),
        }
    }
}

/// Events waiting for delivery before new ones are dropped.
pub const DELIVERY_QUEUE: usize = 256;

/// HTTP side of the sink: one POST per event.
#[derive(Debug, Clone)]
struct WebhookClient {
    url: String,
    client: Client,
}

impl WebhookClient {
    async fn deliver(&self, event: &TaskEvent) -> Result<(), SinkError> {
        let payload = WebhookPayload::from(event);
        let json = serde_json::to_string(&payload)?;

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .body(json)
            .send()
            .await
            .map_err(|e| SinkError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Delivery(format!("HTTP {}", status)));
        }

        debug!("Webhook delivered {} to {}", event, self.url);
        Ok(())
    }
}

/// Delivers queued events one at a time, in publish order.
async fn run_delivery(client: WebhookClient, mut queue: mpsc::Receiver<TaskEvent>) {
    while let Some(event) = queue.recv().await {
        if let Err(e) = client.deliver(&event).await {
            error!(event = %event, url = %client.url, error = %e, "Webhook delivery failed");
        }
    }
}

/// Event sink that POSTs every event to a webhook.
///
/// `publish` only enqueues; a single background task performs the POSTs so
/// the endpoint sees events in the order they were published.
#[derive(Debug)]
pub struct WebhookSink {
    client: WebhookClient,
    queue: mpsc::Sender<TaskEvent>,
}

impl WebhookSink {
    /// Create a new webhook sink and start its delivery task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: WebhookConfig) -> Result<Self, SinkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SinkError::Delivery(format!("Failed to create HTTP client: {}", e)))?;
        let client = WebhookClient {
            url: config.url,
            client,
        };

        let (queue, rx) = mpsc::channel(DELIVERY_QUEUE);
        tokio::spawn(run_delivery(client.clone(), rx));

        Ok(Self { client, queue })
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.client.url
    }

    /// POST `event` right away, bypassing the queue, and wait for the response.
    pub async fn deliver(&self, event: &TaskEvent) -> Result<(), SinkError> {
        self.client.deliver(event).await
    }
}

#[async_trait]
impl EventSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn publish(&self, event: &TaskEvent) -> Result<(), SinkError> {
        self.queue.try_send(*event).map_err(|e| match e {
            TrySendError::Full(event) => {
                SinkError::Delivery(format!("Webhook queue full, dropped {}", event))
            }
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
