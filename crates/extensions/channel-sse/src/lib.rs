//! # drushqueued Channel - Server-Sent Events
//!
//! In-process event-stream server. Browsers (or anything speaking
//! `text/event-stream`) subscribe on `GET /eventsource/` and receive every
//! task event as
//!
//! ```text
//! event: task-start
//! data: 42
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use drushqueued_channel_sse::{EventStreamConfig, EventStreamServer, SseSink, SubscriberRegistry};
//!
//! let registry = Arc::new(SubscriberRegistry::new());
//! let server = EventStreamServer::bind(&EventStreamConfig::new("0.0.0.0", 8080), registry.clone()).await?;
//! server.spawn();
//! let sink = SseSink::new(registry);
//! ```

mod registry;
mod server;
mod sink;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use registry::{SubscriberId, SubscriberRegistry, SUBSCRIBER_BUFFER};
pub use server::{create_router, to_sse_event, EventStreamServer, SubscriberStream, EVENTSOURCE_PATH};
pub use sink::SseSink;

/// Event-stream server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventStreamConfig {
    /// Host to bind to (default: "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Seconds between keep-alive comments on idle streams.
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_keep_alive() -> u64 {
    15
}

impl EventStreamConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            keep_alive_secs: default_keep_alive(),
        }
    }

    /// The listen address as `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("host must not be empty".to_string());
        }
        if self.keep_alive_secs == 0 {
            return Err("keep_alive_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}
