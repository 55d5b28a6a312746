//! Error types shared by sinks and channels.

use thiserror::Error;

/// Errors raised while delivering an event to a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Sink closed")]
    Closed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while starting or running an event channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Server error: {0}")]
    Server(String),
}
