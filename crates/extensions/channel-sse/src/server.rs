//! HTTP server and routing.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, KeepAliveStream, Sse},
    routing::get,
    Router,
};
use futures::Stream;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use drushqueued_protocols::{ChannelError, TaskEvent};

use crate::registry::{SubscriberId, SubscriberRegistry};
use crate::EventStreamConfig;

/// Route serving the event stream.
pub const EVENTSOURCE_PATH: &str = "/eventsource/";

#[derive(Clone)]
struct RouterState {
    registry: Arc<SubscriberRegistry>,
    keep_alive: Duration,
}

/// Create the Axum router for the event stream.
pub fn create_router(registry: Arc<SubscriberRegistry>, keep_alive: Duration) -> Router {
    Router::new()
        .route(EVENTSOURCE_PATH, get(eventsource_handler))
        .layer(CorsLayer::permissive())
        .with_state(RouterState {
            registry,
            keep_alive,
        })
}

/// Register the client and stream events to it until it goes away.
async fn eventsource_handler(State(state): State<RouterState>) -> Sse<KeepAliveStream<SubscriberStream>> {
    let (id, rx) = state.registry.subscribe();
    info!("Event stream client connected: {}", id);

    let stream = SubscriberStream {
        rx,
        registration: Registration {
            id,
            registry: state.registry,
        },
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(state.keep_alive))
}

/// Render a task event in SSE framing.
pub fn to_sse_event(event: &TaskEvent) -> Event {
    Event::default().event(event.name()).data(event.data())
}

/// Removes the subscriber once the response is dropped.
struct Registration {
    id: SubscriberId,
    registry: Arc<SubscriberRegistry>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.registry.remove(&self.id) {
            info!("Event stream client disconnected: {}", self.id);
        }
    }
}

/// Response body of one subscriber.
///
/// Ends when the registry drops the subscriber's sender.
pub struct SubscriberStream {
    rx: mpsc::Receiver<TaskEvent>,
    registration: Registration,
}

impl SubscriberStream {
    /// Subscriber id backing this stream.
    pub fn id(&self) -> SubscriberId {
        self.registration.id
    }
}

impl Stream for SubscriberStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        this.rx
            .poll_recv(cx)
            .map(|event| event.map(|e| Ok(to_sse_event(&e))))
    }
}

/// The event-stream HTTP server, bound but not yet serving.
pub struct EventStreamServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    registry: Arc<SubscriberRegistry>,
    keep_alive: Duration,
}

impl EventStreamServer {
    /// Bind the configured address.
    pub async fn bind(
        config: &EventStreamConfig,
        registry: Arc<SubscriberRegistry>,
    ) -> Result<Self, ChannelError> {
        config.validate().map_err(ChannelError::InvalidAddress)?;

        let addr = config.address();
        let listener = TcpListener::bind((config.host.as_str(), config.port))
            .await
            .map_err(|e| ChannelError::Bind {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;
        let local_addr = listener.local_addr().map_err(|e| ChannelError::Bind {
            addr,
            reason: e.to_string(),
        })?;

        Ok(Self {
            listener,
            local_addr,
            registry,
            keep_alive: config.keep_alive(),
        })
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until the process exits.
    pub async fn serve(self) -> Result<(), ChannelError> {
        let router = create_router(self.registry, self.keep_alive);
        info!(
            "Event stream server listening on http://{}{}",
            self.local_addr, EVENTSOURCE_PATH
        );

        axum::serve(self.listener, router)
            .await
            .map_err(|e| ChannelError::Server(e.to_string()))
    }

    /// Serve on a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.serve().await {
                error!("Event stream server error: {}", e);
            }
        })
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
