//! Connected event-stream subscribers.

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, error};
use uuid::Uuid;

use drushqueued_protocols::TaskEvent;

/// Events buffered per subscriber before it counts as stuck and is dropped.
pub const SUBSCRIBER_BUFFER: usize = 64;

/// Unique subscriber ID.
pub type SubscriberId = Uuid;

/// The set of live subscribers.
///
/// Mutations only lock one shard of the map. Broadcasts iterate a snapshot,
/// so no lock is held while events are pushed.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    subscribers: DashMap<SubscriberId, mpsc::Sender<TaskEvent>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and return its id and event receiver.
    pub fn subscribe(&self) -> (SubscriberId, mpsc::Receiver<TaskEvent>) {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = Uuid::new_v4();
        self.add(id, tx);
        (id, rx)
    }

    /// Register `tx` under `id`.
    pub fn add(&self, id: SubscriberId, tx: mpsc::Sender<TaskEvent>) {
        self.subscribers.insert(id, tx);
        debug!("Subscriber added: {} ({} total)", id, self.subscribers.len());
    }

    /// Remove a subscriber. Removing an unknown id is a no-op.
    pub fn remove(&self, id: &SubscriberId) -> bool {
        let removed = self.subscribers.remove(id).is_some();
        if removed {
            debug!("Subscriber removed: {} ({} left)", id, self.subscribers.len());
        }
        removed
    }

    /// Current subscribers.
    pub fn snapshot(&self) -> Vec<(SubscriberId, mpsc::Sender<TaskEvent>)> {
        self.subscribers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    /// Push `event` to every subscriber. A subscriber whose stream is gone or
    /// whose buffer is full is removed. Returns the number of deliveries.
    pub fn broadcast(&self, event: &TaskEvent) -> usize {
        let mut delivered = 0;

        for (id, tx) in self.snapshot() {
            match tx.try_send(*event) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    error!(subscriber = %id, error = %e, "Dropping subscriber");
                    self.remove(&id);
                }
            }
        }

        delivered
    }

    pub fn contains(&self, id: &SubscriberId) -> bool {
        self.subscribers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drushqueued_protocols::TaskId;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_subscribe_and_remove() {
        let registry = SubscriberRegistry::new();
        let (id, _rx) = registry.subscribe();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&id));

        assert!(registry.remove(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = SubscriberRegistry::new();
        let (id, _rx) = registry.subscribe();
        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
        assert!(!registry.remove(&Uuid::new_v4()));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_subscriber() {
        let registry = SubscriberRegistry::new();
        let (_a, mut rx_a) = registry.subscribe();
        let (_b, mut rx_b) = registry.subscribe();

        let event = TaskEvent::start(TaskId::new(42));
        assert_eq!(registry.broadcast(&event), 2);

        assert_eq!(rx_a.recv().await, Some(event));
        assert_eq!(rx_b.recv().await, Some(event));
    }

    #[test]
    fn test_broadcast_drops_closed_subscriber() {
        let registry = SubscriberRegistry::new();
        let (gone, rx_gone) = registry.subscribe();
        let (alive, mut rx_alive) = registry.subscribe();
        drop(rx_gone);

        let event = TaskEvent::finished(TaskId::new(55));
        assert_eq!(registry.broadcast(&event), 1);

        assert!(!registry.contains(&gone));
        assert!(registry.contains(&alive));
        assert_eq!(rx_alive.try_recv().ok(), Some(event));
    }

    #[test]
    fn test_dropped_subscriber_is_logged_as_error() {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let registry = SubscriberRegistry::new();
        let (gone, rx_gone) = registry.subscribe();
        drop(rx_gone);
        registry.broadcast(&TaskEvent::start(TaskId::new(9)));

        let output = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
        let line = output
            .lines()
            .find(|line| line.contains("Dropping subscriber"))
            .expect("no drop logged");
        assert!(line.contains("ERROR"));
        assert!(line.contains(&format!("subscriber={}", gone)));
    }

    #[test]
    fn test_broadcast_drops_stuck_subscriber() {
        let registry = SubscriberRegistry::new();
        let (id, _rx) = registry.subscribe();

        let event = TaskEvent::start(TaskId::new(1));
        for _ in 0..SUBSCRIBER_BUFFER {
            assert_eq!(registry.broadcast(&event), 1);
        }
        assert_eq!(registry.broadcast(&event), 0);
        assert!(!registry.contains(&id));
    }

    #[test]
    fn test_broadcast_without_subscribers() {
        let registry = SubscriberRegistry::new();
        assert_eq!(registry.broadcast(&TaskEvent::start(TaskId::new(1))), 0);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = SubscriberRegistry::new();
        let (id, _rx) = registry.subscribe();
        let snapshot = registry.snapshot();

        registry.remove(&id);
        assert_eq!(snapshot.len(), 1);
        assert!(registry.is_empty());
    }
}
