//! Realtime event bus.
//!
//! A thin wrapper over a `tokio::sync::broadcast` channel. Subscribers are
//! independent: a slow or dropped receiver never affects the others, and
//! publishing with no subscribers is a no-op.

use serde::Serialize;
use tokio::sync::broadcast;

/// A single event on the realtime stream.
#[derive(Debug, Clone, Serialize)]
pub struct RealtimeEvent {
    /// Event name, e.g. "connected", "activity_log".
    pub event: String,
    /// JSON payload.
    pub data: serde_json::Value,
}

impl RealtimeEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(event: &str, data: serde_json::Value) -> Self {
        Self {
            event: event.to_string(),
            data,
        }
    }
}

/// Fan-out bus for realtime events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RealtimeEvent>,
}

impl EventBus {
    /// Creates a bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribes a new receiver; each receiver is one logical stream.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.tx.subscribe()
    }

    /// Publishes an event to every subscriber.
    ///
    /// Returns the number of receivers the event was delivered to; zero
    /// when nobody is listening.
    pub fn publish(&self, event: RealtimeEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Number of currently subscribed receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
