//! Event emission system.
//!
//! Every ledger-affecting commit pushes an event so UI clients can
//! refresh instead of polling. Each subscriber has an independent
//! buffer with backpressure at 1000 events; `list_notifications`
//! remains the pull path of record.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// An event emitted by the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event type name (e.g. "DailyClaimed", "DaemonStarted").
    pub event_type: String,
    /// Unix timestamp.
    pub timestamp: u64,
    /// Type-specific payload.
    pub payload: serde_json::Value,
}

/// Event bus for broadcasting events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: Event) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events. Returns a receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Get the current sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_emit_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(Event {
            event_type: "DailyClaimed".to_string(),
            timestamp: 1000,
            payload: serde_json::json!({"user_id": "alice", "streak": 4}),
        });

        let event = rx.try_recv().expect("receive event");
        assert_eq!(event.event_type, "DailyClaimed");
        assert_eq!(event.payload["streak"], 4);
        assert_eq!(bus.sequence(), 1);
    }

    #[test]
    fn test_emit_without_subscribers_does_not_block() {
        let bus = EventBus::new(4);
        for i in 0..10 {
            bus.emit(Event {
                event_type: "RewardRedeemed".to_string(),
                timestamp: i,
                payload: serde_json::Value::Null,
            });
        }
        assert_eq!(bus.sequence(), 10);
    }
}
