//! Event bus sink trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SinkError;

/// Source name stamped on every event this service emits.
pub const EVENT_SOURCE: &str = "order-service";

/// Detail type of an event bus entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    OrderCreated,
    OrderStatusChanged,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::OrderCreated => "OrderCreated",
            EventType::OrderStatusChanged => "OrderStatusChanged",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One event bus entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusEvent {
    pub event_id: Uuid,
    pub source: String,
    pub detail_type: EventType,
    pub detail: serde_json::Value,
    pub time: DateTime<Utc>,
}

impl BusEvent {
    /// Creates an event from this service with a fresh ID and timestamp.
    pub fn new(detail_type: EventType, detail: serde_json::Value) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            source: EVENT_SOURCE.to_string(),
            detail_type,
            detail,
            time: Utc::now(),
        }
    }
}

/// One-way event bus publisher.
#[async_trait]
pub trait EventBusSink: Send + Sync {
    async fn put_event(&self, event: BusEvent) -> Result<(), SinkError>;
}

#[derive(Debug, Default)]
struct InMemoryEventBusState {
    events: Vec<BusEvent>,
    fail_on_put: bool,
}

/// In-memory event bus that keeps every accepted event.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventBus {
    state: Arc<RwLock<InMemoryEventBusState>>,
}

impl InMemoryEventBus {
    /// Creates a new empty event bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the bus to reject every event.
    pub fn set_fail_on_put(&self, fail: bool) {
        self.state.write().unwrap().fail_on_put = fail;
    }

    /// Returns the number of events accepted.
    pub fn event_count(&self) -> usize {
        self.state.read().unwrap().events.len()
    }

    /// Returns every event accepted, oldest first.
    pub fn events(&self) -> Vec<BusEvent> {
        self.state.read().unwrap().events.clone()
    }
}

#[async_trait]
impl EventBusSink for InMemoryEventBus {
    async fn put_event(&self, event: BusEvent) -> Result<(), SinkError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_put {
            return Err(SinkError::Unavailable("event bus rejected entry".to_string()));
        }
        state.events.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_event_records_entry() {
        let bus = InMemoryEventBus::new();

        bus.put_event(BusEvent::new(
            EventType::OrderCreated,
            serde_json::json!({"id": 1}),
        ))
        .await
        .unwrap();

        let events = bus.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].detail_type, EventType::OrderCreated);
        assert_eq!(events[0].source, EVENT_SOURCE);
        assert_eq!(events[0].detail["id"], 1);
    }

    #[tokio::test]
    async fn test_status_change_event() {
        let bus = InMemoryEventBus::new();
        bus.put_event(BusEvent::new(
            EventType::OrderStatusChanged,
            serde_json::Value::Null,
        ))
        .await
        .unwrap();
        assert_eq!(bus.events()[0].detail_type, EventType::OrderStatusChanged);
    }

    #[tokio::test]
    async fn test_fail_on_put() {
        let bus = InMemoryEventBus::new();
        bus.set_fail_on_put(true);
        let result = bus
            .put_event(BusEvent::new(EventType::OrderCreated, serde_json::Value::Null))
            .await;
        assert!(result.is_err());
        assert_eq!(bus.event_count(), 0);
    }
}
