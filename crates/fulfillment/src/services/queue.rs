//! Message queue sink trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::Order;
use uuid::Uuid;

use super::SinkError;

/// One-way message queue publisher. The message body is the full order.
#[async_trait]
pub trait QueueSink: Send + Sync {
    async fn publish(&self, order: &Order) -> Result<(), SinkError>;
}

/// A message accepted by the in-memory queue.
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    pub message_id: Uuid,
    pub body: String,
}

#[derive(Debug, Default)]
struct InMemoryQueueState {
    messages: Vec<QueuedMessage>,
    fail_on_publish: bool,
}

/// In-memory queue that keeps every published message body as JSON text.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQueue {
    state: Arc<RwLock<InMemoryQueueState>>,
}

impl InMemoryQueue {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the queue to reject every publish.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().unwrap().fail_on_publish = fail;
    }

    /// Returns the number of messages held.
    pub fn message_count(&self) -> usize {
        self.state.read().unwrap().messages.len()
    }

    /// Returns every message held, oldest first.
    pub fn messages(&self) -> Vec<QueuedMessage> {
        self.state.read().unwrap().messages.clone()
    }
}

#[async_trait]
impl QueueSink for InMemoryQueue {
    async fn publish(&self, order: &Order) -> Result<(), SinkError> {
        let body = serde_json::to_string(order)?;

        let mut state = self.state.write().unwrap();
        if state.fail_on_publish {
            return Err(SinkError::Unavailable("queue rejected message".to_string()));
        }
        state.messages.push(QueuedMessage {
            message_id: Uuid::new_v4(),
            body,
        });
        Ok(())
    }
}
