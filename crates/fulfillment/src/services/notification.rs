//! Notification sink trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, OrderId, UserId};
use domain::OrderStatus;
use serde::Serialize;

use super::SinkError;

/// Customer-facing message about an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub user_id: UserId,
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub total: Money,
    pub message: String,
}

/// One-way notification endpoint.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), SinkError>;
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    sent: Vec<Notification>,
    fail_on_send: bool,
}

/// In-memory notification sink that records every message.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationSink {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotificationSink {
    /// Creates a new in-memory notification sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the sink to fail every send.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Returns the number of messages sent.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    /// Returns all messages sent.
    pub fn sent(&self) -> Vec<Notification> {
        self.state.read().unwrap().sent.clone()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationSink {
    async fn send(&self, notification: &Notification) -> Result<(), SinkError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_send {
            return Err(SinkError::Unavailable(
                "notification service down".to_string(),
            ));
        }
        state.sent.push(notification.clone());
        Ok(())
    }
}
