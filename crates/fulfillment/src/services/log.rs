//! Sink that only writes a log line per call.
//!
//! Stands in for any one-way collaborator the process was started without.
//! Nothing is kept after the call returns.

use async_trait::async_trait;
use domain::Order;

use super::{
    BusEvent, EventBusSink, Notification, NotificationSink, PaymentInitiation, PaymentSink,
    QueueSink, SinkError,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl PaymentSink for LogSink {
    async fn initiate(&self, request: &PaymentInitiation) -> Result<(), SinkError> {
        tracing::info!(
            order_id = %request.order_id,
            user_id = %request.user_id,
            amount = %request.amount,
            "payment sink not configured, skipping initiation"
        );
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, notification: &Notification) -> Result<(), SinkError> {
        tracing::info!(
            order_id = %notification.order_id,
            user_id = %notification.user_id,
            message = %notification.message,
            "notification sink not configured, skipping message"
        );
        Ok(())
    }
}

#[async_trait]
impl QueueSink for LogSink {
    async fn publish(&self, order: &Order) -> Result<(), SinkError> {
        tracing::info!(
            order_id = %order.id(),
            status = %order.status(),
            "queue not configured, skipping publish"
        );
        Ok(())
    }
}

#[async_trait]
impl EventBusSink for LogSink {
    async fn put_event(&self, event: BusEvent) -> Result<(), SinkError> {
        tracing::info!(
            event_id = %event.event_id,
            detail_type = %event.detail_type,
            "event bus not configured, skipping event"
        );
        Ok(())
    }
}
