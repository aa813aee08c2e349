//! SQS queue and EventBridge bus sinks.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_eventbridge::types::PutEventsRequestEntry;
use domain::Order;

use super::{BusEvent, EventBusSink, QueueSink, SinkError};

/// Publishes every order as a JSON message to one SQS queue.
#[derive(Debug, Clone)]
pub struct SqsQueueSink {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsQueueSink {
    pub fn new(config: &SdkConfig, queue_url: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_sqs::Client::new(config),
            queue_url: queue_url.into(),
        }
    }
}

#[async_trait]
impl QueueSink for SqsQueueSink {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    async fn publish(&self, order: &Order) -> Result<(), SinkError> {
        let body = serde_json::to_string(order)?;

        self.client
            .send_message()
            .queue_url(self.queue_url.clone())
            .message_body(body)
            .send()
            .await
            .map_err(|e| {
                SinkError::Unavailable(aws_sdk_sqs::error::DisplayErrorContext(e).to_string())
            })?;
        Ok(())
    }
}

/// Puts every event on one EventBridge bus.
#[derive(Debug, Clone)]
pub struct EventBridgeSink {
    client: aws_sdk_eventbridge::Client,
    bus_name: String,
}

impl EventBridgeSink {
    pub fn new(config: &SdkConfig, bus_name: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_eventbridge::Client::new(config),
            bus_name: bus_name.into(),
        }
    }
}

#[async_trait]
impl EventBusSink for EventBridgeSink {
    #[tracing::instrument(skip(self, event), fields(event_id = %event.event_id))]
    async fn put_event(&self, event: BusEvent) -> Result<(), SinkError> {
        let entry = PutEventsRequestEntry::builder()
            .event_bus_name(self.bus_name.clone())
            .source(event.source)
            .detail_type(event.detail_type.as_str())
            .detail(event.detail.to_string())
            .build();

        let output = self
            .client
            .put_events()
            .entries(entry)
            .send()
            .await
            .map_err(|e| {
                SinkError::Unavailable(
                    aws_sdk_eventbridge::error::DisplayErrorContext(e).to_string(),
                )
            })?;

        // The call succeeds even when the entry itself was refused.
        if let Some(code) = output.entries().iter().find_map(|e| e.error_code()) {
            return Err(SinkError::Unavailable(format!(
                "event bus rejected entry: {code}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_config::retry::RetryConfig;
    use aws_config::{BehaviorVersion, Region};
    use chrono::Utc;
    use common::{Money, OrderId, UserId};
    use domain::{LineItem, NewOrder};

    use crate::services::EventType;

    fn unreachable_config() -> SdkConfig {
        SdkConfig::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url("http://127.0.0.1:1")
            .retry_config(RetryConfig::disabled())
            .build()
    }

    #[tokio::test]
    async fn test_sqs_failure_is_reported() {
        let order = NewOrder::new(
            UserId::new(1),
            vec![LineItem::new("p1", Money::from_cents(1000), 1)],
        )
        .unwrap()
        .into_order(OrderId::new(1), Utc::now());
        let sink = SqsQueueSink::new(&unreachable_config(), "http://127.0.0.1:1/000/orders");

        let result = sink.publish(&order).await;
        assert!(matches!(result, Err(SinkError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_eventbridge_failure_is_reported() {
        let sink = EventBridgeSink::new(&unreachable_config(), "orders");

        let result = sink
            .put_event(BusEvent::new(
                EventType::OrderCreated,
                serde_json::json!({"id": 1}),
            ))
            .await;
        assert!(matches!(result, Err(SinkError::Unavailable(_))));
    }
}
