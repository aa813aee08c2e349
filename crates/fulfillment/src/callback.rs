//! Payment callback handling.

use domain::{Order, OrderStatus, PaymentCallback, PaymentResult, PaymentTransition};
use order_store::{OrderRepository, StatusTransition};

use crate::dispatcher::Dispatcher;
use crate::error::{FulfillmentError, Result};

/// What a callback did to its order.
///
/// Every variant is a success for the payment provider.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    /// The order left `Pending`.
    Applied(Order),
    /// The order had already left `Pending`; nothing changed.
    Duplicate(Order),
    /// The result carried no decision; the order is still `Pending`.
    Ignored(Order),
}

impl CallbackOutcome {
    pub fn order(&self) -> &Order {
        match self {
            CallbackOutcome::Applied(order)
            | CallbackOutcome::Duplicate(order)
            | CallbackOutcome::Ignored(order) => order,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, CallbackOutcome::Applied(_))
    }
}

/// Applies payment provider results to orders.
///
/// Idempotent: a late or repeated callback never mutates an order that has
/// already left `Pending`, and still reports success.
pub struct PaymentCallbackHandler<R>
where
    R: OrderRepository,
{
    repository: R,
    dispatcher: Dispatcher,
}

impl<R> PaymentCallbackHandler<R>
where
    R: OrderRepository,
{
    pub fn new(repository: R, dispatcher: Dispatcher) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    #[tracing::instrument(skip(self), fields(order_id = tracing::field::Empty))]
    pub async fn handle(&self, callback: PaymentCallback) -> Result<CallbackOutcome> {
        let order_id = callback
            .order_id
            .filter(|id| id.as_i64() != 0)
            .ok_or_else(|| FulfillmentError::Validation("order_id is required".to_string()))?;
        tracing::Span::current().record("order_id", order_id.as_i64());

        metrics::counter!("payment_callbacks_total", "result" => result_label(&callback.result))
            .increment(1);

        let order = self.repository.get(order_id).await?;

        let target = match order.status().on_payment(&callback.result) {
            PaymentTransition::Advance(target) => target,
            PaymentTransition::Unchanged => {
                tracing::info!(
                    result = %callback.result,
                    "payment result carries no decision, order left pending"
                );
                return Ok(CallbackOutcome::Ignored(order));
            }
            PaymentTransition::Rejected => return Ok(self.duplicate(order)),
        };

        match self
            .repository
            .transition_status(order_id, OrderStatus::Pending, target)
            .await?
        {
            StatusTransition::Applied(order) => {
                tracing::info!(status = %order.status(), "payment result applied");
                self.dispatcher.submit(order.clone());
                Ok(CallbackOutcome::Applied(order))
            }
            // Another callback won the race.
            StatusTransition::Skipped(order) => Ok(self.duplicate(order)),
        }
    }

    fn duplicate(&self, order: Order) -> CallbackOutcome {
        metrics::counter!("payment_callbacks_duplicate_total").increment(1);
        tracing::info!(
            status = %order.status(),
            "order already settled, ignoring duplicate callback"
        );
        CallbackOutcome::Duplicate(order)
    }
}

fn result_label(result: &PaymentResult) -> &'static str {
    match result {
        PaymentResult::Success => "success",
        PaymentResult::Failed => "failed",
        PaymentResult::Other(_) => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{DispatchConfig, Sinks};
    use crate::services::{
        InMemoryEventBus, InMemoryNotificationSink, InMemoryPaymentSink, InMemoryQueue,
    };
    use domain::{LineItem, Money, OrderId, UserId};
    use order_store::InMemoryOrderRepository;
    use std::sync::Arc;

    fn handler() -> (InMemoryOrderRepository, PaymentCallbackHandler<InMemoryOrderRepository>) {
        let repository = InMemoryOrderRepository::new();
        let (dispatcher, _worker) = Dispatcher::spawn(
            Sinks {
                payment: Arc::new(InMemoryPaymentSink::new()),
                notification: Arc::new(InMemoryNotificationSink::new()),
                queue: Arc::new(InMemoryQueue::new()),
                event_bus: Arc::new(InMemoryEventBus::new()),
            },
            DispatchConfig::new("http://localhost:8080/orders/callback"),
        );
        let handler = PaymentCallbackHandler::new(repository.clone(), dispatcher);
        (repository, handler)
    }

    async fn pending_order(repository: &InMemoryOrderRepository) -> Order {
        repository
            .create(
                UserId::new(1),
                vec![LineItem::new("p1", Money::from_cents(1000), 1)],
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_order_id_is_rejected() {
        let (_, handler) = handler();
        let callback: PaymentCallback = serde_json::from_str(r#"{"status": "success"}"#).unwrap();

        let result = handler.handle(callback).await;
        assert!(matches!(result, Err(FulfillmentError::Validation(_))));
    }

    #[tokio::test]
    async fn test_zero_order_id_is_rejected() {
        let (_, handler) = handler();
        let result = handler
            .handle(PaymentCallback::new(OrderId::new(0), "success"))
            .await;
        assert!(matches!(result, Err(FulfillmentError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let (_, handler) = handler();
        let result = handler
            .handle(PaymentCallback::new(OrderId::new(42), "success"))
            .await;
        assert!(matches!(result, Err(FulfillmentError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_success_marks_paid() {
        let (repository, handler) = handler();
        let order = pending_order(&repository).await;

        let outcome = handler
            .handle(PaymentCallback::new(order.id(), "success"))
            .await
            .unwrap();

        assert!(outcome.is_applied());
        assert_eq!(outcome.order().status(), OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_unknown_result_leaves_order_pending() {
        let (repository, handler) = handler();
        let order = pending_order(&repository).await;

        let outcome = handler
            .handle(PaymentCallback::new(order.id(), "processing"))
            .await
            .unwrap();

        assert!(matches!(outcome, CallbackOutcome::Ignored(_)));
        let stored = repository.get(order.id()).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_settled_order_reports_duplicate() {
        let (repository, handler) = handler();
        let order = pending_order(&repository).await;
        repository
            .update_status(order.id(), OrderStatus::PaymentFailed)
            .await
            .unwrap();

        let outcome = handler
            .handle(PaymentCallback::new(order.id(), "success"))
            .await
            .unwrap();

        assert!(matches!(outcome, CallbackOutcome::Duplicate(_)));
        assert_eq!(outcome.order().status(), OrderStatus::PaymentFailed);
    }
}
