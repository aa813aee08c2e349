//! Checkout orchestration: cart to persisted order.

use std::sync::Arc;
use std::time::Instant;

use common::UserId;
use domain::{CartLine, LineItem, Order};
use futures_util::future::join_all;
use order_store::OrderRepository;

use crate::dispatcher::Dispatcher;
use crate::error::{FulfillmentError, Result};
use crate::services::{CartStore, CatalogClient, CatalogError};

/// Converts a user's cart into a `Pending` order.
///
/// Every step before persistence is a hard dependency: any failure aborts
/// checkout and no order is written. Fan-out happens after the order exists
/// and is never awaited.
pub struct CheckoutOrchestrator<R>
where
    R: OrderRepository,
{
    repository: R,
    cart: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogClient>,
    dispatcher: Dispatcher,
}

impl<R> CheckoutOrchestrator<R>
where
    R: OrderRepository,
{
    pub fn new(
        repository: R,
        cart: Arc<dyn CartStore>,
        catalog: Arc<dyn CatalogClient>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            repository,
            cart,
            catalog,
            dispatcher,
        }
    }

    /// Checks out the current cart of `user_id`.
    ///
    /// Unit prices are taken from the catalog at this moment and stored on the
    /// order; later catalog changes do not affect it.
    #[tracing::instrument(skip(self), fields(%user_id))]
    pub async fn checkout(&self, user_id: UserId) -> Result<Order> {
        let start = Instant::now();
        let result = self.place_order(user_id).await;

        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total").increment(1);
                metrics::histogram!("checkout_duration_seconds")
                    .record(start.elapsed().as_secs_f64());
                tracing::info!(
                    order_id = %order.id(),
                    total = %order.total(),
                    items = order.line_items().len(),
                    "order created"
                );
            }
            Err(e) => {
                metrics::counter!("checkout_failures_total", "reason" => failure_reason(e))
                    .increment(1);
                tracing::warn!(error = %e, "checkout failed");
            }
        }
        result
    }

    async fn place_order(&self, user_id: UserId) -> Result<Order> {
        if !user_id.is_valid() {
            return Err(FulfillmentError::Validation("user_id is required".to_string()));
        }

        let snapshot = self
            .cart
            .get_snapshot(user_id)
            .await
            .map_err(|e| FulfillmentError::Upstream(e.to_string()))?;

        if snapshot.is_empty() {
            return Err(FulfillmentError::CartEmpty(user_id));
        }

        let line_items = self.price_lines(&snapshot.lines).await?;
        let order = self.repository.create(user_id, line_items).await?;

        self.dispatcher.submit(order.clone());
        Ok(order)
    }

    /// Resolves every line concurrently. The first failing line, in cart
    /// order, names the error.
    async fn price_lines(&self, lines: &[CartLine]) -> Result<Vec<LineItem>> {
        let lookups = lines
            .iter()
            .map(|line| self.catalog.get_price(&line.product_id));
        let entries = join_all(lookups).await;

        lines
            .iter()
            .zip(entries)
            .map(|(line, entry)| {
                let invalid = |reason: String| FulfillmentError::InvalidProduct {
                    product_id: line.product_id.clone(),
                    reason,
                };
                match entry {
                    Ok(entry) if !entry.available => Err(invalid("unavailable".to_string())),
                    Ok(entry) if entry.price.cents() < 0 => {
                        Err(invalid("invalid price".to_string()))
                    }
                    Ok(entry) => Ok(LineItem::new(
                        line.product_id.clone(),
                        entry.price,
                        line.quantity,
                    )),
                    Err(CatalogError::NotFound(_)) => Err(invalid("not found".to_string())),
                    Err(e) => Err(invalid(e.to_string())),
                }
            })
            .collect()
    }
}

fn failure_reason(err: &FulfillmentError) -> &'static str {
    match err {
        FulfillmentError::Validation(_) => "validation",
        FulfillmentError::NotFound(_) => "not_found",
        FulfillmentError::CartEmpty(_) => "cart_empty",
        FulfillmentError::InvalidProduct { .. } => "invalid_product",
        FulfillmentError::Upstream(_) => "upstream",
        FulfillmentError::Storage(_) => "storage",
    }
}
