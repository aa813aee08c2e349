use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use domain::{LineItem, NewOrder, Order, OrderStatus, UserId};
use tokio::sync::RwLock;

use crate::{OrderId, OrderRepository, Result, StatusTransition, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
    orders: BTreeMap<OrderId, Order>,
    last_id: i64,
}

/// In-memory order repository.
///
/// Used when no database is configured and throughout the tests. Every
/// operation runs under one lock section, which gives the same per-order
/// atomicity as a database transaction.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<RwLock<MemoryState>>,
    fail_on_write: Arc<AtomicBool>,
}

impl InMemoryOrderRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with `StoreError::Unavailable`.
    pub fn set_fail_on_write(&self, fail: bool) {
        self.fail_on_write.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_on_write.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "write rejected by in-memory store".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    #[tracing::instrument(skip(self, line_items), fields(items = line_items.len()))]
    async fn create(&self, user_id: UserId, line_items: Vec<LineItem>) -> Result<Order> {
        let new_order = NewOrder::new(user_id, line_items)?;
        self.check_writable()?;

        let mut state = self.state.write().await;
        state.last_id += 1;
        let id = OrderId::new(state.last_id);
        let order = new_order.into_order(id, Utc::now());
        state.orders.insert(id, order.clone());

        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order> {
        self.check_writable()?;

        let mut state = self.state.write().await;
        let order = state.orders.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        order.set_status(status, Utc::now());

        Ok(order.clone())
    }

    #[tracing::instrument(skip(self))]
    async fn transition_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<StatusTransition> {
        self.check_writable()?;

        let mut state = self.state.write().await;
        let order = state.orders.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if order.status() != from {
            return Ok(StatusTransition::Skipped(order.clone()));
        }
        order.set_status(to, Utc::now());

        Ok(StatusTransition::Applied(order.clone()))
    }

    async fn get(&self, id: OrderId) -> Result<Order> {
        let state = self.state.read().await;
        state
            .orders
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state.orders.values().cloned().collect();
        orders.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        Ok(orders)
    }
}
