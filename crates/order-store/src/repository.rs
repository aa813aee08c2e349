use async_trait::async_trait;
use domain::{LineItem, Order, OrderStatus, UserId};

use crate::{OrderId, Result};

/// Outcome of a conditional status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusTransition {
    /// The order was in the expected status and now carries the new one.
    Applied(Order),

    /// The order was not in the expected status; it is returned unchanged.
    Skipped(Order),
}

impl StatusTransition {
    /// Returns the order as it is stored after the call.
    pub fn order(&self) -> &Order {
        match self {
            StatusTransition::Applied(order) | StatusTransition::Skipped(order) => order,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            StatusTransition::Applied(order) | StatusTransition::Skipped(order) => order,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, StatusTransition::Applied(_))
    }
}

/// Durable storage of orders.
///
/// The repository is the only owner of order lifecycle and the only shared
/// mutable resource of the service. Every write happens inside a single
/// transactional boundary per order ID: concurrent updates to the same order
/// never interleave partial writes.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Creates a `Pending` order.
    ///
    /// Computes the total, assigns the ID and `created_at`, and persists the
    /// record atomically. Fails with `Validation` for an empty item list,
    /// a non-positive quantity or total, or a zero user ID.
    async fn create(&self, user_id: UserId, line_items: Vec<LineItem>) -> Result<Order>;

    /// Unconditionally stores a new status and a fresh `updated_at`.
    ///
    /// Legality of the transition is not checked here.
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order>;

    /// Stores `to` only if the order is currently in `from`.
    ///
    /// The check and the write happen in the same transactional boundary, so
    /// of two racing transitions from the same status exactly one is applied.
    async fn transition_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<StatusTransition>;

    /// Loads an order. Fails with `NotFound` if it does not exist.
    async fn get(&self, id: OrderId) -> Result<Order>;

    /// Lists all orders, newest first (`created_at` descending, then ID descending).
    async fn list(&self) -> Result<Vec<Order>>;
}
