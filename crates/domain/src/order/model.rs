//! The order record and its validated precursor.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use super::{OrderError, OrderStatus};

/// A line of an order, snapshotted at checkout time.
///
/// The unit price is the catalog price at the moment of checkout and is
/// never re-resolved afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub unit_price: Money,
    pub quantity: u32,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(product_id: impl Into<ProductId>, unit_price: Money, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            unit_price,
            quantity,
        }
    }

    /// Returns `unit_price × quantity`, or `None` on overflow.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_multiply(self.quantity)
    }
}

/// Validated input for creating an order.
///
/// Holding a `NewOrder` proves that the owner is set, there is at least one
/// line item, every quantity is positive and the total is positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    user_id: UserId,
    line_items: Vec<LineItem>,
    total: Money,
}

impl NewOrder {
    /// Validates the input and computes the total.
    pub fn new(user_id: UserId, line_items: Vec<LineItem>) -> Result<Self, OrderError> {
        if !user_id.is_valid() {
            return Err(OrderError::UserIdRequired);
        }
        if line_items.is_empty() {
            return Err(OrderError::NoLineItems);
        }

        let mut total = Money::zero();
        for item in &line_items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                });
            }
            if item.unit_price.cents() < 0 {
                return Err(OrderError::InvalidPrice {
                    product_id: item.product_id.clone(),
                    price: item.unit_price,
                });
            }
            total = item
                .line_total()
                .and_then(|line| total.checked_add(line))
                .ok_or(OrderError::TotalOverflow)?;
        }

        if !total.is_positive() {
            return Err(OrderError::NonPositiveTotal { total });
        }

        Ok(Self {
            user_id,
            line_items,
            total,
        })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn total(&self) -> Money {
        self.total
    }

    /// Turns the input into a persisted `Pending` order with the given identity.
    pub fn into_order(self, id: OrderId, created_at: DateTime<Utc>) -> Order {
        Order {
            id,
            user_id: self.user_id,
            line_items: self.line_items,
            total: self.total,
            status: OrderStatus::Pending,
            created_at,
            updated_at: created_at,
        }
    }
}

/// The order aggregate of record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    line_items: Vec<LineItem>,
    total: Money,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Rebuilds an order from storage. The stored total is taken as is.
    pub fn from_parts(
        id: OrderId,
        user_id: UserId,
        line_items: Vec<LineItem>,
        total: Money,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            line_items,
            total,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Sets a new status and stamps `updated_at`.
    ///
    /// Legality of the transition is checked by the caller.
    pub fn set_status(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }
}
