//! Checkout-time view of a user's cart.

use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};

/// One entry of a cart: a product and how many of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Ordered snapshot of a cart read at checkout.
///
/// Never persisted; once an order is built from it, its lines live on only
/// inside the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
}

impl CartSnapshot {
    pub fn new(user_id: UserId, lines: Vec<CartLine>) -> Self {
        Self { user_id, lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}
