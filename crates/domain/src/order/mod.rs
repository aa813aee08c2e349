//! Order aggregate and related types.

mod model;
mod status;

pub use model::{LineItem, NewOrder, Order};
pub use status::{OrderStatus, PaymentTransition};

use common::{Money, ProductId};
use thiserror::Error;

/// Errors raised when an order would violate its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The owning user is missing or zero.
    #[error("User ID is required")]
    UserIdRequired,

    /// An order must carry at least one line item.
    #[error("Order has no line items")]
    NoLineItems,

    /// A line item quantity is not positive.
    #[error("Invalid quantity for {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// A unit price is negative.
    #[error("Invalid price for {product_id}: {price}")]
    InvalidPrice { product_id: ProductId, price: Money },

    /// The computed total is zero or negative.
    #[error("Order total must be positive, got {total}")]
    NonPositiveTotal { total: Money },

    /// The computed total does not fit in the money representation.
    #[error("Order total overflows")]
    TotalOverflow,

    /// Unrecognised status string.
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
}
