//! Fulfillment error types.

use common::{OrderId, ProductId, UserId};
use order_store::StoreError;
use thiserror::Error;

/// Errors surfaced by checkout and payment callback handling.
///
/// Fan-out failures never appear here: they are logged and dropped at the
/// dispatcher boundary.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// Required input is missing or malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The user's cart has no items.
    #[error("Cart is empty for user {0}")]
    CartEmpty(UserId),

    /// A cart line references a product that is unknown or unavailable.
    #[error("Invalid product ID: {product_id} ({reason})")]
    InvalidProduct { product_id: ProductId, reason: String },

    /// A required collaborator could not be reached.
    #[error("Upstream service error: {0}")]
    Upstream(String),

    /// The order repository failed.
    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for FulfillmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(e) => FulfillmentError::Validation(e.to_string()),
            StoreError::NotFound(id) => FulfillmentError::NotFound(id),
            other => FulfillmentError::Storage(other),
        }
    }
}

/// Convenience type alias for fulfillment results.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
