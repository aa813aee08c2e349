use domain::OrderError;
use thiserror::Error;

use crate::OrderId;

/// Errors that can occur when interacting with the order repository.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order input violates an invariant; nothing was written.
    #[error("Validation error: {0}")]
    Validation(#[from] OrderError),

    /// No order exists with the given ID.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The backing store could not complete the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be mapped back to an order.
    #[error("Corrupt order record {id}: {reason}")]
    CorruptRecord { id: i64, reason: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for order repository operations.
pub type Result<T> = std::result::Result<T, StoreError>;
