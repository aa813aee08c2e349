//! External collaborator traits with their implementations.
//!
//! The cart store and catalog are request/response dependencies of checkout.
//! The payment, notification, queue and event-bus sinks are one-way: the
//! core never consumes anything they return beyond success or failure.
//!
//! The `InMemory*` types record every call and are meant for tests. A process
//! without a configured sink uses [`LogSink`], which keeps nothing.

pub mod aws;
pub mod cart;
pub mod catalog;
pub mod event_bus;
pub mod http;
pub mod log;
pub mod notification;
pub mod payment;
pub mod queue;

pub use cart::{CartError, CartStore, InMemoryCartStore};
pub use catalog::{CatalogClient, CatalogEntry, CatalogError, InMemoryCatalog};
pub use aws::{EventBridgeSink, SqsQueueSink};
pub use event_bus::{BusEvent, EventBusSink, EventType, InMemoryEventBus};
pub use http::{HttpCartStore, HttpCatalogClient, HttpNotificationSink, HttpPaymentSink};
pub use log::LogSink;
pub use notification::{InMemoryNotificationSink, Notification, NotificationSink};
pub use payment::{InMemoryPaymentSink, PaymentInitiation, PaymentSink};
pub use queue::{InMemoryQueue, QueueSink, QueuedMessage};

use thiserror::Error;

/// Failure of a one-way sink call.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink could not be reached or timed out.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The sink answered with a non-success status.
    #[error("Sink rejected the call with status {0}")]
    Rejected(u16),

    /// The sink is not accepting calls.
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    /// The payload could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
