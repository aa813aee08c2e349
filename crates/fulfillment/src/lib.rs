//! Order fulfillment orchestration.
//!
//! This crate turns carts into orders and drives them through payment:
//! - [`CheckoutOrchestrator`] validates a cart against the catalog and
//!   persists a `Pending` order
//! - [`PaymentCallbackHandler`] applies the payment provider's result exactly
//!   once per order
//! - [`Dispatcher`] fans every new or changed order out to the payment,
//!   notification, queue and event-bus sinks in the background
//!
//! External collaborators live behind the traits in [`services`]: HTTP
//! clients for the cart, catalog, payment and notification services, SQS and
//! EventBridge for the queue and bus, and in-memory fakes for tests.

pub mod callback;
pub mod checkout;
pub mod dispatcher;
pub mod error;
pub mod services;

pub use callback::{CallbackOutcome, PaymentCallbackHandler};
pub use checkout::CheckoutOrchestrator;
pub use dispatcher::{DispatchConfig, DispatchWorkerHandle, Dispatcher, Sinks};
pub use error::{FulfillmentError, Result};
pub use services::{
    CartStore, CatalogClient, EventBusSink, InMemoryCartStore, InMemoryCatalog, InMemoryEventBus,
    InMemoryNotificationSink, InMemoryPaymentSink, InMemoryQueue, NotificationSink, PaymentSink,
    QueueSink, SinkError,
};
