//! Domain model for order fulfillment.
//!
//! This crate provides:
//! - `Order`, the aggregate of record, and `NewOrder`, its validated precursor
//! - `OrderStatus` with the payment-driven transition table
//! - `CartSnapshot`, the checkout-time view of a user's cart
//! - `PaymentCallback`, the one-shot payment provider result

pub mod cart;
pub mod order;
pub mod payment;

pub use cart::{CartLine, CartSnapshot};
pub use common::{Money, OrderId, ProductId, UserId};
pub use order::{LineItem, NewOrder, Order, OrderError, OrderStatus, PaymentTransition};
pub use payment::{PaymentCallback, PaymentResult};
