//! Shared types for the order service crates.

mod ids;
mod money;

pub use ids::{OrderId, ProductId, UserId};
pub use money::Money;
