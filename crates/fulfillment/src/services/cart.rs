//! Cart store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{ProductId, UserId};
use domain::{CartLine, CartSnapshot};
use thiserror::Error;

/// Errors returned by a cart store.
#[derive(Debug, Error)]
pub enum CartError {
    /// The cart store could not be reached or answered with an error status.
    #[error("Cart store unreachable: {0}")]
    Unreachable(String),

    /// The cart store answered with a body that could not be understood.
    #[error("Invalid cart response: {0}")]
    InvalidResponse(String),

    /// Transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Key-value mapping of user to cart lines.
///
/// `clear` is called by the cart side once an order exists, never by checkout.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Returns the current cart lines for a user, in insertion order.
    async fn get_snapshot(&self, user_id: UserId) -> Result<CartSnapshot, CartError>;

    /// Removes every line of a user's cart.
    async fn clear(&self, user_id: UserId) -> Result<(), CartError>;
}

#[derive(Debug, Default)]
struct InMemoryCartState {
    carts: HashMap<UserId, Vec<CartLine>>,
    unreachable: bool,
}

/// In-memory cart store for local runs and testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartStore {
    state: Arc<RwLock<InMemoryCartState>>,
}

impl InMemoryCartStore {
    /// Creates a new empty cart store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a line to a user's cart.
    pub fn add_line(&self, user_id: UserId, product_id: impl Into<ProductId>, quantity: u32) {
        self.state
            .write()
            .unwrap()
            .carts
            .entry(user_id)
            .or_default()
            .push(CartLine::new(product_id, quantity));
    }

    /// Configures the store to fail every call as if the service were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.write().unwrap().unreachable = unreachable;
    }

    /// Returns the number of lines in a user's cart.
    pub fn line_count(&self, user_id: UserId) -> usize {
        self.state
            .read()
            .unwrap()
            .carts
            .get(&user_id)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get_snapshot(&self, user_id: UserId) -> Result<CartSnapshot, CartError> {
        let state = self.state.read().unwrap();
        if state.unreachable {
            return Err(CartError::Unreachable("cart store is down".to_string()));
        }

        let lines = state.carts.get(&user_id).cloned().unwrap_or_default();
        Ok(CartSnapshot::new(user_id, lines))
    }

    async fn clear(&self, user_id: UserId) -> Result<(), CartError> {
        let mut state = self.state.write().unwrap();
        if state.unreachable {
            return Err(CartError::Unreachable("cart store is down".to_string()));
        }

        state.carts.remove(&user_id);
        Ok(())
    }
}
