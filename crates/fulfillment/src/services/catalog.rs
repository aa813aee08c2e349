//! Catalog client trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, ProductId};
use thiserror::Error;

/// Current price and availability of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub price: Money,
    pub available: bool,
}

/// Errors returned by a catalog client.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog has no such product.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The catalog could not be reached or answered with an error status.
    #[error("Catalog unreachable: {0}")]
    Unreachable(String),

    /// Transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Resolves a product to its current price and availability.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn get_price(&self, product_id: &ProductId) -> Result<CatalogEntry, CatalogError>;
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    products: HashMap<ProductId, CatalogEntry>,
    lookups: usize,
}

/// In-memory catalog for local runs and testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryCatalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an available product.
    pub fn insert(&self, product_id: impl Into<ProductId>, price: Money) {
        self.insert_entry(
            product_id,
            CatalogEntry {
                price,
                available: true,
            },
        );
    }

    /// Adds or replaces a product with explicit availability.
    pub fn insert_entry(&self, product_id: impl Into<ProductId>, entry: CatalogEntry) {
        self.state
            .write()
            .unwrap()
            .products
            .insert(product_id.into(), entry);
    }

    /// Returns how many lookups have been served.
    pub fn lookup_count(&self) -> usize {
        self.state.read().unwrap().lookups
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalog {
    async fn get_price(&self, product_id: &ProductId) -> Result<CatalogEntry, CatalogError> {
        let mut state = self.state.write().unwrap();
        state.lookups += 1;
        state
            .products
            .get(product_id)
            .copied()
            .ok_or_else(|| CatalogError::NotFound(product_id.clone()))
    }
}
