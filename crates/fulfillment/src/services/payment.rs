//! Payment sink trait and in-memory implementation.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::{Money, OrderId, UserId};

use super::SinkError;

/// Request to start payment processing for an order out-of-band.
///
/// The provider reports the result later on `callback_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInitiation {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: Money,
    pub callback_url: String,
}

/// One-way payment initiation endpoint.
#[async_trait]
pub trait PaymentSink: Send + Sync {
    async fn initiate(&self, request: &PaymentInitiation) -> Result<(), SinkError>;
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    initiations: Vec<PaymentInitiation>,
    fail_on_initiate: bool,
    delay: Option<Duration>,
}

/// In-memory payment sink that records every initiation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentSink {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentSink {
    /// Creates a new in-memory payment sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the sink to fail every initiation.
    pub fn set_fail_on_initiate(&self, fail: bool) {
        self.state.write().unwrap().fail_on_initiate = fail;
    }

    /// Makes every initiation wait before completing.
    pub fn set_delay(&self, delay: Duration) {
        self.state.write().unwrap().delay = Some(delay);
    }

    /// Returns the number of recorded initiations.
    pub fn initiation_count(&self) -> usize {
        self.state.read().unwrap().initiations.len()
    }

    /// Returns all recorded initiations.
    pub fn initiations(&self) -> Vec<PaymentInitiation> {
        self.state.read().unwrap().initiations.clone()
    }
}

#[async_trait]
impl PaymentSink for InMemoryPaymentSink {
    async fn initiate(&self, request: &PaymentInitiation) -> Result<(), SinkError> {
        let delay = self.state.read().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().unwrap();
        if state.fail_on_initiate {
            return Err(SinkError::Unavailable("payment declined".to_string()));
        }
        state.initiations.push(request.clone());
        Ok(())
    }
}
