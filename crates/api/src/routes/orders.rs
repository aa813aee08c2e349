//! Order checkout, lookup and payment callback endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use common::{OrderId, UserId};
use domain::{Order, PaymentCallback};
use fulfillment::{CheckoutOrchestrator, PaymentCallbackHandler};
use order_store::OrderRepository;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<R: OrderRepository> {
    pub orchestrator: CheckoutOrchestrator<R>,
    pub callbacks: PaymentCallbackHandler<R>,
    pub repository: R,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub user_id: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct CallbackAccepted {
    pub status: &'static str,
}

// -- Handlers --

/// POST /orders: check out the user's current cart.
#[tracing::instrument(skip(state, payload))]
pub async fn create<R: OrderRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<Order>, ApiError> {
    let Json(req) = payload?;
    let order = state
        .orchestrator
        .checkout(UserId::new(req.user_id))
        .await?;
    Ok(Json(order))
}

/// GET /orders: every order, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<R: OrderRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.repository.list().await?))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<R: OrderRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    Ok(Json(state.repository.get(order_id).await?))
}

/// POST /orders/callback: payment provider result.
///
/// Duplicate, late and undecided results all answer success so the provider
/// stops retrying.
#[tracing::instrument(skip(state, payload))]
pub async fn callback<R: OrderRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    payload: Result<Json<PaymentCallback>, JsonRejection>,
) -> Result<Json<CallbackAccepted>, ApiError> {
    let Json(callback) = payload?;
    state.callbacks.handle(callback).await?;
    Ok(Json(CallbackAccepted { status: "success" }))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse::<i64>()
        .ok()
        .filter(|n| *n > 0)
        .map(OrderId::new)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid order ID: {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order_id() {
        assert_eq!(parse_order_id("42").unwrap(), OrderId::new(42));
        assert!(parse_order_id("abc").is_err());
        assert!(parse_order_id("0").is_err());
        assert!(parse_order_id("-3").is_err());
    }
}
