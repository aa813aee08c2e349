//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fulfillment::FulfillmentError;
use order_store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// A required collaborator failed.
    Upstream(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Upstream(msg) => {
                tracing::warn!(error = %msg, "upstream service failed");
                (StatusCode::BAD_GATEWAY, msg)
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        let message = err.to_string();
        match err {
            FulfillmentError::Validation(_)
            | FulfillmentError::CartEmpty(_)
            | FulfillmentError::InvalidProduct { .. } => ApiError::BadRequest(message),
            FulfillmentError::NotFound(_) => ApiError::NotFound(message),
            FulfillmentError::Upstream(_) => ApiError::Upstream(message),
            FulfillmentError::Storage(_) => ApiError::Internal(message),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        FulfillmentError::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, ProductId, UserId};

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_fulfillment_error_statuses() {
        assert_eq!(
            status_of(FulfillmentError::Validation("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(FulfillmentError::CartEmpty(UserId::new(1))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(FulfillmentError::InvalidProduct {
                product_id: ProductId::new("p1"),
                reason: "not found".to_string(),
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(FulfillmentError::NotFound(OrderId::new(1))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(FulfillmentError::Upstream("cart down".to_string())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(StoreError::Unavailable("db down".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_not_found_is_404() {
        assert_eq!(
            status_of(StoreError::NotFound(OrderId::new(7))),
            StatusCode::NOT_FOUND
        );
    }
}
