//! HTTP implementations of the collaborator traits.
//!
//! Every client shares one `reqwest::Client`; its timeout is the only
//! timeout applied to outbound calls.

use async_trait::async_trait;
use common::{Money, ProductId, UserId};
use domain::{CartLine, CartSnapshot};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{
    CartError, CartStore, CatalogClient, CatalogEntry, CatalogError, Notification,
    NotificationSink, PaymentInitiation, PaymentSink, SinkError,
};

fn join_url(base: &str, segment: impl std::fmt::Display) -> String {
    format!("{}/{}", base.trim_end_matches('/'), segment)
}

#[derive(Deserialize)]
struct CartBody {
    #[serde(default)]
    items: Option<Vec<CartItemBody>>,
}

#[derive(Deserialize)]
struct CartItemBody {
    product_id: ProductId,
    quantity: u32,
}

/// Cart store backed by the cart service (`GET`/`DELETE {base}/{user_id}`).
#[derive(Debug, Clone)]
pub struct HttpCartStore {
    client: Client,
    base_url: String,
}

impl HttpCartStore {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CartStore for HttpCartStore {
    #[tracing::instrument(skip(self))]
    async fn get_snapshot(&self, user_id: UserId) -> Result<CartSnapshot, CartError> {
        let response = self
            .client
            .get(join_url(&self.base_url, user_id))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CartError::Unreachable(format!(
                "cart service returned {}",
                response.status()
            )));
        }

        let body: CartBody = response
            .json()
            .await
            .map_err(|e| CartError::InvalidResponse(e.to_string()))?;

        let lines = body
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|item| CartLine::new(item.product_id, item.quantity))
            .collect();

        Ok(CartSnapshot::new(user_id, lines))
    }

    #[tracing::instrument(skip(self))]
    async fn clear(&self, user_id: UserId) -> Result<(), CartError> {
        let response = self
            .client
            .delete(join_url(&self.base_url, user_id))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CartError::Unreachable(format!(
                "cart service returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

fn default_available() -> bool {
    true
}

#[derive(Deserialize)]
struct ProductBody {
    price: f64,
    #[serde(default = "default_available")]
    available: bool,
}

/// Catalog backed by the product service (`GET {base}/{product_id}`).
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base_url: String,
}

impl HttpCatalogClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    #[tracing::instrument(skip(self), fields(product_id = %product_id))]
    async fn get_price(&self, product_id: &ProductId) -> Result<CatalogEntry, CatalogError> {
        let response = self
            .client
            .get(join_url(&self.base_url, product_id))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(CatalogError::NotFound(product_id.clone())),
            status if !status.is_success() => Err(CatalogError::Unreachable(format!(
                "product service returned {status}"
            ))),
            _ => {
                let body: ProductBody = response.json().await?;
                Ok(CatalogEntry {
                    price: Money::from_decimal(body.price),
                    available: body.available,
                })
            }
        }
    }
}

#[derive(Serialize)]
struct PaymentBody<'a> {
    order_id: i64,
    user_id: i64,
    amount: f64,
    callback_url: &'a str,
}

/// Payment sink posting to the payment service.
#[derive(Debug, Clone)]
pub struct HttpPaymentSink {
    client: Client,
    url: String,
}

impl HttpPaymentSink {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl PaymentSink for HttpPaymentSink {
    async fn initiate(&self, request: &PaymentInitiation) -> Result<(), SinkError> {
        let body = PaymentBody {
            order_id: request.order_id.as_i64(),
            user_id: request.user_id.as_i64(),
            amount: request.amount.as_decimal(),
            callback_url: &request.callback_url,
        };

        let response = self.client.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(SinkError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct NotificationBody<'a> {
    user_id: i64,
    order_id: i64,
    total: f64,
    status: &'a str,
    message: &'a str,
}

/// Notification sink posting to the notification service.
#[derive(Debug, Clone)]
pub struct HttpNotificationSink {
    client: Client,
    url: String,
}

impl HttpNotificationSink {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for HttpNotificationSink {
    async fn send(&self, notification: &Notification) -> Result<(), SinkError> {
        let body = NotificationBody {
            user_id: notification.user_id.as_i64(),
            order_id: notification.order_id.as_i64(),
            total: notification.total.as_decimal(),
            status: notification.status.as_str(),
            message: &notification.message,
        };

        let response = self.client.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(SinkError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_handles_trailing_slash() {
        assert_eq!(join_url("http://cart/api", 5), "http://cart/api/5");
        assert_eq!(join_url("http://cart/api/", "p1"), "http://cart/api/p1");
    }

    #[test]
    fn test_cart_body_accepts_null_items() {
        let body: CartBody = serde_json::from_str(r#"{"user_id": "1", "items": null}"#).unwrap();
        assert!(body.items.is_none());
    }

    #[test]
    fn test_product_body_defaults_to_available() {
        let body: ProductBody = serde_json::from_str(r#"{"id": "p1", "price": 12.5}"#).unwrap();
        assert!(body.available);
        assert_eq!(Money::from_decimal(body.price), Money::from_cents(1250));
    }
}
