//! Payment provider callback.

use common::OrderId;
use serde::{Deserialize, Serialize};

/// Result reported by the payment provider.
///
/// Anything other than `success` or `failed` is kept verbatim as `Other`
/// and leaves the order untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentResult {
    Success,
    Failed,
    Other(String),
}

impl PaymentResult {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentResult::Success => "success",
            PaymentResult::Failed => "failed",
            PaymentResult::Other(s) => s,
        }
    }
}

impl From<String> for PaymentResult {
    fn from(s: String) -> Self {
        match s.as_str() {
            "success" => PaymentResult::Success,
            "failed" => PaymentResult::Failed,
            _ => PaymentResult::Other(s),
        }
    }
}

impl From<&str> for PaymentResult {
    fn from(s: &str) -> Self {
        PaymentResult::from(s.to_string())
    }
}

impl From<PaymentResult> for String {
    fn from(result: PaymentResult) -> Self {
        result.as_str().to_string()
    }
}

impl std::fmt::Display for PaymentResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One-shot payment result message. Consumed once, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCallback {
    /// Missing or zero IDs are rejected by the callback handler.
    #[serde(default, alias = "orderID")]
    pub order_id: Option<OrderId>,
    #[serde(rename = "status")]
    pub result: PaymentResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PaymentCallback {
    pub fn new(order_id: OrderId, result: impl Into<PaymentResult>) -> Self {
        Self {
            order_id: Some(order_id),
            result: result.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_parsing() {
        assert_eq!(PaymentResult::from("success"), PaymentResult::Success);
        assert_eq!(PaymentResult::from("failed"), PaymentResult::Failed);
        assert_eq!(
            PaymentResult::from("refunded"),
            PaymentResult::Other("refunded".to_string())
        );
    }

    #[test]
    fn test_callback_deserializes_provider_payload() {
        let cb: PaymentCallback =
            serde_json::from_str(r#"{"order_id": 12, "status": "failed", "message": "declined"}"#)
                .unwrap();
        assert_eq!(cb.order_id, Some(OrderId::new(12)));
        assert_eq!(cb.result, PaymentResult::Failed);
        assert_eq!(cb.message.as_deref(), Some("declined"));
    }

    #[test]
    fn test_callback_accepts_camel_case_id_and_missing_id() {
        let cb: PaymentCallback =
            serde_json::from_str(r#"{"orderID": 3, "status": "success"}"#).unwrap();
        assert_eq!(cb.order_id, Some(OrderId::new(3)));

        let cb: PaymentCallback = serde_json::from_str(r#"{"status": "success"}"#).unwrap();
        assert_eq!(cb.order_id, None);
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let cb: PaymentCallback =
            serde_json::from_str(r#"{"order_id": 1, "status": "pending_review"}"#).unwrap();
        assert_eq!(cb.result, PaymentResult::Other("pending_review".to_string()));
        let json = serde_json::to_value(&cb).unwrap();
        assert_eq!(json["status"], "pending_review");
    }
}
