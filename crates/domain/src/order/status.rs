//! Order status state machine.

use serde::{Deserialize, Serialize};

use crate::payment::PaymentResult;

use super::OrderError;

/// The status of an order in its payment lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Paid ──────────► Completed
///           └──► PaymentFailed
/// ```
///
/// `Completed` is only reached through a fulfillment step outside the
/// payment callback path. No state ever goes back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order persisted, awaiting the payment result.
    #[default]
    Pending,

    /// Payment provider reported success.
    Paid,

    /// Payment provider reported failure (terminal for the payment path).
    PaymentFailed,

    /// Order fulfilled (terminal state).
    Completed,
}

/// Outcome of applying a payment result to an order's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentTransition {
    /// The order moves to the given status.
    Advance(OrderStatus),

    /// The result carries no decision; the order stays `Pending`.
    Unchanged,

    /// The order already left `Pending`; the callback is a duplicate or late.
    Rejected,
}

impl OrderStatus {
    /// Returns true if the order is still awaiting its payment result.
    pub fn is_pending(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::PaymentFailed | OrderStatus::Completed)
    }

    /// Returns true if moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Paid)
                | (OrderStatus::Pending, OrderStatus::PaymentFailed)
                | (OrderStatus::Paid, OrderStatus::Completed)
        )
    }

    /// Applies a payment callback result to this status.
    pub fn on_payment(&self, result: &PaymentResult) -> PaymentTransition {
        if !self.is_pending() {
            return PaymentTransition::Rejected;
        }
        match result {
            PaymentResult::Success => PaymentTransition::Advance(OrderStatus::Paid),
            PaymentResult::Failed => PaymentTransition::Advance(OrderStatus::PaymentFailed),
            PaymentResult::Other(_) => PaymentTransition::Unchanged,
        }
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::PaymentFailed => "payment_failed",
            OrderStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "payment_failed" => Ok(OrderStatus::PaymentFailed),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}
