//! Request and response types of the checkout service itself.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Product;

/// Request body for starting a checkout.
///
/// Sent by the storefront; the service answers with a redirect to the
/// signed gateway URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub products: Vec<Product>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub paid_content: Option<String>,
}

/// Order status for API responses.
///
/// This is the API/DTO version. For the stored record, see
/// `paylink-core::entities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
    Failed,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Paid => write!(f, "paid"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
            OrderStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub status: OrderStatus,
    /// Sum of the order's line items.
    pub expected_sum: Decimal,
    /// Sum reported by the gateway, once paid.
    pub paid_sum: Option<Decimal>,
    /// Unix timestamp of when the order was created.
    pub created_at: i64,
    pub paid_at: Option<i64>,
}
