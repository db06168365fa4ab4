//! Payment notification (webhook) payload.
//!
//! The gateway posts the notification form-encoded with a `Sign` header.
//! Verification has to run on the parsed, untyped body: this struct drops
//! fields it does not know, so re-signing it would not reproduce the
//! gateway's signature.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment outcome reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Success,
    OrderApproved,
    OrderCanceled,
    OrderDenied,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Success => write!(f, "success"),
            PaymentStatus::OrderApproved => write!(f, "order_approved"),
            PaymentStatus::OrderCanceled => write!(f, "order_canceled"),
            PaymentStatus::OrderDenied => write!(f, "order_denied"),
            PaymentStatus::Other => write!(f, "other"),
        }
    }
}

/// Line item echoed back in a notification. Every field arrives as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifiedProduct {
    pub name: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub sum: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub order_id: String,
    #[serde(default)]
    pub order_num: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    pub sum: Decimal,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_status_description: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub products: Vec<NotifiedProduct>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::parse;

    #[test]
    fn test_deserialize_parsed_body() {
        let body = "date=2026-01-15T12%3A00%3A00%2B03%3A00&order_id=42&order_num=42&sum=3481.00\
                    &payment_status=success&customer_email=buyer%40example.com\
                    &products%5B0%5D%5Bname%5D=Book&products%5B0%5D%5Bprice%5D=990.50\
                    &products%5B0%5D%5Bquantity%5D=2&products%5B0%5D%5Bsum%5D=1981.00\
                    &attempt=1";
        let notification: PaymentNotification = serde_json::from_value(parse(body)).unwrap();

        assert_eq!(notification.order_id, "42");
        assert_eq!(notification.sum, Decimal::new(348100, 2));
        assert_eq!(notification.payment_status, PaymentStatus::Success);
        assert_eq!(notification.date.as_deref(), Some("2026-01-15T12:00:00+03:00"));
        assert_eq!(notification.products.len(), 1);
        assert_eq!(notification.products[0].sum, Some(Decimal::new(198100, 2)));
    }

    #[test]
    fn test_unknown_status() {
        let status: PaymentStatus = serde_json::from_str(r#""refund_pending""#).unwrap();
        assert_eq!(status, PaymentStatus::Other);
    }
}
