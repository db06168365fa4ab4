use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Signable;

/// What the gateway should do with the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkAction {
    /// Return a payment page link.
    #[default]
    Link,
    /// Send the buyer straight to payment.
    Pay,
}

/// A line item of a payment link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    /// Unit price; serialized as a decimal string.
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

impl Product {
    /// `price * quantity`.
    pub fn total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Payload of an outbound payment link.
///
/// Signed before flattening; optional fields are left out of both the
/// signature and the query string when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLinkRequest {
    #[serde(rename = "do")]
    pub action: LinkAction,
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    pub products: Vec<Product>,
    #[serde(
        rename = "urlReturn",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub url_return: Option<String>,
    #[serde(
        rename = "urlSuccess",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub url_success: Option<String>,
    #[serde(
        rename = "urlNotification",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub url_notification: Option<String>,
    /// Text shown to the buyer once the payment succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_content: Option<String>,
    /// Integration identifier agreed with the gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sys: Option<String>,
}

impl PaymentLinkRequest {
    /// Sum of all line item totals.
    pub fn total(&self) -> Decimal {
        self.products.iter().map(Product::total).sum()
    }
}

impl Signable for PaymentLinkRequest {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> PaymentLinkRequest {
        PaymentLinkRequest {
            action: LinkAction::Link,
            order_id: "42".to_owned(),
            customer_email: Some("buyer@example.com".to_owned()),
            customer_phone: None,
            products: vec![
                Product {
                    name: "Курс по Rust".to_owned(),
                    price: Decimal::new(150000, 2),
                    quantity: 1,
                    sku: None,
                },
                Product {
                    name: "Book".to_owned(),
                    price: Decimal::new(99050, 2),
                    quantity: 2,
                    sku: Some("book-1".to_owned()),
                },
            ],
            url_return: Some("https://example.com/return".to_owned()),
            url_success: None,
            url_notification: None,
            paid_content: None,
            sys: None,
        }
    }

    #[test]
    fn test_wire_field_names() {
        let value = serde_json::to_value(request()).unwrap();
        assert_eq!(value["do"], "link");
        assert_eq!(value["urlReturn"], "https://example.com/return");
        assert_eq!(value["products"][0]["price"], "1500.00");
        assert!(value.get("customer_phone").is_none());
        assert!(value["products"][0].get("sku").is_none());
    }

    #[test]
    fn test_typed_and_untyped_payloads_sign_alike() {
        let untyped = json!({
            "urlReturn": "https://example.com/return",
            "products": [
                { "quantity": 1, "price": "1500.00", "name": "Курс по Rust" },
                { "sku": "book-1", "quantity": 2, "price": "990.50", "name": "Book" }
            ],
            "order_id": "42",
            "do": "link",
            "customer_email": "buyer@example.com"
        });
        assert_eq!(
            request().signature(b"test-secret").unwrap(),
            crate::signature::sign(&untyped, b"test-secret").unwrap()
        );
    }

    #[test]
    fn test_total() {
        assert_eq!(request().total(), Decimal::new(348100, 2));
    }
}
