use paylink_sdk::objects::checkout::{OrderResponse, OrderStatus as SdkOrderStatus};
use paylink_sdk::objects::{PaymentStatus, Product};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub order_id: Uuid,
    pub created_at: time::OffsetDateTime,
    pub status: OrderStatus,
    pub products: Vec<Product>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub paid_content: Option<String>,
    pub expected_sum: Decimal,
    pub paid_sum: Option<Decimal>,
    pub paid_at: Option<time::OffsetDateTime>,
    /// Last status the gateway reported for this order.
    pub gateway_status: Option<PaymentStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub products: Vec<Product>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub paid_content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
    Failed,
}

impl OrderRecord {
    /// Build a pending record for `order`.
    pub fn pending(order: NewOrder, now: time::OffsetDateTime) -> Self {
        let expected_sum = order.products.iter().map(Product::total).sum();
        Self {
            order_id: Uuid::new_v4(),
            created_at: now,
            status: OrderStatus::Pending,
            products: order.products,
            customer_email: order.customer_email,
            customer_phone: order.customer_phone,
            paid_content: order.paid_content,
            expected_sum,
            paid_sum: None,
            paid_at: None,
            gateway_status: None,
        }
    }

    /// Convert into the API model.
    pub fn to_response(&self) -> OrderResponse {
        OrderResponse {
            order_id: self.order_id,
            status: self.status.into(),
            expected_sum: self.expected_sum,
            paid_sum: self.paid_sum,
            created_at: self.created_at.unix_timestamp(),
            paid_at: self.paid_at.map(|at| at.unix_timestamp()),
        }
    }
}

impl From<OrderStatus> for SdkOrderStatus {
    fn from(value: OrderStatus) -> Self {
        match value {
            OrderStatus::Pending => SdkOrderStatus::Pending,
            OrderStatus::Paid => SdkOrderStatus::Paid,
            OrderStatus::Cancelled => SdkOrderStatus::Cancelled,
            OrderStatus::Failed => SdkOrderStatus::Failed,
        }
    }
}
