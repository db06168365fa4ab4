//! Applying verified payment outcomes to orders.
//!
//! Callers must verify the gateway signature before calling into this
//! module; nothing here looks at signatures.
//!
//! Transitions:
//!
//! | reported status              | from      | to          |
//! |------------------------------|-----------|-------------|
//! | `success` / `order_approved` | not paid  | `Paid`      |
//! | `order_canceled`             | `Pending` | `Cancelled` |
//! | `order_denied`               | `Pending` | `Failed`    |
//! | anything else                | any       | unchanged   |
//!
//! A paid order is never moved out of `Paid`.

use paylink_sdk::objects::{PaymentNotification, PaymentStatus};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::{OrderRecord, OrderStatus};
use crate::store::{OrderStore, StoreError};

#[derive(Debug, Error)]
pub enum OutcomeError {
    /// The gateway named an order this service does not know.
    #[error("unknown order: {0}")]
    UnknownOrder(String),
}

impl From<StoreError> for OutcomeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => OutcomeError::UnknownOrder(id.to_string()),
        }
    }
}

/// What applying an outcome did to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Transitioned { from: OrderStatus, to: OrderStatus },
    Unchanged { status: OrderStatus },
}

/// Update `record` for a reported gateway status.
///
/// `sum` is the amount the gateway says was charged, when it says one.
pub fn settle(
    record: &mut OrderRecord,
    status: PaymentStatus,
    sum: Option<Decimal>,
    now: time::OffsetDateTime,
) {
    record.gateway_status = Some(status);
    match status {
        PaymentStatus::Success | PaymentStatus::OrderApproved => {
            if record.status != OrderStatus::Paid {
                record.status = OrderStatus::Paid;
                record.paid_sum = sum;
                record.paid_at = Some(now);
            }
        }
        PaymentStatus::OrderCanceled if record.status == OrderStatus::Pending => {
            record.status = OrderStatus::Cancelled;
        }
        PaymentStatus::OrderDenied if record.status == OrderStatus::Pending => {
            record.status = OrderStatus::Failed;
        }
        _ => {}
    }
}

/// Apply a reported status to the order named by `order_id`.
pub async fn apply_status(
    store: &dyn OrderStore,
    order_id: &str,
    status: PaymentStatus,
    sum: Option<Decimal>,
) -> Result<Applied, OutcomeError> {
    let id = Uuid::parse_str(order_id).map_err(|_| OutcomeError::UnknownOrder(order_id.to_owned()))?;
    let now = time::OffsetDateTime::now_utc();
    let change = store
        .modify(
            id,
            Box::new(move |record: &mut OrderRecord| settle(record, status, sum, now)),
        )
        .await?;

    let (from, to) = (change.before.status, change.after.status);
    if from == to {
        info!(order_id = %id, %status, status_now = ?to, "Payment outcome left order unchanged");
        return Ok(Applied::Unchanged { status: to });
    }

    let mismatch = change
        .after
        .paid_sum
        .filter(|paid| *paid != change.after.expected_sum);
    if let (OrderStatus::Paid, Some(paid)) = (to, mismatch) {
        warn!(
            order_id = %id,
            expected = %change.after.expected_sum,
            paid = %paid,
            "Paid sum differs from order total"
        );
    }
    info!(order_id = %id, %status, ?from, ?to, "Order status updated from payment outcome");
    Ok(Applied::Transitioned { from, to })
}

/// Apply a verified webhook notification.
pub async fn apply_notification(
    store: &dyn OrderStore,
    notification: &PaymentNotification,
) -> Result<Applied, OutcomeError> {
    apply_status(
        store,
        &notification.order_id,
        notification.payment_status,
        Some(notification.sum),
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::NewOrder;
    use crate::store::MemoryOrderStore;
    use paylink_sdk::objects::Product;

    async fn pending(store: &MemoryOrderStore) -> OrderRecord {
        store
            .insert(NewOrder {
                products: vec![Product {
                    name: "Book".to_owned(),
                    price: Decimal::new(99050, 2),
                    quantity: 1,
                    sku: None,
                }],
                customer_email: None,
                customer_phone: None,
                paid_content: None,
            })
            .await
            .unwrap()
    }

    fn notification(order_id: Uuid, status: PaymentStatus) -> PaymentNotification {
        PaymentNotification {
            order_id: order_id.to_string(),
            order_num: None,
            date: None,
            sum: Decimal::new(99050, 2),
            payment_status: status,
            payment_status_description: None,
            customer_email: None,
            customer_phone: None,
            products: vec![],
        }
    }

    #[tokio::test]
    async fn test_success_marks_paid() {
        let store = MemoryOrderStore::new();
        let order = pending(&store).await;

        let applied = apply_notification(&store, &notification(order.order_id, PaymentStatus::Success))
            .await
            .unwrap();
        assert_eq!(
            applied,
            Applied::Transitioned {
                from: OrderStatus::Pending,
                to: OrderStatus::Paid
            }
        );

        let stored = store.get(order.order_id).await.unwrap().unwrap();
        assert_eq!(stored.paid_sum, Some(Decimal::new(99050, 2)));
        assert!(stored.paid_at.is_some());
        assert_eq!(stored.gateway_status, Some(PaymentStatus::Success));
    }

    #[tokio::test]
    async fn test_repeated_success_is_idempotent() {
        let store = MemoryOrderStore::new();
        let order = pending(&store).await;
        let paid = notification(order.order_id, PaymentStatus::Success);

        apply_notification(&store, &paid).await.unwrap();
        let first_paid_at = store.get(order.order_id).await.unwrap().unwrap().paid_at;

        let applied = apply_notification(&store, &paid).await.unwrap();
        assert_eq!(applied, Applied::Unchanged { status: OrderStatus::Paid });
        let stored = store.get(order.order_id).await.unwrap().unwrap();
        assert_eq!(stored.paid_at, first_paid_at);
    }

    #[tokio::test]
    async fn test_paid_order_is_never_downgraded() {
        let store = MemoryOrderStore::new();
        let order = pending(&store).await;
        apply_notification(&store, &notification(order.order_id, PaymentStatus::Success))
            .await
            .unwrap();

        for status in [PaymentStatus::OrderCanceled, PaymentStatus::OrderDenied] {
            let applied = apply_notification(&store, &notification(order.order_id, status))
                .await
                .unwrap();
            assert_eq!(applied, Applied::Unchanged { status: OrderStatus::Paid });
        }
    }

    #[tokio::test]
    async fn test_cancel_and_deny_from_pending() {
        let store = MemoryOrderStore::new();
        let cancelled = pending(&store).await;
        let denied = pending(&store).await;

        apply_notification(&store, &notification(cancelled.order_id, PaymentStatus::OrderCanceled))
            .await
            .unwrap();
        apply_notification(&store, &notification(denied.order_id, PaymentStatus::OrderDenied))
            .await
            .unwrap();

        let status = |record: Option<OrderRecord>| record.unwrap().status;
        assert_eq!(status(store.get(cancelled.order_id).await.unwrap()), OrderStatus::Cancelled);
        assert_eq!(status(store.get(denied.order_id).await.unwrap()), OrderStatus::Failed);
    }

    #[tokio::test]
    async fn test_other_status_is_recorded_only() {
        let store = MemoryOrderStore::new();
        let order = pending(&store).await;
        let applied = apply_notification(&store, &notification(order.order_id, PaymentStatus::Other))
            .await
            .unwrap();
        assert_eq!(applied, Applied::Unchanged { status: OrderStatus::Pending });
        let stored = store.get(order.order_id).await.unwrap().unwrap();
        assert_eq!(stored.gateway_status, Some(PaymentStatus::Other));
    }

    #[tokio::test]
    async fn test_unknown_orders() {
        let store = MemoryOrderStore::new();
        let result = apply_status(&store, "not-a-uuid", PaymentStatus::Success, None).await;
        assert!(matches!(result, Err(OutcomeError::UnknownOrder(id)) if id == "not-a-uuid"));

        let missing = Uuid::new_v4();
        let result = apply_notification(&store, &notification(missing, PaymentStatus::Success)).await;
        assert!(matches!(result, Err(OutcomeError::UnknownOrder(_))));
    }
}
