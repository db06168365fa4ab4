//! Order storage.
//!
//! Handlers only see the [`OrderStore`] trait. [`MemoryOrderStore`] keeps
//! everything in process memory; a relational backend implements the same
//! trait.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::entities::{NewOrder, OrderRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("order not found: {0}")]
    NotFound(Uuid),
}

/// A change applied to a stored order.
pub type Mutation = Box<dyn FnOnce(&mut OrderRecord) + Send>;

/// Snapshot of an order before and after a [`Mutation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderChange {
    pub before: OrderRecord,
    pub after: OrderRecord,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new pending order.
    async fn insert(&self, order: NewOrder) -> Result<OrderRecord, StoreError>;

    async fn get(&self, order_id: Uuid) -> Result<Option<OrderRecord>, StoreError>;

    /// Apply `mutation` atomically with respect to other calls on the same
    /// store.
    async fn modify(&self, order_id: Uuid, mutation: Mutation) -> Result<OrderChange, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<Uuid, OrderRecord>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<OrderRecord, StoreError> {
        let record = OrderRecord::pending(order, time::OffsetDateTime::now_utc());
        self.orders
            .write()
            .await
            .insert(record.order_id, record.clone());
        Ok(record)
    }

    async fn get(&self, order_id: Uuid) -> Result<Option<OrderRecord>, StoreError> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn modify(&self, order_id: Uuid, mutation: Mutation) -> Result<OrderChange, StoreError> {
        let mut orders = self.orders.write().await;
        let record = orders
            .get_mut(&order_id)
            .ok_or(StoreError::NotFound(order_id))?;
        let before = record.clone();
        mutation(&mut *record);
        Ok(OrderChange {
            before,
            after: record.clone(),
        })
    }
}
