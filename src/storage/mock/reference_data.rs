//! Mock ReferenceData implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::interfaces::{ReferenceData, Result};
use crate::model::{Customer, CustomerId, Order, OrderId, Rep, RepId};

/// In-memory orders, customers and reps.
#[derive(Default)]
pub struct MockReferenceData {
    orders: RwLock<HashMap<OrderId, Order>>,
    customers: RwLock<HashMap<CustomerId, Customer>>,
    reps: RwLock<HashMap<RepId, Rep>>,
}

impl MockReferenceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an order (administrative correction).
    pub async fn put_order(&self, order: Order) {
        self.orders.write().await.insert(order.id.clone(), order);
    }

    pub async fn put_customer(&self, customer: Customer) {
        self.customers
            .write()
            .await
            .insert(customer.id.clone(), customer);
    }

    pub async fn put_rep(&self, rep: Rep) {
        self.reps.write().await.insert(rep.id.clone(), rep);
    }
}

#[async_trait]
impl ReferenceData for MockReferenceData {
    async fn order(&self, id: &OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn customer(&self, id: &CustomerId) -> Result<Option<Customer>> {
        Ok(self.customers.read().await.get(id).cloned())
    }

    async fn rep(&self, id: &RepId) -> Result<Option<Rep>> {
        Ok(self.reps.read().await.get(id).cloned())
    }
}
