//! Reference data interface.

use async_trait::async_trait;

use super::commission_store::Result;
use crate::model::{Customer, CustomerId, Order, OrderId, Rep, RepId};

/// Read-only access to imported orders, customers and reps.
///
/// Implementations:
/// - `MockReferenceData`: in-memory fixtures
#[async_trait]
pub trait ReferenceData: Send + Sync {
    /// Order with all of its line items.
    async fn order(&self, id: &OrderId) -> Result<Option<Order>>;

    /// Customer with its relationship history.
    async fn customer(&self, id: &CustomerId) -> Result<Option<Customer>>;

    async fn rep(&self, id: &RepId) -> Result<Option<Rep>>;
}
