use crate::domain::errors::DomainResult;
use crate::domain::{Order, OrderId};
use async_trait::async_trait;

/// Merchant order store port
///
/// Side effects of a status change (stock, customer emails) belong to the store.
#[async_trait]
pub trait OrderStorePort: Send + Sync {
    async fn find_order(&self, order_id: &OrderId) -> DomainResult<Option<Order>>;

    /// Compare-and-swap status change with an audit note.
    /// Returns `false` when the order is no longer in `expected_status`.
    async fn transition_to(
        &self,
        order_id: &OrderId,
        expected_status: &str,
        status: &str,
        note: &str,
    ) -> DomainResult<bool>;

    /// Appends an audit note without touching the status
    async fn add_note(&self, order_id: &OrderId, note: &str) -> DomainResult<()>;

    /// Idempotent when the same id is attached again
    async fn attach_transaction_id(&self, order_id: &OrderId, transaction_id: &str)
        -> DomainResult<()>;
}
