use crate::domain::errors::DomainResult;
use crate::domain::{LedgerEntry, OrderId};
use async_trait::async_trait;

/// Ledger port: durable provider status per order
#[async_trait]
pub trait LedgerPort: Send + Sync {
    /// Inserts the row for a freshly issued reference code.
    /// Fails with `DuplicateOrder` if the order already has one.
    async fn create(
        &self,
        order_id: &OrderId,
        reference_code: &str,
        provider_id: Option<&str>,
    ) -> DomainResult<LedgerEntry>;

    /// Overwrites status (and provider id when given) and sets the pending-apply flag,
    /// in one atomic row write. Fails with `NotFound` if the row is missing.
    async fn update_status(
        &self,
        order_id: &OrderId,
        provider_status: &str,
        provider_id: Option<&str>,
        mark_pending_apply: bool,
    ) -> DomainResult<()>;

    /// Orders whose provider status is still `PENDING`
    async fn list_pending(&self) -> DomainResult<Vec<OrderId>>;

    /// Rows waiting for the apply job
    async fn list_apply_pending(&self) -> DomainResult<Vec<LedgerEntry>>;

    async fn clear_pending_apply(&self, order_id: &OrderId) -> DomainResult<()>;

    /// Raw provider status, `None` when the order has no row
    async fn get_status(&self, order_id: &OrderId) -> DomainResult<Option<String>>;

    async fn find(&self, order_id: &OrderId) -> DomainResult<Option<LedgerEntry>>;
}
