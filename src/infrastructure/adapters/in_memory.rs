use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{LedgerEntry, Order, OrderId};
use crate::ports::{LedgerPort, OrderStorePort};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Ledger kept in a map; each call holds the write lock for the whole row update
#[derive(Default)]
pub struct InMemoryLedger {
    rows: RwLock<BTreeMap<OrderId, LedgerEntry>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entry(&self, order_id: &str) -> Option<LedgerEntry> {
        self.rows.read().await.get(&OrderId::from(order_id)).cloned()
    }
}

#[async_trait]
impl LedgerPort for InMemoryLedger {
    async fn create(
        &self,
        order_id: &OrderId,
        reference_code: &str,
        provider_id: Option<&str>,
    ) -> DomainResult<LedgerEntry> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(order_id) {
            return Err(DomainError::DuplicateOrder(order_id.to_string()));
        }

        let entry = LedgerEntry::new(
            order_id.clone(),
            reference_code.to_string(),
            provider_id.map(str::to_string),
        )?;
        rows.insert(order_id.clone(), entry.clone());
        Ok(entry)
    }

    async fn update_status(
        &self,
        order_id: &OrderId,
        provider_status: &str,
        provider_id: Option<&str>,
        mark_pending_apply: bool,
    ) -> DomainResult<()> {
        let mut rows = self.rows.write().await;
        let entry = rows
            .get_mut(order_id)
            .ok_or_else(|| DomainError::NotFound(order_id.to_string()))?;

        entry.provider_status = provider_status.to_string();
        if let Some(id) = provider_id {
            entry.provider_id = Some(id.to_string());
        }
        entry.pending_apply = mark_pending_apply;
        Ok(())
    }

    async fn list_pending(&self) -> DomainResult<Vec<OrderId>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|entry| entry.is_pending())
            .map(|entry| entry.order_id.clone())
            .collect())
    }

    async fn list_apply_pending(&self) -> DomainResult<Vec<LedgerEntry>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|entry| entry.pending_apply)
            .cloned()
            .collect())
    }

    async fn clear_pending_apply(&self, order_id: &OrderId) -> DomainResult<()> {
        let mut rows = self.rows.write().await;
        let entry = rows
            .get_mut(order_id)
            .ok_or_else(|| DomainError::NotFound(order_id.to_string()))?;
        entry.pending_apply = false;
        Ok(())
    }

    async fn get_status(&self, order_id: &OrderId) -> DomainResult<Option<String>> {
        Ok(self
            .rows
            .read()
            .await
            .get(order_id)
            .map(|entry| entry.provider_status.clone()))
    }

    async fn find(&self, order_id: &OrderId) -> DomainResult<Option<LedgerEntry>> {
        Ok(self.rows.read().await.get(order_id).cloned())
    }
}

/// Order store double that records every note and status change
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
    notes: RwLock<HashMap<OrderId, Vec<String>>>,
    transitions: RwLock<Vec<(OrderId, String)>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, order: Order) {
        self.orders.write().await.insert(order.id.clone(), order);
    }

    pub async fn order(&self, order_id: &str) -> Option<Order> {
        self.orders.read().await.get(&OrderId::from(order_id)).cloned()
    }

    pub async fn notes(&self, order_id: &str) -> Vec<String> {
        self.notes
            .read()
            .await
            .get(&OrderId::from(order_id))
            .cloned()
            .unwrap_or_default()
    }

    /// Status changes applied to one order, in order
    pub async fn transitions(&self, order_id: &str) -> Vec<String> {
        self.transitions
            .read()
            .await
            .iter()
            .filter(|(id, _)| id.as_str() == order_id)
            .map(|(_, status)| status.clone())
            .collect()
    }
}

#[async_trait]
impl OrderStorePort for InMemoryOrderStore {
    async fn find_order(&self, order_id: &OrderId) -> DomainResult<Option<Order>> {
        Ok(self.orders.read().await.get(order_id).cloned())
    }

    async fn transition_to(
        &self,
        order_id: &OrderId,
        expected_status: &str,
        status: &str,
        note: &str,
    ) -> DomainResult<bool> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| DomainError::OrderNotFound(order_id.to_string()))?;

        if order.status != expected_status {
            return Ok(false);
        }

        order.status = status.to_string();
        self.transitions
            .write()
            .await
            .push((order_id.clone(), status.to_string()));
        self.notes
            .write()
            .await
            .entry(order_id.clone())
            .or_default()
            .push(note.to_string());
        Ok(true)
    }

    async fn add_note(&self, order_id: &OrderId, note: &str) -> DomainResult<()> {
        self.notes
            .write()
            .await
            .entry(order_id.clone())
            .or_default()
            .push(note.to_string());
        Ok(())
    }

    async fn attach_transaction_id(
        &self,
        order_id: &OrderId,
        transaction_id: &str,
    ) -> DomainResult<()> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| DomainError::OrderNotFound(order_id.to_string()))?;
        order.transaction_id = Some(transaction_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_duplicate_create() {
        let ledger = InMemoryLedger::new();
        let id = OrderId::from("42");

        ledger.create(&id, "RF42", None).await.unwrap();
        let result = ledger.create(&id, "RF42-again", None).await;

        assert!(matches!(result, Err(DomainError::DuplicateOrder(_))));
        assert_eq!(ledger.entry("42").await.unwrap().reference_code, "RF42");
    }

    #[tokio::test]
    async fn test_update_missing_row() {
        let ledger = InMemoryLedger::new();
        let result = ledger
            .update_status(&OrderId::from("7"), "PAID", None, false)
            .await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_updates_never_mix_fields() {
        let ledger = Arc::new(InMemoryLedger::new());
        let id = OrderId::from("42");
        ledger.create(&id, "RF42", None).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..50 {
            let ledger = ledger.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                let (status, provider_id) = if i % 2 == 0 {
                    ("PAID", format!("tx-{}", i))
                } else {
                    ("CANCELLED", format!("tx-{}", i))
                };
                ledger
                    .update_status(&id, status, Some(&provider_id), i % 2 == 0)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // every write set status, id and flag together, so they must agree
        let entry = ledger.entry("42").await.unwrap();
        let n: usize = entry
            .provider_id
            .as_deref()
            .and_then(|id| id.strip_prefix("tx-"))
            .and_then(|n| n.parse().ok())
            .unwrap();
        let expected_status = if n % 2 == 0 { "PAID" } else { "CANCELLED" };
        assert_eq!(entry.provider_status, expected_status);
        assert_eq!(entry.pending_apply, n % 2 == 0);
    }

    #[tokio::test]
    async fn test_update_keeps_provider_id_when_not_supplied() {
        let ledger = InMemoryLedger::new();
        let id = OrderId::from("42");
        ledger.create(&id, "RF42", Some("991")).await.unwrap();

        ledger.update_status(&id, "PAID", None, true).await.unwrap();

        let entry = ledger.entry("42").await.unwrap();
        assert_eq!(entry.provider_id.as_deref(), Some("991"));
        assert!(entry.pending_apply);
        assert_eq!(ledger.get_status(&id).await.unwrap().as_deref(), Some("PAID"));
        assert_eq!(ledger.get_status(&OrderId::from("7")).await.unwrap(), None);
        assert!(ledger.list_pending().await.unwrap().is_empty());
        assert_eq!(ledger.list_apply_pending().await.unwrap().len(), 1);
    }
}
