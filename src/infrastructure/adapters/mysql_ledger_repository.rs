use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{LedgerEntry, OrderId};
use crate::ports::ledger_port::LedgerPort;
use async_trait::async_trait;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use tracing::{debug, error};

/// MySQL ledger of PayByBank payment statuses
#[derive(Clone)]
pub struct MySqlLedgerRepository {
    pool: Arc<Pool<MySql>>,
}

impl MySqlLedgerRepository {
    pub fn new(pool: Arc<Pool<MySql>>) -> Self {
        Self { pool }
    }

    async fn exists(&self, order_id: &OrderId) -> DomainResult<bool> {
        let found: Option<(String,)> =
            sqlx::query_as("SELECT order_id FROM pbb_payment_orders WHERE order_id = ?")
                .bind(order_id.as_str())
                .fetch_optional(self.pool.as_ref())
                .await?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl LedgerPort for MySqlLedgerRepository {
    async fn create(
        &self,
        order_id: &OrderId,
        reference_code: &str,
        provider_id: Option<&str>,
    ) -> DomainResult<LedgerEntry> {
        let entry = LedgerEntry::new(
            order_id.clone(),
            reference_code.to_string(),
            provider_id.map(str::to_string),
        )?;

        let query = r#"
            INSERT INTO pbb_payment_orders (
                order_id, provider_id, reference_code, provider_status,
                pending_apply, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(entry.order_id.as_str())
            .bind(&entry.provider_id)
            .bind(&entry.reference_code)
            .bind(&entry.provider_status)
            .bind(entry.pending_apply)
            .bind(entry.created_at)
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    DomainError::DuplicateOrder(order_id.to_string())
                }
                _ => DomainError::DatabaseError(e),
            })?;

        debug!("Ledger entry created: {}", order_id);
        Ok(entry)
    }

    /// Single UPDATE so status, provider id and flag always land together
    async fn update_status(
        &self,
        order_id: &OrderId,
        provider_status: &str,
        provider_id: Option<&str>,
        mark_pending_apply: bool,
    ) -> DomainResult<()> {
        let query = r#"
            UPDATE pbb_payment_orders
            SET provider_status = ?, provider_id = COALESCE(?, provider_id), pending_apply = ?
            WHERE order_id = ?
        "#;

        let rows_affected = sqlx::query(query)
            .bind(provider_status)
            .bind(provider_id)
            .bind(mark_pending_apply)
            .bind(order_id.as_str())
            .execute(self.pool.as_ref())
            .await?
            .rows_affected();

        // MySQL reports 0 for a matched row whose values didn't change
        if rows_affected == 0 && !self.exists(order_id).await? {
            error!("No ledger entry to update: {}", order_id);
            return Err(DomainError::NotFound(order_id.to_string()));
        }

        debug!(
            "Ledger entry updated: {} -> {} (pending apply: {})",
            order_id, provider_status, mark_pending_apply
        );
        Ok(())
    }

    async fn list_pending(&self) -> DomainResult<Vec<OrderId>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT order_id FROM pbb_payment_orders WHERE provider_status = 'PENDING' ORDER BY order_id",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(|(id,)| OrderId::new(id)).collect())
    }

    async fn list_apply_pending(&self) -> DomainResult<Vec<LedgerEntry>> {
        let query = r#"
            SELECT order_id, provider_id, reference_code, provider_status,
                   pending_apply, created_at
            FROM pbb_payment_orders
            WHERE pending_apply = 1
            ORDER BY order_id
        "#;

        let rows = sqlx::query_as::<_, LedgerRow>(query)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(LedgerRow::into_entry).collect())
    }

    async fn clear_pending_apply(&self, order_id: &OrderId) -> DomainResult<()> {
        sqlx::query("UPDATE pbb_payment_orders SET pending_apply = 0 WHERE order_id = ?")
            .bind(order_id.as_str())
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    async fn get_status(&self, order_id: &OrderId) -> DomainResult<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT provider_status FROM pbb_payment_orders WHERE order_id = ?")
                .bind(order_id.as_str())
                .fetch_optional(self.pool.as_ref())
                .await?;
        Ok(row.map(|(status,)| status))
    }

    async fn find(&self, order_id: &OrderId) -> DomainResult<Option<LedgerEntry>> {
        let query = r#"
            SELECT order_id, provider_id, reference_code, provider_status,
                   pending_apply, created_at
            FROM pbb_payment_orders
            WHERE order_id = ?
        "#;

        let row = sqlx::query_as::<_, LedgerRow>(query)
            .bind(order_id.as_str())
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(LedgerRow::into_entry))
    }
}

/// Database row
#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    order_id: String,
    provider_id: Option<String>,
    reference_code: String,
    provider_status: String,
    pending_apply: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl LedgerRow {
    fn into_entry(self) -> LedgerEntry {
        LedgerEntry {
            order_id: OrderId::new(self.order_id),
            provider_id: self.provider_id,
            reference_code: self.reference_code,
            provider_status: self.provider_status,
            pending_apply: self.pending_apply,
            created_at: self.created_at,
        }
    }
}
