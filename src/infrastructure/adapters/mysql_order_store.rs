use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{Money, Order, OrderId};
use crate::ports::order_store_port::OrderStorePort;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use tracing::debug;

/// MySQL-backed merchant order store
#[derive(Clone)]
pub struct MySqlOrderStore {
    pool: Arc<Pool<MySql>>,
}

impl MySqlOrderStore {
    pub fn new(pool: Arc<Pool<MySql>>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStorePort for MySqlOrderStore {
    async fn find_order(&self, order_id: &OrderId) -> DomainResult<Option<Order>> {
        let query = r#"
            SELECT id, status, total_cents, customer_id, transaction_id
            FROM shop_orders
            WHERE id = ?
        "#;

        let row = sqlx::query_as::<_, OrderRow>(query)
            .bind(order_id.as_str())
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(OrderRow::into_order))
    }

    /// Status swap and audit note commit together
    async fn transition_to(
        &self,
        order_id: &OrderId,
        expected_status: &str,
        status: &str,
        note: &str,
    ) -> DomainResult<bool> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let rows_affected = sqlx::query(
            "UPDATE shop_orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(status)
        .bind(now)
        .bind(order_id.as_str())
        .bind(expected_status)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            tx.rollback().await?;
            debug!(
                "Order {} not in status {}, transition to {} skipped",
                order_id, expected_status, status
            );
            return Ok(false);
        }

        sqlx::query("INSERT INTO shop_order_notes (order_id, note, created_at) VALUES (?, ?, ?)")
            .bind(order_id.as_str())
            .bind(note)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!("Order {} moved {} -> {}", order_id, expected_status, status);
        Ok(true)
    }

    async fn add_note(&self, order_id: &OrderId, note: &str) -> DomainResult<()> {
        sqlx::query("INSERT INTO shop_order_notes (order_id, note, created_at) VALUES (?, ?, ?)")
            .bind(order_id.as_str())
            .bind(note)
            .bind(Utc::now())
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    async fn attach_transaction_id(
        &self,
        order_id: &OrderId,
        transaction_id: &str,
    ) -> DomainResult<()> {
        let rows_affected = sqlx::query(
            "UPDATE shop_orders SET transaction_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(transaction_id)
        .bind(Utc::now())
        .bind(order_id.as_str())
        .execute(self.pool.as_ref())
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(DomainError::OrderNotFound(order_id.to_string()));
        }
        Ok(())
    }
}

/// Database row
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    status: String,
    total_cents: i64,
    customer_id: Option<i64>,
    transaction_id: Option<String>,
}

impl OrderRow {
    fn into_order(self) -> Order {
        Order {
            id: OrderId::new(self.id),
            status: self.status,
            total: Money::from_cents(self.total_cents),
            customer_id: self.customer_id,
            transaction_id: self.transaction_id,
        }
    }
}
