use crate::application::transition_engine::OrderTransitionEngine;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{LedgerEntry, PaymentClass, TransitionSource};
use crate::ports::{LedgerPort, OrderStorePort};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Counters for one apply run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub processed: usize,
    /// Rows that changed an order status
    pub transitioned: usize,
    /// Missing orders, unknown statuses, already-applied outcomes
    pub skipped: usize,
    /// Rows whose transition raised an error
    pub failed: usize,
}

/// Applies ledger rows flagged by the batch job to their orders
pub struct ApplyJob<L: LedgerPort, O: OrderStorePort> {
    ledger: Arc<L>,
    orders: Arc<O>,
    engine: Arc<OrderTransitionEngine<O>>,
}

impl<L: LedgerPort, O: OrderStorePort> ApplyJob<L, O> {
    pub fn new(ledger: Arc<L>, orders: Arc<O>, engine: Arc<OrderTransitionEngine<O>>) -> Self {
        Self {
            ledger,
            orders,
            engine,
        }
    }

    /// Self-draining: every visited row has its flag cleared, whatever the outcome.
    /// Only ledger reads/writes abort the run.
    pub async fn run(&self) -> DomainResult<ApplyReport> {
        let rows = self.ledger.list_apply_pending().await?;
        let mut report = ApplyReport::default();

        if rows.is_empty() {
            info!("Apply job: nothing to apply");
            return Ok(report);
        }

        info!("Apply job started for {} orders", rows.len());

        for row in rows {
            report.processed += 1;
            match self.apply_row(&row).await {
                Ok(true) => report.transitioned += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    error!("Apply job failed for order {}: {}", row.order_id, e);
                    report.failed += 1;
                }
            }
            self.ledger.clear_pending_apply(&row.order_id).await?;
        }

        info!(
            "Apply job completed: {} processed, {} transitioned, {} skipped, {} failed",
            report.processed, report.transitioned, report.skipped, report.failed
        );
        Ok(report)
    }

    async fn apply_row(&self, row: &LedgerEntry) -> DomainResult<bool> {
        if self.orders.find_order(&row.order_id).await?.is_none() {
            warn!(
                "Order {} from the PayByBank ledger no longer exists, clearing its flag",
                row.order_id
            );
            return Ok(false);
        }

        let class = row.classification();
        let Some(outcome) = class.outcome() else {
            if let PaymentClass::Unknown(status) = class {
                warn!("Unknown PayByBank status {} for order {}", status, row.order_id);
            }
            return Ok(false);
        };

        match self
            .engine
            .apply(
                &row.order_id,
                outcome,
                row.provider_id.as_deref(),
                TransitionSource::Reconciliation,
            )
            .await
        {
            Ok(result) => Ok(result.changed_status()),
            // deleted between lookup and transition
            Err(DomainError::OrderNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
