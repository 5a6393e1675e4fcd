use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{OrderId, PENDING_STATUS};
use crate::ports::{ApplyJobDispatcher, LedgerPort, PayByBankPort};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Largest batch the provider accepts in one bulk status query
pub const MAX_BATCH_SIZE: usize = 100;

/// Batch reconciliation: polls the provider for every pending ledger row.
///
/// Only the ledger is written here; order changes are deferred to the apply job.
pub struct ReconciliationJob<P: PayByBankPort, L: LedgerPort> {
    provider: Arc<P>,
    ledger: Arc<L>,
    dispatcher: Arc<dyn ApplyJobDispatcher>,
    batch_size: usize,
}

impl<P: PayByBankPort, L: LedgerPort> ReconciliationJob<P, L> {
    pub fn new(
        provider: Arc<P>,
        ledger: Arc<L>,
        dispatcher: Arc<dyn ApplyJobDispatcher>,
        batch_size: usize,
    ) -> Self {
        Self {
            provider,
            ledger,
            dispatcher,
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    /// Returns the orders whose status changed, with their new raw status.
    ///
    /// A failed batch aborts the run; rows written by earlier batches stay written.
    pub async fn run(&self) -> DomainResult<BTreeMap<OrderId, String>> {
        let pending = self.ledger.list_pending().await?;
        let mut updated = BTreeMap::new();

        // rows flagged by an earlier run still need the apply job
        if pending.is_empty() {
            info!("No pending PayByBank payments to reconcile");
            self.dispatcher.dispatch()?;
            return Ok(updated);
        }

        info!("Mass status update started for {} pending orders", pending.len());
        debug!("Pending orders: {:?}", pending);

        for (index, batch) in pending.chunks(self.batch_size).enumerate() {
            let records = self.provider.query_order_statuses(batch).await.map_err(|e| {
                error!(
                    "Bulk status query failed on batch {} ({} orders): {}",
                    index + 1,
                    batch.len(),
                    e
                );
                match e {
                    DomainError::CommunicationFailure(_) => e,
                    other => DomainError::CommunicationFailure(other.to_string()),
                }
            })?;

            for record in records {
                let Some(status) = record.raw_status.filter(|s| s != PENDING_STATUS) else {
                    continue;
                };

                match self
                    .ledger
                    .update_status(&record.order_id, &status, record.provider_id.as_deref(), true)
                    .await
                {
                    Ok(()) => {
                        updated.insert(record.order_id, status);
                    }
                    Err(DomainError::NotFound(_)) => {
                        warn!(
                            "PayByBank returned order {} which has no ledger entry, skipping",
                            record.order_id
                        );
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        if updated.is_empty() {
            info!("Mass status update completed. No orders require status update.");
        } else {
            info!(
                "Mass status update completed. {} orders require a status update: {:?}",
                updated.len(),
                updated
            );
        }

        self.dispatcher.dispatch()?;
        Ok(updated)
    }
}
