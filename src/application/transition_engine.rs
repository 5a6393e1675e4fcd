use crate::application::order_locks::OrderLocks;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{
    DomainEvent, Order, OrderId, OrderTransitioned, PaymentOutcome, TransitionOutcome,
    TransitionSource,
};
use crate::ports::OrderStorePort;
use std::sync::Arc;
use tracing::{debug, info, warn};

const NOTE_PAID: &str = "Order paid successfully by PayByBank.";
const NOTE_FAILED: &str = "Payment via PayByBank failed.";
const NOTE_FAILED_AFTER_PAID: &str =
    "PayByBank reported a failed payment for an order that is already paid. Status left unchanged.";
const NOTE_CHECKOUT: &str = "Checkout with PayByBank payment.";

/// Order status names the engine moves orders between
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatuses {
    /// Status right after checkout, while waiting for the bank transfer
    pub initial: String,
    /// Target status after a successful payment
    pub paid: String,
    /// Target status after a failed payment
    pub failed: String,
    /// Statuses that already count as failed/cancelled
    pub already_failed: Vec<String>,
}

impl Default for OrderStatuses {
    fn default() -> Self {
        Self {
            initial: "on-hold".to_string(),
            paid: "paybybank-paid".to_string(),
            failed: "failed".to_string(),
            already_failed: vec!["failed".to_string(), "cancelled".to_string()],
        }
    }
}

/// The only code path that changes order status.
///
/// Check-then-act runs under a per-order lock and the final write is a
/// compare-and-swap in the order store, so concurrent callers for one order
/// cannot both see the pre-transition status.
pub struct OrderTransitionEngine<O: OrderStorePort> {
    orders: Arc<O>,
    statuses: OrderStatuses,
    locks: OrderLocks,
}

impl<O: OrderStorePort> OrderTransitionEngine<O> {
    pub fn new(orders: Arc<O>, statuses: OrderStatuses) -> Self {
        Self {
            orders,
            statuses,
            locks: OrderLocks::new(),
        }
    }

    /// Applies a terminal payment outcome to an order
    pub async fn apply(
        &self,
        order_id: &OrderId,
        outcome: PaymentOutcome,
        transaction_id: Option<&str>,
        source: TransitionSource,
    ) -> DomainResult<TransitionOutcome> {
        self.locks
            .run_exclusive(order_id, || {
                self.apply_locked(order_id, outcome, transaction_id, source)
            })
            .await
    }

    /// Moves a freshly checked-out order to the initial "awaiting payment" status
    pub async fn hold_for_payment(&self, order_id: &OrderId) -> DomainResult<()> {
        self.locks
            .run_exclusive(order_id, || self.hold_locked(order_id))
            .await
    }

    async fn hold_locked(&self, order_id: &OrderId) -> DomainResult<()> {
        let order = self.load(order_id).await?;
        if order.has_status(&self.statuses.initial) {
            return Ok(());
        }

        self.swap_status(&order, &self.statuses.initial, NOTE_CHECKOUT)
            .await?;
        info!(
            "Order {} placed on {} awaiting PayByBank payment",
            order_id, self.statuses.initial
        );
        Ok(())
    }

    async fn apply_locked(
        &self,
        order_id: &OrderId,
        outcome: PaymentOutcome,
        transaction_id: Option<&str>,
        source: TransitionSource,
    ) -> DomainResult<TransitionOutcome> {
        let order = self.load(order_id).await?;

        match outcome {
            PaymentOutcome::Success => {
                if order.has_status(&self.statuses.paid) {
                    debug!("Order {} already paid, duplicate success from {}", order_id, source);
                    return self.note_only(&order, NOTE_PAID).await;
                }

                let note = format!("{} {}", NOTE_PAID, success_cause(source));
                let result = self
                    .transition(&order, outcome, source, &self.statuses.paid, &note)
                    .await?;

                // only once the status swap has won
                if let Some(tx_id) = transaction_id.filter(|id| !id.is_empty()) {
                    if order.transaction_id.as_deref() != Some(tx_id) {
                        self.orders.attach_transaction_id(order_id, tx_id).await?;
                    }
                }
                Ok(result)
            }
            PaymentOutcome::Failed => {
                if order.has_any_status(&self.statuses.already_failed) {
                    debug!("Order {} already {}, duplicate failure from {}", order_id, order.status, source);
                    return self.note_only(&order, NOTE_FAILED).await;
                }

                // a captured payment is never rolled back by a later failure report
                if order.has_status(&self.statuses.paid) {
                    warn!("Ignoring failed payment report for paid order {} (via {})", order_id, source);
                    return self.note_only(&order, NOTE_FAILED_AFTER_PAID).await;
                }

                self.transition(&order, outcome, source, &self.statuses.failed, NOTE_FAILED)
                    .await
            }
        }
    }

    async fn load(&self, order_id: &OrderId) -> DomainResult<Order> {
        self.orders
            .find_order(order_id)
            .await?
            .ok_or_else(|| DomainError::OrderNotFound(order_id.to_string()))
    }

    async fn note_only(&self, order: &Order, note: &str) -> DomainResult<TransitionOutcome> {
        self.orders.add_note(&order.id, note).await?;
        Ok(TransitionOutcome::AlreadyApplied {
            order_id: order.id.clone(),
            status: order.status.clone(),
        })
    }

    async fn transition(
        &self,
        order: &Order,
        outcome: PaymentOutcome,
        source: TransitionSource,
        target: &str,
        note: &str,
    ) -> DomainResult<TransitionOutcome> {
        self.swap_status(order, target, note).await?;

        let event = OrderTransitioned::new(
            order.id.clone(),
            outcome,
            source,
            order.status.clone(),
            target.to_string(),
        );
        info!(
            "{}: order {} {} -> {} ({} via {})",
            event.event_type(),
            order.id,
            event.from_status,
            event.to_status,
            outcome,
            source
        );
        Ok(TransitionOutcome::Transitioned(event))
    }

    async fn swap_status(&self, order: &Order, target: &str, note: &str) -> DomainResult<()> {
        let swapped = self
            .orders
            .transition_to(&order.id, &order.status, target, note)
            .await?;

        if !swapped {
            return Err(DomainError::StatusConflict {
                order_id: order.id.to_string(),
                expected: order.status.clone(),
            });
        }
        Ok(())
    }
}

fn success_cause(source: TransitionSource) -> &'static str {
    match source {
        TransitionSource::Webhook => "Status changed automatically after client payment.",
        TransitionSource::Reconciliation => {
            "Status changed automatically after scheduled status check."
        }
        TransitionSource::Manual => "Status changed after manual status update request.",
    }
}
