use crate::application::transition_engine::OrderTransitionEngine;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{PaymentClass, PaymentOutcome, TransitionSource};
use crate::ports::paybybank_port::PayByBankOrder;
use crate::ports::{LedgerPort, OrderStorePort};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Webhook ingestion: provider-pushed status updates, applied inline
pub struct WebhookService<L: LedgerPort, O: OrderStorePort> {
    ledger: Arc<L>,
    orders: Arc<O>,
    engine: Arc<OrderTransitionEngine<O>>,
}

impl<L: LedgerPort, O: OrderStorePort> WebhookService<L, O> {
    pub fn new(ledger: Arc<L>, orders: Arc<O>, engine: Arc<OrderTransitionEngine<O>>) -> Self {
        Self {
            ledger,
            orders,
            engine,
        }
    }

    /// Handles one delivery. Every failure is returned so the provider sees an
    /// honest error and retries.
    pub async fn handle_webhook(&self, body: &str) -> DomainResult<PaymentOutcome> {
        // 1. decode once, fail fast
        let payload: PayByBankOrder = serde_json::from_str(body)
            .map_err(|e| DomainError::BadPayload(format!("Invalid notification body: {}", e)))?;
        let notification = payload.into_notification()?;
        let order_id = notification.order_id;

        debug!(
            "Webhook for order {}: status {} (transaction {:?})",
            order_id, notification.raw_status, notification.transaction_id
        );

        // 2. the order must exist
        if self.orders.find_order(&order_id).await?.is_none() {
            return Err(DomainError::OrderNotFound(order_id.to_string()));
        }

        let class = PaymentClass::classify(&notification.raw_status);

        // a pending report carries nothing new and must not overwrite a terminal row
        if class == PaymentClass::Pending {
            return Err(DomainError::UnexpectedStatus {
                order_id: order_id.to_string(),
                status: notification.raw_status,
            });
        }

        // 3. record the raw status, including values we can't classify
        match self.ledger.get_status(&order_id).await? {
            None => {
                warn!("No ledger entry for order {}, applying webhook anyway", order_id);
            }
            Some(previous) => {
                if previous == notification.raw_status {
                    debug!("Order {} already recorded as {}, repeated delivery", order_id, previous);
                } else {
                    debug!(
                        "Order {} ledger status {} -> {}",
                        order_id, previous, notification.raw_status
                    );
                }
                self.ledger
                    .update_status(
                        &order_id,
                        &notification.raw_status,
                        notification.transaction_id.as_deref(),
                        false,
                    )
                    .await?;
            }
        }

        // 4. classify
        let Some(outcome) = class.outcome() else {
            return Err(DomainError::UnexpectedStatus {
                order_id: order_id.to_string(),
                status: notification.raw_status,
            });
        };

        // 5. apply inline
        self.engine
            .apply(
                &order_id,
                outcome,
                notification.transaction_id.as_deref(),
                TransitionSource::Webhook,
            )
            .await?;

        info!("Successful update (via webhook) from PayByBank for order {}", order_id);
        Ok(outcome)
    }
}
