use crate::application::dto::{PaymentReferenceResponse, PaymentStatusResponse, RefreshResponse};
use crate::application::transition_engine::OrderTransitionEngine;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{Order, OrderId, PENDING_STATUS, PaymentClass, TransitionSource, status_label};
use crate::ports::paybybank_port::CreateReferenceRequest;
use crate::ports::{LedgerPort, OrderStorePort, PayByBankPort};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Payment service: checkout-time reference codes and operator-facing status
pub struct PaymentService<P: PayByBankPort, L: LedgerPort, O: OrderStorePort> {
    provider: Arc<P>,
    ledger: Arc<L>,
    orders: Arc<O>,
    engine: Arc<OrderTransitionEngine<O>>,
    payment_code_life_hours: u32,
}

impl<P: PayByBankPort, L: LedgerPort, O: OrderStorePort> PaymentService<P, L, O> {
    pub fn new(
        provider: Arc<P>,
        ledger: Arc<L>,
        orders: Arc<O>,
        engine: Arc<OrderTransitionEngine<O>>,
        payment_code_life_hours: u32,
    ) -> Self {
        Self {
            provider,
            ledger,
            orders,
            engine,
            payment_code_life_hours,
        }
    }

    /// Issues the RF payment code for an order and puts the order on hold
    pub async fn create_payment_reference(
        &self,
        order_id: &OrderId,
    ) -> DomainResult<PaymentReferenceResponse> {
        info!("Creating PayByBank reference for order: {}", order_id);

        // 1. order must exist
        let order = self.load(order_id).await?;
        if !order_id.is_batchable() {
            return Err(DomainError::ValidationError(format!(
                "Order id {} must not contain a comma",
                order_id
            )));
        }

        // 2. one reference code per order
        if self.ledger.find(order_id).await?.is_some() {
            return Err(DomainError::DuplicateOrder(order_id.to_string()));
        }

        // 3. ask the provider for an RF code
        let request = CreateReferenceRequest {
            order_id: order_id.clone(),
            amount: order.total,
            payment_code_life_hours: self.payment_code_life_hours,
            customer_id: order.customer_id,
        };
        let response = self.provider.create_order_reference(request).await?;
        debug!(
            "PayByBank issued {} (provider id {}) for order {}",
            response.reference_code, response.provider_id, order_id
        );

        // 4. record it, then wait for payment
        self.ledger
            .create(order_id, &response.reference_code, Some(&response.provider_id))
            .await?;
        self.engine.hold_for_payment(order_id).await?;

        info!("PayByBank reference created for order: {}", order_id);

        Ok(PaymentReferenceResponse {
            order_id: order_id.clone(),
            reference_code: response.reference_code,
            provider_id: response.provider_id,
            amount: order.total.to_cents(),
            payment_code_life_hours: self.payment_code_life_hours,
        })
    }

    /// Ledger status of an order
    pub async fn payment_status(&self, order_id: &OrderId) -> DomainResult<PaymentStatusResponse> {
        let entry = self.ledger.find(order_id).await?;
        let provider_status = entry.as_ref().map(|e| e.provider_status.clone());

        // only rows with nothing final yet are worth a manual refresh
        let can_request_update = match &provider_status {
            None => true,
            Some(status) => status == PENDING_STATUS,
        };

        Ok(PaymentStatusResponse {
            order_id: order_id.clone(),
            label: status_label(provider_status.as_deref()),
            provider_status,
            reference_code: entry.as_ref().map(|e| e.reference_code.clone()),
            provider_id: entry.and_then(|e| e.provider_id),
            can_request_update,
        })
    }

    /// Operator refresh: fetches the latest status and applies it inline
    pub async fn refresh_order(&self, order_id: &OrderId) -> DomainResult<RefreshResponse> {
        info!("Manual PayByBank status update requested for order: {}", order_id);

        self.load(order_id).await?;

        let records = self
            .provider
            .query_order_statuses(std::slice::from_ref(order_id))
            .await?;

        let Some((status, provider_id)) = records
            .into_iter()
            .find(|record| &record.order_id == order_id)
            .and_then(|record| Some((record.raw_status?, record.provider_id)))
            .filter(|(status, _)| status != PENDING_STATUS)
        else {
            debug!("Order {} is still pending at PayByBank", order_id);
            return Ok(RefreshResponse::still_pending(order_id.clone()));
        };

        match self
            .ledger
            .update_status(order_id, &status, provider_id.as_deref(), false)
            .await
        {
            Ok(()) => {}
            Err(DomainError::NotFound(_)) => {
                warn!("No ledger entry for order {}, applying refresh anyway", order_id);
            }
            Err(e) => return Err(e),
        }

        let class = PaymentClass::classify(&status);
        let transitioned = match class.outcome() {
            Some(outcome) => self
                .engine
                .apply(order_id, outcome, provider_id.as_deref(), TransitionSource::Manual)
                .await?
                .changed_status(),
            None => {
                warn!("Unknown PayByBank status {} for order {}", status, order_id);
                false
            }
        };

        Ok(RefreshResponse {
            order_id: order_id.clone(),
            label: status_label(Some(&status)),
            message: format!("The payment status is: {}", status),
            provider_status: status,
            transitioned,
        })
    }

    async fn load(&self, order_id: &OrderId) -> DomainResult<Order> {
        self.orders
            .find_order(order_id)
            .await?
            .ok_or_else(|| DomainError::OrderNotFound(order_id.to_string()))
    }
}
