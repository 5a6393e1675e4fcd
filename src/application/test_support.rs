use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{Money, Order, OrderId, PENDING_STATUS};
use crate::ports::ApplyJobDispatcher;
use crate::ports::PayByBankPort;
use crate::ports::paybybank_port::{CreateReferenceRequest, CreateReferenceResponse, ProviderOrder};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Provider double answering from a status table; unknown ids come back `PENDING`
#[derive(Default)]
pub struct ScriptedPayByBank {
    statuses: Mutex<HashMap<OrderId, (String, String)>>,
    query_calls: Mutex<Vec<Vec<OrderId>>>,
    create_calls: Mutex<Vec<CreateReferenceRequest>>,
    fail_query_call: Mutex<Option<usize>>,
    create_error: Mutex<Option<(String, String)>>,
}

impl ScriptedPayByBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, order_id: &str, status: &str, provider_id: &str) {
        self.statuses.lock().unwrap().insert(
            OrderId::from(order_id),
            (status.to_string(), provider_id.to_string()),
        );
    }

    /// Makes the n-th bulk query (1-based) fail with a communication error
    pub fn fail_on_query_call(&self, n: usize) {
        *self.fail_query_call.lock().unwrap() = Some(n);
    }

    pub fn refuse_create(&self, code: &str, message: &str) {
        *self.create_error.lock().unwrap() = Some((code.to_string(), message.to_string()));
    }

    pub fn query_calls(&self) -> Vec<Vec<OrderId>> {
        self.query_calls.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> Vec<CreateReferenceRequest> {
        self.create_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PayByBankPort for ScriptedPayByBank {
    async fn create_order_reference(
        &self,
        request: CreateReferenceRequest,
    ) -> DomainResult<CreateReferenceResponse> {
        let order_id = request.order_id.clone();
        self.create_calls.lock().unwrap().push(request);

        if let Some((code, message)) = self.create_error.lock().unwrap().clone() {
            return Err(DomainError::ProviderError { code, message });
        }

        Ok(CreateReferenceResponse {
            provider_id: format!("pbb-{}", order_id),
            reference_code: format!("RF{:0>8}", order_id.as_str()),
        })
    }

    async fn query_order_statuses(&self, order_ids: &[OrderId]) -> DomainResult<Vec<ProviderOrder>> {
        let call = {
            let mut calls = self.query_calls.lock().unwrap();
            calls.push(order_ids.to_vec());
            calls.len()
        };

        if *self.fail_query_call.lock().unwrap() == Some(call) {
            return Err(DomainError::CommunicationFailure("connection reset".to_string()));
        }

        let statuses = self.statuses.lock().unwrap();
        Ok(order_ids
            .iter()
            .map(|id| {
                let (status, provider_id) = statuses
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| (PENDING_STATUS.to_string(), format!("pbb-{}", id)));
                ProviderOrder {
                    order_id: id.clone(),
                    provider_id: Some(provider_id),
                    reference_code: Some(format!("RF{:0>8}", id.as_str())),
                    raw_status: Some(status),
                }
            })
            .collect())
    }
}

/// Counts apply-job dispatches
#[derive(Default)]
pub struct CountingDispatcher {
    count: AtomicUsize,
}

impl CountingDispatcher {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ApplyJobDispatcher for CountingDispatcher {
    fn dispatch(&self) -> DomainResult<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn order(id: &str, status: &str) -> Order {
    Order {
        id: OrderId::from(id),
        status: status.to_string(),
        total: Money::from_cents(4990),
        customer_id: None,
        transaction_id: None,
    }
}
