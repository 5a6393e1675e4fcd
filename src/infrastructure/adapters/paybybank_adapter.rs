use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::OrderId;
use crate::infrastructure::config::PayByBankConfig;
use crate::ports::paybybank_port::{
    CreateReferenceRequest, CreateReferenceResponse, PayByBankOrder, PayByBankPort, ProviderOrder,
};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use std::sync::Arc;
use tracing::{debug, error};

const CONNECT_ERROR: &str = "Unable to connect with PayByBank system. Please try again.";

/// PayByBank REST adapter
#[derive(Clone)]
pub struct PayByBankAdapter {
    config: Arc<PayByBankConfig>,
    client: Client,
}

impl PayByBankAdapter {
    pub fn new(config: Arc<PayByBankConfig>) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// `{base}/order/merchant/{api_key}[/{ids}]`; every segment is percent-encoded
    fn merchant_url(&self, ids: Option<&str>) -> DomainResult<Url> {
        let mut url = Url::parse(&self.config.base_url).map_err(|e| {
            DomainError::ConfigurationError(format!("Invalid PayByBank base URL: {}", e))
        })?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                DomainError::ConfigurationError(format!(
                    "PayByBank base URL cannot carry a path: {}",
                    self.config.base_url
                ))
            })?;
            segments
                .pop_if_empty()
                .extend(["order", "merchant", self.config.api_key.as_str()]);
            if let Some(ids) = ids {
                segments.push(ids);
            }
        }

        Ok(url)
    }

    /// Non-200 or empty bodies are communication failures, never a result
    async fn read_body(response: Response, operation: &str) -> DomainResult<String> {
        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK || body.trim().is_empty() {
            error!("PayByBank {} failed: HTTP {} - {}", operation, status, body);
            return Err(DomainError::CommunicationFailure(format!(
                "{} (HTTP {})",
                CONNECT_ERROR, status
            )));
        }

        debug!("PayByBank {} response: {}", operation, body);
        Ok(body)
    }
}

#[async_trait]
impl PayByBankPort for PayByBankAdapter {
    /// Creates the payment order and returns its RF code
    async fn create_order_reference(
        &self,
        request: CreateReferenceRequest,
    ) -> DomainResult<CreateReferenceResponse> {
        let mut params = vec![
            ("merchant_order_id", request.order_id.to_string()),
            ("amount", request.amount.to_decimal_string()),
            ("payment_code_life", request.payment_code_life_hours.to_string()),
        ];
        if let Some(customer_id) = request.customer_id.filter(|id| *id > 0) {
            params.push(("merchant_customer_id", customer_id.to_string()));
        }

        let response = self
            .client
            .post(self.merchant_url(None)?)
            .query(&params)
            .timeout(self.config.create_timeout)
            .send()
            .await?;

        let body = Self::read_body(response, "create order").await?;
        let order: PayByBankOrder = serde_json::from_str(&body)
            .map_err(|e| DomainError::BadPayload(format!("Invalid create order response: {}", e)))?;

        if let Some(code) = order.error_code.filter(|c| !c.is_empty()) {
            return Err(DomainError::ProviderError {
                code,
                message: order.error_message.unwrap_or_default(),
            });
        }

        let reference_code = order
            .omt_transaction_bank
            .and_then(|bank| bank.bank_payment_code)
            .filter(|code| !code.is_empty())
            .ok_or_else(|| DomainError::ProviderError {
                code: "communication_api_error".to_string(),
                message: "Problem with bankPaymentCode".to_string(),
            })?;

        Ok(CreateReferenceResponse {
            provider_id: order.id.unwrap_or_default(),
            reference_code,
        })
    }

    /// One GET for up to one batch of comma-joined order ids
    async fn query_order_statuses(&self, order_ids: &[OrderId]) -> DomainResult<Vec<ProviderOrder>> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(id) = order_ids.iter().find(|id| !id.is_batchable()) {
            return Err(DomainError::ValidationError(format!(
                "Order id {} cannot be queried in a batch",
                id
            )));
        }

        let ids = order_ids
            .iter()
            .map(OrderId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let url = self.merchant_url(Some(ids.as_str()))?;

        let response = self
            .client
            .get(url)
            .timeout(self.config.query_timeout)
            .send()
            .await?;

        let body = Self::read_body(response, "bulk status query").await?;
        let orders: Vec<PayByBankOrder> = serde_json::from_str(&body)
            .map_err(|e| DomainError::BadPayload(format!("Invalid bulk status response: {}", e)))?;

        Ok(orders
            .into_iter()
            .filter_map(PayByBankOrder::into_provider_order)
            .collect())
    }
}
