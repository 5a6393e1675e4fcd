use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{Money, OrderId};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

/// Reference code creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReferenceRequest {
    pub order_id: OrderId,
    pub amount: Money,
    /// Life of the RF code in hours
    pub payment_code_life_hours: u32,
    pub customer_id: Option<i64>,
}

/// Reference code creation response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReferenceResponse {
    pub provider_id: String,
    pub reference_code: String,
}

/// One record of a bulk status query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOrder {
    pub order_id: OrderId,
    pub provider_id: Option<String>,
    pub reference_code: Option<String>,
    pub raw_status: Option<String>,
}

/// PayByBank "Order" object, as pushed to the webhook and returned by queries
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayByBankOrder {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "de_opt_id")]
    pub merchant_order_id: Option<String>,

    #[serde(default)]
    pub omt_transaction_bank: Option<TransactionBank>,

    /// Present only on refused requests
    #[serde(default, rename = "error_code", deserialize_with = "de_opt_id")]
    pub error_code: Option<String>,

    #[serde(default, rename = "error_message")]
    pub error_message: Option<String>,
}

/// Nested bank transaction of a PayByBank order
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBank {
    #[serde(default)]
    pub bank_payment_code: Option<String>,

    #[serde(default)]
    pub merchant_order_status: Option<String>,

    #[serde(default, rename = "txn_id", deserialize_with = "de_opt_id")]
    pub txn_id: Option<String>,
}

/// Validated content of a webhook delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusNotification {
    pub order_id: OrderId,
    pub raw_status: String,
    pub transaction_id: Option<String>,
}

impl PayByBankOrder {
    fn status(&self) -> Option<&str> {
        self.omt_transaction_bank
            .as_ref()
            .and_then(|bank| bank.merchant_order_status.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Single decode step for webhook deliveries; anything missing is a bad payload
    pub fn into_notification(self) -> DomainResult<StatusNotification> {
        let order_id = self
            .merchant_order_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(OrderId::from)
            .ok_or_else(|| DomainError::BadPayload("Missing merchantOrderId".to_string()))?;

        let raw_status = self
            .status()
            .ok_or_else(|| {
                DomainError::BadPayload(format!(
                    "Missing merchantOrderStatus for order {}",
                    order_id
                ))
            })?
            .to_string();

        let transaction_id = self
            .omt_transaction_bank
            .and_then(|bank| bank.txn_id)
            .or(self.id);

        Ok(StatusNotification {
            order_id,
            raw_status,
            transaction_id,
        })
    }

    /// Bulk query record; `None` if the provider left out the merchant order id
    pub fn into_provider_order(self) -> Option<ProviderOrder> {
        let raw_status = self.status().map(str::to_string);
        let order_id = OrderId::new(self.merchant_order_id?);
        let reference_code = self
            .omt_transaction_bank
            .and_then(|bank| bank.bank_payment_code);

        Some(ProviderOrder {
            order_id,
            provider_id: self.id,
            reference_code,
            raw_status,
        })
    }
}

/// Provider ids arrive as JSON strings or numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Integer(i64),
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(s) => s,
        RawId::Integer(n) => n.to_string(),
    }))
}

/// PayByBank port
#[async_trait]
pub trait PayByBankPort: Send + Sync {
    /// Requests an RF payment code for one order (short timeout)
    async fn create_order_reference(
        &self,
        request: CreateReferenceRequest,
    ) -> DomainResult<CreateReferenceResponse>;

    /// Bulk status query, at most one batch of ids per call (long timeout)
    async fn query_order_statuses(&self, order_ids: &[OrderId]) -> DomainResult<Vec<ProviderOrder>>;
}
