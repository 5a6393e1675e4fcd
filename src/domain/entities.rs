use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{Money, OrderId, PENDING_STATUS, PaymentClass};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Local record of the provider-known payment status of one order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Merchant order id (unique)
    pub order_id: OrderId,

    /// Provider transaction id, unknown until the first status fetch
    pub provider_id: Option<String>,

    /// RF payment code, never rewritten
    pub reference_code: String,

    /// Last raw status reported by the provider
    pub provider_status: String,

    /// Status newer than what has been applied to the order
    pub pending_apply: bool,

    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Creates the row written when a reference code is first issued
    pub fn new(
        order_id: OrderId,
        reference_code: String,
        provider_id: Option<String>,
    ) -> DomainResult<Self> {
        if order_id.as_str().is_empty() || order_id.as_str().len() > 64 {
            return Err(DomainError::ValidationError(
                "Order id must be 1-64 characters".to_string(),
            ));
        }

        if !order_id.is_batchable() {
            return Err(DomainError::ValidationError(format!(
                "Order id {} must not contain a comma",
                order_id
            )));
        }

        if reference_code.trim().is_empty() || reference_code.len() > 64 {
            return Err(DomainError::ValidationError(
                "Reference code must be 1-64 characters".to_string(),
            ));
        }

        Ok(Self {
            order_id,
            provider_id,
            reference_code,
            provider_status: PENDING_STATUS.to_string(),
            pending_apply: false,
            created_at: Utc::now(),
        })
    }

    pub fn classification(&self) -> PaymentClass {
        PaymentClass::classify(&self.provider_status)
    }

    pub fn is_pending(&self) -> bool {
        self.provider_status == PENDING_STATUS
    }
}

/// Snapshot of a merchant order as seen through the order store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,

    /// Current order status, e.g. `on-hold`, `paybybank-paid`
    pub status: String,

    pub total: Money,

    /// Registered customer, if any
    pub customer_id: Option<i64>,

    pub transaction_id: Option<String>,
}

impl Order {
    pub fn has_status(&self, status: &str) -> bool {
        self.status == status
    }

    pub fn has_any_status(&self, statuses: &[String]) -> bool {
        statuses.iter().any(|s| s == &self.status)
    }
}
