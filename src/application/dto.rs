use crate::domain::{DomainError, OrderId};
use serde::{Deserialize, Serialize};

/// Create payment reference request
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    /// Merchant order id
    pub order_id: String,
}

/// Issued RF payment code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentReferenceResponse {
    pub order_id: OrderId,

    /// RF code shown to the customer
    pub reference_code: String,

    pub provider_id: String,

    /// Amount in cents
    pub amount: i64,

    /// How long the RF code stays valid
    pub payment_code_life_hours: u32,
}

/// Ledger status of one order, as shown to an operator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentStatusResponse {
    pub order_id: OrderId,

    /// Raw provider status, absent when no reference code was issued
    pub provider_status: Option<String>,

    /// Human-readable label
    pub label: String,

    pub reference_code: Option<String>,

    pub provider_id: Option<String>,

    /// Whether a manual refresh can change anything
    pub can_request_update: bool,
}

/// Result of a manual status refresh
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshResponse {
    pub order_id: OrderId,
    pub provider_status: String,
    pub label: String,
    /// Whether the order status changed during this refresh
    pub transitioned: bool,
    pub message: String,
}

impl RefreshResponse {
    pub fn still_pending(order_id: OrderId) -> Self {
        Self {
            order_id,
            provider_status: crate::domain::PENDING_STATUS.to_string(),
            label: "Pending".to_string(),
            transitioned: false,
            message: "The payment is still PENDING".to_string(),
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: String, message: String) -> Self {
        Self { error, message }
    }
}

impl From<&DomainError> for ErrorResponse {
    fn from(e: &DomainError) -> Self {
        Self::new(e.code().to_string(), e.to_string())
    }
}
