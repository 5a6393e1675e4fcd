use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw provider status a ledger row starts with
pub const PENDING_STATUS: &str = "PENDING";

/// Provider statuses that mean the customer paid
const SUCCESS_STATUSES: [&str; 2] = ["PAID", "COMPLETED"];

/// Provider statuses that mean the payment was cancelled or failed
const FAILED_STATUSES: [&str; 3] = ["READY_TO_CANCEL", "CANCELLED", "CANCELLED_BY_MERCHANT"];

/// Merchant order identifier (opaque)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bulk status queries join ids with commas, so an id must not contain one
    pub fn is_batchable(&self) -> bool {
        !self.0.contains(',')
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Monetary amount in euro cents (no floating point)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount_cents: i64,
}

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Self { amount_cents: cents }
    }

    pub fn to_cents(&self) -> i64 {
        self.amount_cents
    }

    /// Two-decimal representation expected by the provider API, e.g. `12.30`
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.amount_cents < 0 { "-" } else { "" };
        let abs = self.amount_cents.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "€{}", self.to_decimal_string())
    }
}

/// Classified provider status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentClass {
    Pending,
    Success,
    Failed,
    /// Status value the engine does not model yet
    Unknown(String),
}

impl PaymentClass {
    /// Maps a raw provider status onto a class. Total over all strings.
    pub fn classify(raw_status: &str) -> Self {
        let status = raw_status.trim();

        if status == PENDING_STATUS {
            PaymentClass::Pending
        } else if SUCCESS_STATUSES.contains(&status) {
            PaymentClass::Success
        } else if FAILED_STATUSES.contains(&status) {
            PaymentClass::Failed
        } else {
            PaymentClass::Unknown(raw_status.to_string())
        }
    }

    /// Outcome the transition engine can act on, if any
    pub fn outcome(&self) -> Option<PaymentOutcome> {
        match self {
            PaymentClass::Success => Some(PaymentOutcome::Success),
            PaymentClass::Failed => Some(PaymentOutcome::Failed),
            PaymentClass::Pending | PaymentClass::Unknown(_) => None,
        }
    }
}

/// Terminal payment outcome fed into the order transition engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Success,
    Failed,
}

impl fmt::Display for PaymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentOutcome::Success => write!(f, "payment_success"),
            PaymentOutcome::Failed => write!(f, "payment_failed"),
        }
    }
}

/// Which path asked for an order transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionSource {
    /// Provider pushed a status update
    Webhook,
    /// Apply job after the scheduled bulk status check
    Reconciliation,
    /// Operator requested a status update for one order
    Manual,
}

impl fmt::Display for TransitionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionSource::Webhook => write!(f, "webhook"),
            TransitionSource::Reconciliation => write!(f, "reconciliation"),
            TransitionSource::Manual => write!(f, "manual"),
        }
    }
}

/// Human-readable label for a ledger status shown to the merchant operator
pub fn status_label(provider_status: Option<&str>) -> String {
    let Some(status) = provider_status else {
        return "Unknown status".to_string();
    };

    match PaymentClass::classify(status) {
        PaymentClass::Pending => "Pending".to_string(),
        PaymentClass::Success => "Paid".to_string(),
        PaymentClass::Failed => "Failed".to_string(),
        PaymentClass::Unknown(raw) => raw,
    }
}
