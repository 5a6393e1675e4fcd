use crate::domain::value_objects::{OrderId, PaymentOutcome, TransitionSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain event trait
pub trait DomainEvent {
    fn event_type(&self) -> &'static str;
}

/// An order was moved to a new status because of a payment outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTransitioned {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub order_id: OrderId,
    pub outcome: PaymentOutcome,
    pub source: TransitionSource,
    pub from_status: String,
    pub to_status: String,
}

impl DomainEvent for OrderTransitioned {
    fn event_type(&self) -> &'static str {
        "OrderTransitioned"
    }
}

impl OrderTransitioned {
    pub fn new(
        order_id: OrderId,
        outcome: PaymentOutcome,
        source: TransitionSource,
        from_status: String,
        to_status: String,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            order_id,
            outcome,
            source,
            from_status,
            to_status,
        }
    }
}

/// Result of asking the transition engine to apply an outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Order status changed
    Transitioned(OrderTransitioned),
    /// Order was already in a matching terminal status; only a note was added
    AlreadyApplied { order_id: OrderId, status: String },
}

impl TransitionOutcome {
    pub fn changed_status(&self) -> bool {
        matches!(self, TransitionOutcome::Transitioned(_))
    }
}
