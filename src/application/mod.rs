pub mod apply_job;
pub mod dto;
pub mod order_locks;
pub mod payment_service;
pub mod reconciliation_job;
pub mod transition_engine;
pub mod webhook_service;

#[cfg(test)]
pub mod test_support;

pub use apply_job::ApplyJob;
pub use payment_service::PaymentService;
pub use reconciliation_job::ReconciliationJob;
pub use transition_engine::{OrderStatuses, OrderTransitionEngine};
pub use webhook_service::WebhookService;
