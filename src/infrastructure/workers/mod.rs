pub mod apply_worker;
pub mod reconciliation_scheduler;

pub use apply_worker::{ApplyWorker, apply_channel};
pub use reconciliation_scheduler::ReconciliationScheduler;
