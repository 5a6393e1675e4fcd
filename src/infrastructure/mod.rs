pub mod adapters;
pub mod config;
pub mod workers;

pub use adapters::{MySqlLedgerRepository, MySqlOrderStore, PayByBankAdapter};
pub use config::AppConfig;
pub use workers::{ApplyWorker, ReconciliationScheduler, apply_channel};
