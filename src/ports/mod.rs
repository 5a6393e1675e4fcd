pub mod job_dispatch_port;
pub mod ledger_port;
pub mod order_store_port;
pub mod paybybank_port;

pub use job_dispatch_port::ApplyJobDispatcher;
pub use ledger_port::LedgerPort;
pub use order_store_port::OrderStorePort;
pub use paybybank_port::PayByBankPort;
