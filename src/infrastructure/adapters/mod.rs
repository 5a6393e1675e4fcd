pub mod mysql_ledger_repository;
pub mod mysql_order_store;
pub mod paybybank_adapter;

#[cfg(test)]
pub mod in_memory;

pub use mysql_ledger_repository::MySqlLedgerRepository;
pub use mysql_order_store::MySqlOrderStore;
pub use paybybank_adapter::PayByBankAdapter;
