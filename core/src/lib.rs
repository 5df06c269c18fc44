//! Tessera ledger side: the ownership contract, state stores, and an
//! in-process ledger that runs them.

pub mod contract;
pub mod ledger;
pub mod storage;

pub use contract::{ContractCall, ContractError, OwnershipContract};
pub use ledger::{LocalLedger, ScopedStore};
pub use storage::{MemStore, RocksDbStore, StateStore};

#[cfg(test)]
mod tests;
