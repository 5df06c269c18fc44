use thiserror::Error;

use crate::{ContractArgs, Method, Receipt, Transaction};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("transaction {0} not found")]
    TransactionNotFound(String),

    #[error("contract {0} is not deployed")]
    UnknownContract(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}

/// The ledger collaborator: submit calls, look transactions up by id.
///
/// A rejected call is still a successful submission: it returns a receipt
/// with a non-zero status. `Err` means the ledger itself failed.
pub trait Ledger: Send + Sync {
    fn submit_contract_call(
        &self,
        contract_id: &str,
        method: Method,
        args: ContractArgs,
    ) -> Result<Receipt, LedgerError>;

    fn get_transaction_by_id(&self, tx_id: &str) -> Result<Transaction, LedgerError>;
}

impl<T: Ledger + ?Sized> Ledger for std::sync::Arc<T> {
    fn submit_contract_call(
        &self,
        contract_id: &str,
        method: Method,
        args: ContractArgs,
    ) -> Result<Receipt, LedgerError> {
        (**self).submit_contract_call(contract_id, method, args)
    }

    fn get_transaction_by_id(&self, tx_id: &str) -> Result<Transaction, LedgerError> {
        (**self).get_transaction_by_id(tx_id)
    }
}
