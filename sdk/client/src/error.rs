use thiserror::Error;

use tessera_privacy::PrivacyError;
use tessera_signature::SignatureError;
use tessera_transaction::{LedgerError, Method};
use tessera_wire::WireError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("{method} rejected with status {status}: {message}")]
    Rejected {
        method: Method,
        tx_id: String,
        status: u32,
        message: String,
    },

    #[error("transfer failed: {0}")]
    TransferFailed(String),

    #[error("transaction {tx_id} is a {found} call, expected {expected}")]
    WrongMethod {
        tx_id: String,
        expected: Method,
        found: Method,
    },

    #[error("transaction {tx_id} was rejected with status {status}")]
    RejectedTransaction { tx_id: String, status: u32 },

    #[error("transaction {tx_id} has no {key} argument")]
    MissingParameter { tx_id: String, key: &'static str },

    #[error("share in transaction {tx_id} does not match its commitment")]
    ShareMismatch { tx_id: String },

    #[error("secret total overflows a u64")]
    TotalOverflow,

    #[error(transparent)]
    Privacy(#[from] PrivacyError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("preparation task failed: {0}")]
    Task(String),
}
