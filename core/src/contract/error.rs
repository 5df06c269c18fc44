//! Contract error types.

use thiserror::Error;

use tessera_privacy::PrivacyError;
use tessera_wire::WireError;

/// Every rejection a contract call can produce.
///
/// The display text is the receipt message and always starts with the class
/// so operators can tell authorization bugs from data-integrity bugs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("verification failed: aggregate commitment does not open to the claimed total")]
    CommitmentMismatch,

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("crypto failure: {0}")]
    Crypto(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl ContractError {
    /// Non-zero receipt status for this error class.
    pub fn status(&self) -> u32 {
        match self {
            ContractError::PermissionDenied(_) => 1,
            ContractError::NotFound(_) => 2,
            ContractError::CommitmentMismatch => 3,
            ContractError::Encoding(_) => 4,
            ContractError::Conflict(_) => 5,
            ContractError::MissingArgument(_) => 6,
            ContractError::UnknownMethod(_) => 7,
            ContractError::Crypto(_) => 8,
            ContractError::Storage(_) => 9,
        }
    }

    /// Short class name for log lines.
    pub fn class(&self) -> &'static str {
        match self {
            ContractError::PermissionDenied(_) => "permission-denied",
            ContractError::NotFound(_) => "not-found",
            ContractError::CommitmentMismatch => "verification-failed",
            ContractError::Encoding(_) | ContractError::MissingArgument(_) => "encoding",
            ContractError::Conflict(_) => "conflict",
            ContractError::UnknownMethod(_) => "unknown-method",
            ContractError::Crypto(_) => "crypto",
            ContractError::Storage(_) => "storage",
        }
    }
}

impl From<WireError> for ContractError {
    fn from(e: WireError) -> Self {
        ContractError::Encoding(e.to_string())
    }
}

impl From<PrivacyError> for ContractError {
    fn from(e: PrivacyError) -> Self {
        match e {
            PrivacyError::InvalidCommitment | PrivacyError::Encoding(_) => {
                ContractError::Encoding(e.to_string())
            }
            other => ContractError::Crypto(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ContractError {
    fn from(e: anyhow::Error) -> Self {
        ContractError::Storage(format!("{e:#}"))
    }
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, ContractError>;
