use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod args;
pub mod ledger;

pub use args::{Argument, ContractArgs};
pub use ledger::{Ledger, LedgerError};

/// Receipt status for an accepted call.
pub const STATUS_OK: u32 = 0;

/// The closed set of contract methods, named as they appear on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Init,
    AddPid,
    CreateItem,
    UploadAlpha,
    UploadBeta,
    BatchTransfer,
    ReadCipher,
    ReadCipherBatch,
    ReadFailReason,
}

impl Method {
    pub const ALL: [Method; 9] = [
        Method::Init,
        Method::AddPid,
        Method::CreateItem,
        Method::UploadAlpha,
        Method::UploadBeta,
        Method::BatchTransfer,
        Method::ReadCipher,
        Method::ReadCipherBatch,
        Method::ReadFailReason,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Init => "Init",
            Method::AddPid => "AddPid",
            Method::CreateItem => "CreateItem",
            Method::UploadAlpha => "UploadAlpha",
            Method::UploadBeta => "UploadBeta",
            Method::BatchTransfer => "BatchTransfer",
            Method::ReadCipher => "ReadCipher",
            Method::ReadCipherBatch => "ReadCipherBatch",
            Method::ReadFailReason => "ReadFailReason",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

/// Which custodian half of an item secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShareHalf {
    Alpha,
    Beta,
}

impl ShareHalf {
    pub fn upload_method(&self) -> Method {
        match self {
            ShareHalf::Alpha => Method::UploadAlpha,
            ShareHalf::Beta => Method::UploadBeta,
        }
    }

    /// Short tag used in state keys (`al`, `be`).
    pub fn tag(&self) -> &'static str {
        match self {
            ShareHalf::Alpha => "al",
            ShareHalf::Beta => "be",
        }
    }
}

impl fmt::Display for ShareHalf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareHalf::Alpha => f.write_str("alpha"),
            ShareHalf::Beta => f.write_str("beta"),
        }
    }
}

impl FromStr for ShareHalf {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alpha" | "al" => Ok(ShareHalf::Alpha),
            "beta" | "be" => Ok(ShareHalf::Beta),
            other => Err(format!("expected alpha or beta, got {other}")),
        }
    }
}

/// A contract call as recorded by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Hex transaction id assigned by the ledger
    pub id: String,
    pub contract_id: String,
    pub method: Method,
    pub args: ContractArgs,
    /// Position in the ledger's submission order
    pub sequence: u64,
    /// Receipt status the call finished with
    pub status: u32,
}

impl Transaction {
    /// Whether the recorded call was accepted by the contract.
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Looks up a named argument of the recorded call.
    pub fn parameter(&self, key: &str) -> Option<&[u8]> {
        self.args.get(key)
    }

    pub fn payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_payload(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Outcome of a submitted call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub status: u32,
    pub message: String,
    pub tx_id: String,
    #[serde(with = "hex")]
    pub result: Vec<u8>,
}

impl Receipt {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}
