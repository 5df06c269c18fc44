//! Call message types for the ownership contract.

use tessera_privacy::{Commitment, Opening};
use tessera_signature::signing_payload;
use tessera_transaction::{ContractArgs, Method, ShareHalf};
use tessera_wire::{decode_item_ids, decode_secret_total, encode_secret_total};

use crate::contract::error::{ContractError, HandlerResult};

/// Decimal `r`/`s` text as submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authorization {
    pub r: Vec<u8>,
    pub s: Vec<u8>,
}

/// One aggregate ownership transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchTransfer {
    /// The id list exactly as signed
    pub encoded_tids: Vec<u8>,
    pub tids: Vec<String>,
    /// Destination pseudo-identity
    pub pid: String,
    pub secret_total: u64,
    pub opening: Opening,
    pub auth: Authorization,
}

impl BatchTransfer {
    /// `pid ‖ encodedIds ‖ total_be ‖ opening`
    pub fn signed_payload(&self) -> Vec<u8> {
        signing_payload(&[
            self.pid.as_bytes(),
            &self.encoded_tids,
            &encode_secret_total(self.secret_total),
            self.opening.as_bytes(),
        ])
    }
}

/// Call messages for the ownership contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractCall {
    /// Record the admin key at deployment.
    Init { admin: Vec<u8> },

    /// Register a pseudo-identity (admin only).
    AddPid {
        pid: String,
        pk: Vec<u8>,
        auth: Authorization,
    },

    /// Register an item under an owner (admin only).
    CreateItem {
        tid: String,
        pid: String,
        auth: Authorization,
    },

    /// Write one half of an item's encrypted secret and its commitment.
    UploadShare {
        half: ShareHalf,
        tid: String,
        gama: Vec<u8>,
        commitment: Commitment,
        auth: Authorization,
    },

    BatchTransfer(BatchTransfer),

    ReadCipher { tid: String },

    ReadCipherBatch { tids: Vec<String> },

    ReadFailReason,
}

impl ContractCall {
    /// Resolves a method by its ledger name, then parses its arguments.
    pub fn parse_named(method: &str, args: &ContractArgs) -> HandlerResult<Self> {
        let method: Method = method
            .parse()
            .map_err(|_| ContractError::UnknownMethod(method.to_string()))?;
        Self::parse(method, args)
    }

    pub fn parse(method: Method, args: &ContractArgs) -> HandlerResult<Self> {
        let call = match method {
            // a missing admin is a malformed one; Init records why it failed
            Method::Init => ContractCall::Init {
                admin: args.get("admin").unwrap_or_default().to_vec(),
            },
            Method::AddPid => ContractCall::AddPid {
                pid: text(args, "pid")?,
                pk: bytes(args, "pk")?,
                auth: auth(args)?,
            },
            Method::CreateItem => ContractCall::CreateItem {
                tid: text(args, "tid")?,
                pid: text(args, "pid")?,
                auth: auth(args)?,
            },
            Method::UploadAlpha | Method::UploadBeta => {
                let half = if method == Method::UploadAlpha {
                    ShareHalf::Alpha
                } else {
                    ShareHalf::Beta
                };
                ContractCall::UploadShare {
                    half,
                    tid: text(args, "tid")?,
                    gama: bytes(args, "gama")?,
                    commitment: Commitment::from_slice(&bytes(args, "commit")?)?,
                    auth: auth(args)?,
                }
            }
            Method::BatchTransfer => {
                let encoded_tids = bytes(args, "tid")?;
                let tids = decode_item_ids(&encoded_tids)?;
                let opening = Opening::from_slice(&bytes(args, "opening")?)
                    .ok_or_else(|| ContractError::Encoding("opening must be 32 bytes".into()))?;
                ContractCall::BatchTransfer(BatchTransfer {
                    encoded_tids,
                    tids,
                    pid: text(args, "pid")?,
                    secret_total: decode_secret_total(&bytes(args, "pSecret")?)?,
                    opening,
                    auth: auth(args)?,
                })
            }
            Method::ReadCipher => ContractCall::ReadCipher {
                tid: text(args, "tid")?,
            },
            Method::ReadCipherBatch => ContractCall::ReadCipherBatch {
                tids: decode_item_ids(&bytes(args, "tid")?)?,
            },
            Method::ReadFailReason => ContractCall::ReadFailReason,
        };
        Ok(call)
    }

    pub fn method(&self) -> Method {
        match self {
            ContractCall::Init { .. } => Method::Init,
            ContractCall::AddPid { .. } => Method::AddPid,
            ContractCall::CreateItem { .. } => Method::CreateItem,
            ContractCall::UploadShare { half, .. } => half.upload_method(),
            ContractCall::BatchTransfer(_) => Method::BatchTransfer,
            ContractCall::ReadCipher { .. } => Method::ReadCipher,
            ContractCall::ReadCipherBatch { .. } => Method::ReadCipherBatch,
            ContractCall::ReadFailReason => Method::ReadFailReason,
        }
    }
}

fn bytes(args: &ContractArgs, key: &'static str) -> HandlerResult<Vec<u8>> {
    args.get(key)
        .map(<[u8]>::to_vec)
        .ok_or(ContractError::MissingArgument(key))
}

fn text(args: &ContractArgs, key: &'static str) -> HandlerResult<String> {
    let raw = args.get(key).ok_or(ContractError::MissingArgument(key))?;
    let value = std::str::from_utf8(raw)
        .map_err(|_| ContractError::Encoding(format!("{key} is not utf-8")))?;
    if value.is_empty() {
        return Err(ContractError::Encoding(format!("{key} is empty")));
    }
    Ok(value.to_string())
}

fn auth(args: &ContractArgs) -> HandlerResult<Authorization> {
    Ok(Authorization {
        r: bytes(args, "r")?,
        s: bytes(args, "s")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_wire::encode_item_ids;

    fn signed(args: ContractArgs) -> ContractArgs {
        args.with("r", "12").with("s", "34")
    }

    #[test]
    fn upload_methods_select_half() {
        let args = signed(
            ContractArgs::new()
                .with("tid", "t1")
                .with("gama", [1u8, 2])
                .with("commit", [7u8; 32]),
        );
        let call = ContractCall::parse(Method::UploadBeta, &args).unwrap();
        assert!(matches!(
            call,
            ContractCall::UploadShare {
                half: ShareHalf::Beta,
                ..
            }
        ));
        assert_eq!(call.method(), Method::UploadBeta);
    }

    #[test]
    fn missing_and_malformed_arguments() {
        let args = ContractArgs::new().with("pid", "alice");
        assert_eq!(
            ContractCall::parse(Method::AddPid, &args),
            Err(ContractError::MissingArgument("pk"))
        );

        let args = signed(ContractArgs::new().with("tid", "").with("pid", "alice"));
        assert!(matches!(
            ContractCall::parse(Method::CreateItem, &args),
            Err(ContractError::Encoding(_))
        ));

        let args = signed(
            ContractArgs::new()
                .with("tid", "t1")
                .with("gama", [1u8])
                .with("commit", [7u8; 31]),
        );
        assert!(matches!(
            ContractCall::parse(Method::UploadAlpha, &args),
            Err(ContractError::Encoding(_))
        ));
    }

    #[test]
    fn batch_transfer_parses_wire_fields() {
        let encoded = encode_item_ids(&["a", "b"]).unwrap();
        let args = signed(
            ContractArgs::new()
                .with("tid", &encoded)
                .with("pid", "bob")
                .with("pSecret", 25u64.to_be_bytes())
                .with("opening", [3u8; 32]),
        );
        let ContractCall::BatchTransfer(batch) =
            ContractCall::parse(Method::BatchTransfer, &args).unwrap()
        else {
            panic!("expected a batch transfer");
        };
        assert_eq!(batch.tids, vec!["a", "b"]);
        assert_eq!(batch.secret_total, 25);

        let payload = batch.signed_payload();
        assert!(payload.starts_with(b"bob"));
        assert_eq!(&payload[3..3 + encoded.len()], &encoded[..]);
        assert_eq!(payload.len(), 3 + encoded.len() + 8 + 32);
    }

    #[test]
    fn short_secret_total_rejected() {
        let args = signed(
            ContractArgs::new()
                .with("tid", encode_item_ids(&["a"]).unwrap())
                .with("pid", "bob")
                .with("pSecret", [0u8; 4])
                .with("opening", [3u8; 32]),
        );
        assert!(matches!(
            ContractCall::parse(Method::BatchTransfer, &args),
            Err(ContractError::Encoding(_))
        ));
    }

    #[test]
    fn unknown_method_name() {
        assert_eq!(
            ContractCall::parse_named("ProductTransfer", &ContractArgs::new()),
            Err(ContractError::UnknownMethod("ProductTransfer".into()))
        );
        assert_eq!(
            ContractCall::parse_named("ReadFailReason", &ContractArgs::new()),
            Ok(ContractCall::ReadFailReason)
        );
    }
}
