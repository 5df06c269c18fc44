//! In-process ledger.
//!
//! Executes contract calls one at a time, records every submitted call as a
//! transaction, and keeps each contract's state under its own key prefix.
//!
//! ```text
//! <contract_id>/<key>          contract state
//! tx/<tx_id>                   transaction record (JSON)
//! ledger/sequence              last assigned sequence (u64 be)
//! ledger/contracts/<id>        deployment marker
//! ```

use std::sync::Mutex;

use anyhow::Result;
use log::{debug, info};
use tessera_privacy::CommitmentScheme;
use tessera_transaction::{
    ContractArgs, Ledger, LedgerError, Method, Receipt, STATUS_OK, Transaction,
};

use crate::contract::{ContractCall, OwnershipContract};
use crate::storage::{StateStore, WriteSet};

const SEQUENCE_KEY: &[u8] = b"ledger/sequence";
const RESERVED_IDS: [&str; 2] = ["tx", "ledger"];

fn tx_key(tx_id: &str) -> Vec<u8> {
    format!("tx/{tx_id}").into_bytes()
}

fn deployment_key(contract_id: &str) -> Vec<u8> {
    format!("ledger/contracts/{contract_id}").into_bytes()
}

fn storage_error(e: anyhow::Error) -> LedgerError {
    LedgerError::Storage(format!("{e:#}"))
}

/// A contract's view of the shared store: every key gets `<contract_id>/`.
pub struct ScopedStore<'a, S: ?Sized> {
    inner: &'a S,
    prefix: Vec<u8>,
}

impl<'a, S: StateStore + ?Sized> ScopedStore<'a, S> {
    pub fn new(inner: &'a S, contract_id: &str) -> Self {
        Self {
            inner,
            prefix: format!("{contract_id}/").into_bytes(),
        }
    }

    fn scoped(&self, key: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.prefix.len() + key.len());
        out.extend_from_slice(&self.prefix);
        out.extend_from_slice(key);
        out
    }
}

impl<S: StateStore + ?Sized> StateStore for ScopedStore<'_, S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.inner.get(&self.scoped(key))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.inner.put(&self.scoped(key), value)
    }

    fn write_batch(&self, writes: WriteSet) -> Result<()> {
        let writes = writes
            .into_iter()
            .map(|(key, value)| (self.scoped(&key), value))
            .collect();
        self.inner.write_batch(writes)
    }
}

/// Deterministic id: BLAKE3 over the sequence and the framed call.
fn transaction_id(sequence: u64, contract_id: &str, method: Method, args: &ContractArgs) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&sequence.to_be_bytes());
    for part in [contract_id.as_bytes(), method.as_str().as_bytes()] {
        hasher.update(&(part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    for arg in args.iter() {
        hasher.update(&(arg.key.len() as u64).to_be_bytes());
        hasher.update(arg.key.as_bytes());
        hasher.update(&(arg.value.len() as u64).to_be_bytes());
        hasher.update(&arg.value);
    }
    hasher.finalize().to_hex().to_string()
}

pub struct LocalLedger<S, C> {
    store: S,
    contract: OwnershipContract<C>,
    /// Serializes execution; holds the last assigned sequence.
    sequence: Mutex<u64>,
}

impl<S: StateStore, C: CommitmentScheme> LocalLedger<S, C> {
    pub fn new(store: S, scheme: C) -> Result<Self, LedgerError> {
        let sequence = match store.get(SEQUENCE_KEY).map_err(storage_error)? {
            Some(raw) => {
                let arr: [u8; 8] = raw.as_slice().try_into().map_err(|_| {
                    LedgerError::Storage("corrupt ledger sequence".to_string())
                })?;
                u64::from_be_bytes(arr)
            }
            None => 0,
        };
        Ok(Self {
            store,
            contract: OwnershipContract::new(scheme),
            sequence: Mutex::new(sequence),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_deployed(&self, contract_id: &str) -> Result<bool, LedgerError> {
        self.store
            .contains(&deployment_key(contract_id))
            .map_err(storage_error)
    }

    /// Registers the contract id and runs `Init` with the admin key.
    ///
    /// A rejected `Init` still leaves the contract deployed so its
    /// `fail_reason` can be read back.
    pub fn deploy(&self, contract_id: &str, admin_pk: &[u8]) -> Result<Receipt, LedgerError> {
        if contract_id.is_empty()
            || contract_id.contains('/')
            || RESERVED_IDS.contains(&contract_id)
        {
            return Err(LedgerError::UnknownContract(contract_id.to_string()));
        }
        if !self.is_deployed(contract_id)? {
            self.store
                .put(&deployment_key(contract_id), &[])
                .map_err(storage_error)?;
            info!("deployed contract {contract_id}");
        }
        self.submit_contract_call(
            contract_id,
            Method::Init,
            ContractArgs::new().with("admin", admin_pk),
        )
    }
}

impl<S: StateStore, C: CommitmentScheme> Ledger for LocalLedger<S, C> {
    fn submit_contract_call(
        &self,
        contract_id: &str,
        method: Method,
        args: ContractArgs,
    ) -> Result<Receipt, LedgerError> {
        let mut last = self
            .sequence
            .lock()
            .map_err(|_| LedgerError::Storage("ledger lock poisoned".to_string()))?;

        if !self.is_deployed(contract_id)? {
            return Err(LedgerError::UnknownContract(contract_id.to_string()));
        }

        let sequence = *last + 1;
        let tx_id = transaction_id(sequence, contract_id, method, &args);

        let scoped = ScopedStore::new(&self.store, contract_id);
        let outcome =
            ContractCall::parse(method, &args).and_then(|call| self.contract.execute(&scoped, call));

        let status = match &outcome {
            Ok(_) => STATUS_OK,
            Err(e) => e.status(),
        };
        let tx = Transaction {
            id: tx_id.clone(),
            contract_id: contract_id.to_string(),
            method,
            args,
            sequence,
            status,
        };
        self.store
            .write_batch(vec![
                (tx_key(&tx_id), tx.payload()?),
                (SEQUENCE_KEY.to_vec(), sequence.to_be_bytes().to_vec()),
            ])
            .map_err(storage_error)?;
        *last = sequence;

        let receipt = match outcome {
            Ok(result) => Receipt {
                status: STATUS_OK,
                message: "ok".to_string(),
                tx_id,
                result,
            },
            Err(e) => Receipt {
                status,
                message: e.to_string(),
                tx_id,
                result: Vec::new(),
            },
        };
        debug!(
            "tx {} {method} on {contract_id}: status {}",
            receipt.tx_id, receipt.status
        );
        Ok(receipt)
    }

    fn get_transaction_by_id(&self, tx_id: &str) -> Result<Transaction, LedgerError> {
        let raw = self
            .store
            .get(&tx_key(tx_id))
            .map_err(storage_error)?
            .ok_or_else(|| LedgerError::TransactionNotFound(tx_id.to_string()))?;
        Ok(Transaction::from_payload(&raw)?)
    }
}
