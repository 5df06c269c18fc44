//! Contract state key domains and typed accessors.
//!
//! ```text
//! admin               → admin public key
//! pid.<pid>           → registered public key
//! owner.<tid>         → current owner pid
//! commit.al.<tid>     → alpha commitment      commit.be.<tid> → beta commitment
//! cipher.al.<tid>     → alpha gama            cipher.be.<tid> → beta gama
//! batch.<hex digest>  → applied-batch marker
//! fail_reason         → last Init failure
//! ```

use tessera_privacy::Commitment;
use tessera_transaction::ShareHalf;

use crate::contract::error::{ContractError, HandlerResult};
use crate::storage::StateStore;

pub const ADMIN_KEY: &[u8] = b"admin";
pub const FAIL_REASON_KEY: &[u8] = b"fail_reason";

pub fn pid_key(pid: &str) -> Vec<u8> {
    format!("pid.{pid}").into_bytes()
}

pub fn owner_key(tid: &str) -> Vec<u8> {
    format!("owner.{tid}").into_bytes()
}

pub fn commit_key(half: ShareHalf, tid: &str) -> Vec<u8> {
    format!("commit.{}.{tid}", half.tag()).into_bytes()
}

pub fn cipher_key(half: ShareHalf, tid: &str) -> Vec<u8> {
    format!("cipher.{}.{tid}", half.tag()).into_bytes()
}

pub fn batch_key(digest: &[u8; 32]) -> Vec<u8> {
    format!("batch.{}", hex::encode(digest)).into_bytes()
}

/// Read-side view over one contract's store.
pub struct ContractState<'a, S: StateStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: StateStore + ?Sized> ContractState<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    pub fn admin_key(&self) -> HandlerResult<Vec<u8>> {
        self.store
            .get(ADMIN_KEY)?
            .ok_or_else(|| ContractError::NotFound("contract admin".into()))
    }

    pub fn pid_key(&self, pid: &str) -> HandlerResult<Vec<u8>> {
        self.store
            .get(&pid_key(pid))?
            .ok_or_else(|| ContractError::NotFound(format!("pseudo-identity {pid}")))
    }

    pub fn owner(&self, tid: &str) -> HandlerResult<String> {
        let raw = self
            .store
            .get(&owner_key(tid))?
            .ok_or_else(|| ContractError::NotFound(format!("item {tid}")))?;
        String::from_utf8(raw).map_err(|_| ContractError::Encoding(format!("owner of {tid}")))
    }

    pub fn item_exists(&self, tid: &str) -> HandlerResult<bool> {
        Ok(self.store.contains(&owner_key(tid))?)
    }

    pub fn commitment(&self, half: ShareHalf, tid: &str) -> HandlerResult<Commitment> {
        let raw = self
            .store
            .get(&commit_key(half, tid))?
            .ok_or_else(|| ContractError::NotFound(format!("{half} commitment of {tid}")))?;
        Ok(Commitment::from_slice(&raw)?)
    }

    pub fn cipher(&self, half: ShareHalf, tid: &str) -> HandlerResult<Vec<u8>> {
        self.store
            .get(&cipher_key(half, tid))?
            .ok_or_else(|| ContractError::NotFound(format!("{half} cipher of {tid}")))
    }

    pub fn share_written(&self, half: ShareHalf, tid: &str) -> HandlerResult<bool> {
        Ok(self.store.contains(&commit_key(half, tid))?
            || self.store.contains(&cipher_key(half, tid))?)
    }

    pub fn batch_applied(&self, digest: &[u8; 32]) -> HandlerResult<bool> {
        Ok(self.store.contains(&batch_key(digest))?)
    }

    pub fn fail_reason(&self) -> HandlerResult<Vec<u8>> {
        Ok(self.store.get(FAIL_REASON_KEY)?.unwrap_or_default())
    }
}
