//! Call handlers for the ownership contract.
//!
//! Every handler finishes all of its checks before it writes, so a rejected
//! call leaves state untouched. The one exception is `Init`, which records
//! why it failed under `fail_reason`.

use std::collections::HashSet;

use log::{debug, info, warn};
use tessera_privacy::{Commitment, CommitmentScheme, Opening};
use tessera_signature::{digest, parse_public_key, signing_payload, verify_detailed};
use tessera_transaction::ShareHalf;
use tessera_wire::encode_cipher_pairs;

use crate::contract::call::{Authorization, BatchTransfer, ContractCall};
use crate::contract::error::{ContractError, HandlerResult};
use crate::contract::state::{
    ADMIN_KEY, ContractState, FAIL_REASON_KEY, batch_key, cipher_key, commit_key, owner_key,
    pid_key,
};
use crate::storage::StateStore;

/// The ledger-side authority for item ownership.
pub struct OwnershipContract<C> {
    scheme: C,
}

impl<C: CommitmentScheme> OwnershipContract<C> {
    pub fn new(scheme: C) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> &C {
        &self.scheme
    }

    /// Runs one call against the contract's store and returns its result bytes.
    pub fn execute<S: StateStore + ?Sized>(
        &self,
        store: &S,
        call: ContractCall,
    ) -> HandlerResult<Vec<u8>> {
        let method = call.method();
        debug!("dispatching {method}");

        let state = ContractState::new(store);
        let result = match call {
            ContractCall::Init { admin } => handle_init(&state, &admin),
            ContractCall::AddPid { pid, pk, auth } => handle_add_pid(&state, &pid, &pk, &auth),
            ContractCall::CreateItem { tid, pid, auth } => {
                handle_create_item(&state, &tid, &pid, &auth)
            }
            ContractCall::UploadShare {
                half,
                tid,
                gama,
                commitment,
                auth,
            } => handle_upload_share(&state, half, &tid, &gama, &commitment, &auth),
            ContractCall::BatchTransfer(batch) => self.handle_batch_transfer(&state, &batch),
            ContractCall::ReadCipher { tid } => handle_read_ciphers(&state, &[tid]),
            ContractCall::ReadCipherBatch { tids } => handle_read_ciphers(&state, &tids),
            ContractCall::ReadFailReason => state.fail_reason(),
        };

        if let Err(e) = &result {
            warn!("{method} rejected ({}): {e}", e.class());
        }
        result
    }

    /// Handle BatchTransfer call.
    ///
    /// A byte-identical batch is applied once, even after the items come back.
    /// A signature from anyone but the current owner is a permission failure.
    fn handle_batch_transfer<S: StateStore + ?Sized>(
        &self,
        state: &ContractState<'_, S>,
        batch: &BatchTransfer,
    ) -> HandlerResult<Vec<u8>> {
        if batch.tids.is_empty() {
            return Err(ContractError::Encoding("empty item list".into()));
        }
        let mut seen = HashSet::with_capacity(batch.tids.len());
        if let Some(dup) = batch.tids.iter().find(|tid| !seen.insert(tid.as_str())) {
            return Err(ContractError::Encoding(format!("item {dup} listed twice")));
        }

        let payload = batch.signed_payload();
        let batch_digest = digest(&payload);
        if state.batch_applied(&batch_digest)? {
            return Err(ContractError::Conflict("batch already applied".into()));
        }

        // items held by different owners mean the batch overlaps an earlier move
        let owner = state.owner(&batch.tids[0])?;
        for tid in &batch.tids[1..] {
            let held_by = state.owner(tid)?;
            if held_by != owner {
                return Err(ContractError::Conflict(format!(
                    "item {tid} is held by {held_by}, not {owner}"
                )));
            }
        }
        let owner_pk = state.pid_key(&owner)?;
        authorize(&owner_pk, &payload, &batch.auth, &owner)?;

        state.pid_key(&batch.pid)?;

        let mut accumulator = self.scheme.commit(0, &Opening::zero())?;
        for tid in &batch.tids {
            let alpha = state.commitment(ShareHalf::Alpha, tid)?;
            let beta = state.commitment(ShareHalf::Beta, tid)?;
            let item = self.scheme.add_commitments(&alpha, &beta)?;
            accumulator = self.scheme.add_commitments(&accumulator, &item)?;
        }

        let opening = self.scheme.add_openings(&Opening::zero(), &batch.opening);
        if !self
            .scheme
            .verify_opening(&accumulator, &opening, batch.secret_total)
        {
            return Err(ContractError::CommitmentMismatch);
        }

        let mut writes: Vec<(Vec<u8>, Vec<u8>)> = batch
            .tids
            .iter()
            .map(|tid| (owner_key(tid), batch.pid.as_bytes().to_vec()))
            .collect();
        writes.push((batch_key(&batch_digest), batch.pid.as_bytes().to_vec()));
        state.store().write_batch(writes)?;

        info!(
            "transferred {} items from {owner} to {}",
            batch.tids.len(),
            batch.pid
        );
        Ok(Vec::new())
    }
}

fn authorize(
    public_key: &[u8],
    payload: &[u8],
    auth: &Authorization,
    signer: &str,
) -> HandlerResult<()> {
    verify_detailed(public_key, payload, &auth.r, &auth.s)
        .map_err(|e| ContractError::PermissionDenied(format!("{signer}: {e}")))
}

/// Handle Init call.
fn handle_init<S: StateStore + ?Sized>(
    state: &ContractState<'_, S>,
    admin: &[u8],
) -> HandlerResult<Vec<u8>> {
    let store = state.store();
    if store.contains(ADMIN_KEY)? {
        return Err(ContractError::Conflict("contract already initialized".into()));
    }
    if let Err(e) = parse_public_key(admin) {
        let reason = format!("init: admin key rejected: {e}");
        store.put(FAIL_REASON_KEY, reason.as_bytes())?;
        return Err(ContractError::Encoding(reason));
    }
    store.put(ADMIN_KEY, admin)?;
    info!("contract initialized");
    Ok(Vec::new())
}

/// Handle AddPid call.
fn handle_add_pid<S: StateStore + ?Sized>(
    state: &ContractState<'_, S>,
    pid: &str,
    pk: &[u8],
    auth: &Authorization,
) -> HandlerResult<Vec<u8>> {
    let admin = state.admin_key()?;
    authorize(&admin, &signing_payload(&[pid.as_bytes(), pk]), auth, "admin")?;

    parse_public_key(pk)
        .map_err(|_| ContractError::Encoding(format!("public key of {pid} is malformed")))?;
    if state.store().contains(&pid_key(pid))? {
        return Err(ContractError::Conflict(format!(
            "pseudo-identity {pid} already registered"
        )));
    }

    state.store().put(&pid_key(pid), pk)?;
    debug!("registered pseudo-identity {pid}");
    Ok(Vec::new())
}

/// Handle CreateItem call.
fn handle_create_item<S: StateStore + ?Sized>(
    state: &ContractState<'_, S>,
    tid: &str,
    pid: &str,
    auth: &Authorization,
) -> HandlerResult<Vec<u8>> {
    let admin = state.admin_key()?;
    authorize(
        &admin,
        &signing_payload(&[tid.as_bytes(), pid.as_bytes()]),
        auth,
        "admin",
    )?;

    if state.item_exists(tid)? {
        return Err(ContractError::Conflict(format!("item {tid} already exists")));
    }
    state.pid_key(pid)?;

    state.store().put(&owner_key(tid), pid.as_bytes())?;
    debug!("created item {tid} for {pid}");
    Ok(Vec::new())
}

/// Handle UploadAlpha / UploadBeta.
///
/// Alpha is signed by the item's current owner, beta by the admin.
fn handle_upload_share<S: StateStore + ?Sized>(
    state: &ContractState<'_, S>,
    half: ShareHalf,
    tid: &str,
    gama: &[u8],
    commitment: &Commitment,
    auth: &Authorization,
) -> HandlerResult<Vec<u8>> {
    let owner = state.owner(tid)?;
    let (signer, signer_pk) = match half {
        ShareHalf::Alpha => (owner.as_str(), state.pid_key(&owner)?),
        ShareHalf::Beta => ("admin", state.admin_key()?),
    };
    let payload = signing_payload(&[tid.as_bytes(), gama, commitment.as_bytes()]);
    authorize(&signer_pk, &payload, auth, signer)?;

    if state.share_written(half, tid)? {
        return Err(ContractError::Conflict(format!(
            "{half} share of {tid} already uploaded"
        )));
    }

    state.store().write_batch(vec![
        (commit_key(half, tid), commitment.as_bytes().to_vec()),
        (cipher_key(half, tid), gama.to_vec()),
    ])?;
    debug!("stored {half} share of {tid}");
    Ok(Vec::new())
}

/// Handle ReadCipher / ReadCipherBatch: `(alpha, beta)` gama frames per item.
fn handle_read_ciphers<S: StateStore + ?Sized>(
    state: &ContractState<'_, S>,
    tids: &[String],
) -> HandlerResult<Vec<u8>> {
    let mut pairs = Vec::with_capacity(tids.len());
    for tid in tids {
        pairs.push((
            state.cipher(ShareHalf::Alpha, tid)?,
            state.cipher(ShareHalf::Beta, tid)?,
        ));
    }
    Ok(encode_cipher_pairs(&pairs)?)
}
