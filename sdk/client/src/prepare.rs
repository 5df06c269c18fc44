//! Parallel item preparation.
//!
//! Jobs are cut into contiguous, disjoint partitions; each partition runs on
//! its own blocking task and the group is joined before returning. A failed
//! item is reported in the result, never retried in place.

use std::sync::Arc;

use log::{info, warn};
use tessera_keypair::Keypair;
use tessera_privacy::{CommitmentScheme, ReadingKey, SecretShare};
use tessera_transaction::Ledger;
use tokio::task::JoinSet;

use crate::client::{ShareRefs, TransferClient};
use crate::error::ClientError;

/// One item to register and upload.
#[derive(Debug, Clone)]
pub struct PrepareJob {
    pub item_id: String,
    pub alpha: SecretShare,
    pub beta: SecretShare,
}

/// Read-only key material shared by every task.
pub struct PrepareKeys {
    pub owner_pid: String,
    pub owner: Keypair,
    pub admin: Keypair,
    pub alpha_key: ReadingKey,
    pub beta_key: ReadingKey,
}

#[derive(Debug)]
pub struct PrepareFailure {
    pub item_id: String,
    pub error: ClientError,
}

#[derive(Debug, Default)]
pub struct PrepareReport {
    /// In job order
    pub prepared: Vec<ShareRefs>,
    pub failures: Vec<PrepareFailure>,
}

/// Creates the item, then uploads alpha (owner-signed) and beta (admin-signed).
pub fn prepare_item<L: Ledger, C: CommitmentScheme>(
    client: &TransferClient<L, C>,
    keys: &PrepareKeys,
    job: &PrepareJob,
) -> Result<ShareRefs, ClientError> {
    client.create_item(&job.item_id, &keys.owner_pid, &keys.admin)?;
    let alpha = client.upload_alpha(&job.item_id, &keys.alpha_key, &job.alpha, &keys.owner)?;
    let beta = client.upload_beta(&job.item_id, &keys.beta_key, &job.beta, &keys.admin)?;
    Ok(ShareRefs {
        item_id: job.item_id.clone(),
        alpha_tx: alpha.tx_id,
        beta_tx: beta.tx_id,
    })
}

/// Splits `jobs` across `groups` tasks and waits for all of them.
pub async fn prepare_items<L, C>(
    client: Arc<TransferClient<L, C>>,
    jobs: Vec<PrepareJob>,
    keys: Arc<PrepareKeys>,
    groups: usize,
) -> Result<PrepareReport, ClientError>
where
    L: Ledger + 'static,
    C: CommitmentScheme + 'static,
{
    if jobs.is_empty() {
        return Ok(PrepareReport::default());
    }
    let groups = groups.clamp(1, jobs.len());
    let chunk = jobs.len().div_ceil(groups);

    let mut set = JoinSet::new();
    let mut jobs = jobs.into_iter();
    for index in 0..groups {
        let partition: Vec<PrepareJob> = jobs.by_ref().take(chunk).collect();
        if partition.is_empty() {
            break;
        }
        let client = Arc::clone(&client);
        let keys = Arc::clone(&keys);
        set.spawn_blocking(move || {
            let mut report = PrepareReport::default();
            for job in &partition {
                match prepare_item(&client, &keys, job) {
                    Ok(refs) => report.prepared.push(refs),
                    Err(error) => {
                        warn!("preparing {} failed: {error}", job.item_id);
                        report.failures.push(PrepareFailure {
                            item_id: job.item_id.clone(),
                            error,
                        });
                    }
                }
            }
            (index, report)
        });
    }

    let mut partials = Vec::with_capacity(groups);
    while let Some(joined) = set.join_next().await {
        partials.push(joined.map_err(|e| ClientError::Task(e.to_string()))?);
    }
    partials.sort_by_key(|(index, _)| *index);

    let mut report = PrepareReport::default();
    for (_, partial) in partials {
        report.prepared.extend(partial.prepared);
        report.failures.extend(partial.failures);
    }
    info!(
        "prepared {} items in {groups} groups, {} failed",
        report.prepared.len(),
        report.failures.len()
    );
    Ok(report)
}
