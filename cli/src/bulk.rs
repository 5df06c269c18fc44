//! Bulk preparation followed by timed batch transfers.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use rand::Rng;
use rand::rngs::OsRng;
use tessera_client::{PrepareJob, PrepareKeys, prepare_items};
use tessera_privacy::{Opening, SecretShare};
use tessera_transaction::ShareHalf;

use crate::session::Session;

/// Upper bound for random share values, keeps batch totals far from overflow.
const MAX_SHARE_VALUE: u64 = 1_000_000;

fn random_share(rng: &mut OsRng) -> SecretShare {
    SecretShare::new(rng.gen_range(0..MAX_SHARE_VALUE), Opening::random(rng))
}

pub fn make_jobs(prefix: &str, count: usize) -> Vec<PrepareJob> {
    let mut rng = OsRng;
    (0..count)
        .map(|i| PrepareJob {
            item_id: format!("{prefix}-{i}"),
            alpha: random_share(&mut rng),
            beta: random_share(&mut rng),
        })
        .collect()
}

pub async fn run(session: &Session, prefix: &str, owner_pid: &str, destination: &str) -> Result<()> {
    let workers = &session.config.workers;
    let primes = session.primes()?;
    let keys = Arc::new(PrepareKeys {
        owner_pid: owner_pid.to_string(),
        owner: session.user()?,
        admin: session.admin()?,
        alpha_key: session.share_key(&primes, ShareHalf::Alpha)?,
        beta_key: session.share_key(&primes, ShareHalf::Beta)?,
    });
    let prime = session.reading_prime(&primes)?;

    let total = workers.groups * workers.items_per_group;
    println!(
        " Preparing {total} items in {} groups of {}...",
        workers.groups, workers.items_per_group
    );
    let started = Instant::now();
    let report = prepare_items(
        Arc::clone(&session.client),
        make_jobs(prefix, total),
        Arc::clone(&keys),
        workers.groups,
    )
    .await?;
    println!(
        " Prepared {} items in {:.2?} ({} failed)",
        report.prepared.len(),
        started.elapsed(),
        report.failures.len()
    );
    for failure in &report.failures {
        eprintln!("   {}: {}", failure.item_id, failure.error);
    }

    let batch_size = workers.items_per_group.max(1);
    let mut moved = 0;
    let started = Instant::now();
    for (n, batch) in report.prepared.chunks(batch_size).enumerate() {
        let t = Instant::now();
        match session
            .client
            .transfer_product(batch, &prime, destination, &keys.owner)
        {
            Ok(receipt) => {
                moved += batch.len();
                println!(
                    "   batch {n}: {} items -> {destination} in {:.2?} ({})",
                    batch.len(),
                    t.elapsed(),
                    receipt.tx_id
                );
            }
            Err(e) => eprintln!("   batch {n} failed: {e}"),
        }
    }
    println!(" Transferred {moved} items in {:.2?}", started.elapsed());
    Ok(())
}
