//! Shared state for commands that touch the ledger.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use num_bigint::BigUint;
use tessera_client::TransferClient;
use tessera_config::TesseraConfig;
use tessera_core::{LocalLedger, RocksDbStore};
use tessera_keypair::Keypair;
use tessera_privacy::{PedersenCommitments, PrimeSet, ReadingKey};
use tessera_transaction::ShareHalf;

pub type DiskLedger = LocalLedger<RocksDbStore, PedersenCommitments>;
pub type Client = TransferClient<Arc<DiskLedger>, PedersenCommitments>;

pub struct Session {
    pub config: &'static TesseraConfig,
    pub client: Arc<Client>,
}

impl Session {
    pub fn open(config: &'static TesseraConfig) -> Result<Self> {
        config.validate()?;
        let store = RocksDbStore::open(&config.ledger.db_path)
            .with_context(|| format!("Failed to open ledger at {}", config.ledger.db_path))?;
        let ledger = LocalLedger::new(store, PedersenCommitments::new())?;
        log::debug!("opened ledger at {}", config.ledger.db_path);

        let client = TransferClient::new(
            Arc::new(ledger),
            config.ledger.contract_id.clone(),
            PedersenCommitments::new(),
        );
        Ok(Self {
            config,
            client: Arc::new(client),
        })
    }

    pub fn ledger(&self) -> &DiskLedger {
        self.client.ledger()
    }

    pub fn admin(&self) -> Result<Keypair> {
        Keypair::from_file(&self.config.keys.admin_key)
    }

    pub fn user(&self) -> Result<Keypair> {
        Keypair::from_file(&self.config.keys.user_key)
    }

    /// Loads the prime file and checks it holds the configured count.
    pub fn primes(&self) -> Result<PrimeSet> {
        let cfg = &self.config.primes;
        let primes = PrimeSet::load(&cfg.file)
            .with_context(|| format!("Failed to load primes from {}", cfg.file))?;
        if primes.len() < cfg.count {
            bail!(
                "{} holds {} primes, configuration expects {}",
                cfg.file,
                primes.len(),
                cfg.count
            );
        }
        Ok(primes)
    }

    /// This party's own prime.
    pub fn reading_prime(&self, primes: &PrimeSet) -> Result<BigUint> {
        Ok(primes.get(self.config.primes.reading_prime)?.clone())
    }

    /// Reading key for the subset configured for one half.
    pub fn share_key(&self, primes: &PrimeSet, half: ShareHalf) -> Result<ReadingKey> {
        let subset = match half {
            ShareHalf::Alpha => &self.config.primes.alpha_subset,
            ShareHalf::Beta => &self.config.primes.beta_subset,
        };
        Ok(primes.reading_key(subset)?)
    }
}
