//! Tessera Configuration
//!
//! Shared configuration crate for the Tessera binaries.
//!
//! Handles loading configuration from:
//! 1. TS_CONFIG env var (explicit path)
//! 2. ./tessera.toml (current directory)
//! 3. ~/.tessera/tessera.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::{env, fs};
use tessera_privacy::KEY_BITS;

/// Global config instance for convenience access
pub static GLOBAL_CONFIG: OnceLock<TesseraConfig> = OnceLock::new();

const CONFIG_FILE_NAME: &str = "tessera.toml";
const CONFIG_DIR_NAME: &str = ".tessera";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_CONTRACT_ID: &str = "transfer";
const DEFAULT_DB_PATH: &str = "./tessera-db";
const DEFAULT_ADMIN_KEY: &str = "./keys/admin.json";
const DEFAULT_USER_KEY: &str = "./keys/user.json";
const DEFAULT_PRIME_FILE: &str = "./primes.txt";
const DEFAULT_PRIME_COUNT: usize = 2;
const DEFAULT_PRIME_BITS: u64 = 256;
const DEFAULT_READING_PRIME: usize = 0;
const DEFAULT_WORKER_GROUPS: usize = 4;
const DEFAULT_ITEMS_PER_GROUP: usize = 25;

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TesseraConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub primes: PrimesConfig,
    #[serde(default)]
    pub workers: WorkersConfig,
}

/// Local ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_contract_id")]
    pub contract_id: String,
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            contract_id: DEFAULT_CONTRACT_ID.into(),
            db_path: DEFAULT_DB_PATH.into(),
        }
    }
}

fn default_contract_id() -> String {
    DEFAULT_CONTRACT_ID.into()
}
fn default_db_path() -> String {
    DEFAULT_DB_PATH.into()
}

/// Key file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    #[serde(default = "default_admin_key")]
    pub admin_key: String,
    #[serde(default = "default_user_key")]
    pub user_key: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            admin_key: DEFAULT_ADMIN_KEY.into(),
            user_key: DEFAULT_USER_KEY.into(),
        }
    }
}

fn default_admin_key() -> String {
    DEFAULT_ADMIN_KEY.into()
}
fn default_user_key() -> String {
    DEFAULT_USER_KEY.into()
}

/// Prime set used for reading keys.
///
/// `alpha_subset` and `beta_subset` are indices into the prime file; any
/// holder of a listed prime can open shares encrypted for that subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimesConfig {
    #[serde(default = "default_prime_file")]
    pub file: String,
    #[serde(default = "default_prime_count")]
    pub count: usize,
    #[serde(default = "default_prime_bits")]
    pub bits: u64,
    #[serde(default = "default_reading_prime")]
    pub reading_prime: usize,
    #[serde(default = "default_subset")]
    pub alpha_subset: Vec<usize>,
    #[serde(default = "default_subset")]
    pub beta_subset: Vec<usize>,
}

impl Default for PrimesConfig {
    fn default() -> Self {
        Self {
            file: DEFAULT_PRIME_FILE.into(),
            count: DEFAULT_PRIME_COUNT,
            bits: DEFAULT_PRIME_BITS,
            reading_prime: DEFAULT_READING_PRIME,
            alpha_subset: default_subset(),
            beta_subset: default_subset(),
        }
    }
}

fn default_prime_file() -> String {
    DEFAULT_PRIME_FILE.into()
}
fn default_prime_count() -> usize {
    DEFAULT_PRIME_COUNT
}
fn default_prime_bits() -> u64 {
    DEFAULT_PRIME_BITS
}
fn default_reading_prime() -> usize {
    DEFAULT_READING_PRIME
}
fn default_subset() -> Vec<usize> {
    vec![0, 1]
}

/// Preparation task group sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkersConfig {
    #[serde(default = "default_groups")]
    pub groups: usize,
    #[serde(default = "default_items_per_group")]
    pub items_per_group: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            groups: DEFAULT_WORKER_GROUPS,
            items_per_group: DEFAULT_ITEMS_PER_GROUP,
        }
    }
}

fn default_groups() -> usize {
    DEFAULT_WORKER_GROUPS
}
fn default_items_per_group() -> usize {
    DEFAULT_ITEMS_PER_GROUP
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set field from env var if present
fn env_string(key: &str, field: &mut String) {
    if let Ok(v) = env::var(key) {
        *field = v;
    }
}

/// Set field from env var if present and parseable
fn env_parse<T: std::str::FromStr>(key: &str, field: &mut T) {
    if let Ok(v) = env::var(key) {
        match v.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => log::warn!("Ignoring unparseable {key}={v}"),
        }
    }
}

// ============================================================================
// Implementation
// ============================================================================

impl TesseraConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::parse_file(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::parse_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check TS_CONFIG env var
        if let Ok(path) = env::var("TS_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check ./tessera.toml (current directory)
        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        // 3. Check ~/.tessera/tessera.toml
        Self::default_config_path().filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Ledger
        env_string("TS_DB_PATH", &mut self.ledger.db_path);
        env_string("TS_CONTRACT_ID", &mut self.ledger.contract_id);

        // Keys
        env_string("TS_ADMIN_KEY", &mut self.keys.admin_key);
        env_string("TS_USER_KEY", &mut self.keys.user_key);

        // Primes
        env_string("TS_PRIME_FILE", &mut self.primes.file);
        env_parse("TS_PRIME_BITS", &mut self.primes.bits);
        env_parse("TS_PRIME_COUNT", &mut self.primes.count);
        env_parse("TS_READING_PRIME", &mut self.primes.reading_prime);

        // Workers
        env_parse("TS_WORKER_GROUPS", &mut self.workers.groups);
        env_parse("TS_ITEMS_PER_GROUP", &mut self.workers.items_per_group);
    }

    /// Checks the deployment invariants.
    ///
    /// Primes must be wider than the symmetric key, otherwise reducing the
    /// blinded key modulo a prime loses key bits. Every prime index must
    /// point into the prime file.
    pub fn validate(&self) -> Result<()> {
        let primes = &self.primes;
        if primes.bits <= KEY_BITS {
            bail!(
                "primes.bits must exceed the {KEY_BITS}-bit key width, got {}",
                primes.bits
            );
        }
        if primes.count == 0 {
            bail!("primes.count must be at least 1");
        }
        if primes.reading_prime >= primes.count {
            bail!(
                "primes.reading_prime {} is outside the {} configured primes",
                primes.reading_prime,
                primes.count
            );
        }
        for (name, subset) in [("alpha_subset", &primes.alpha_subset), ("beta_subset", &primes.beta_subset)] {
            if subset.is_empty() {
                bail!("primes.{name} is empty");
            }
            if let Some(index) = subset.iter().find(|&&i| i >= primes.count) {
                bail!(
                    "primes.{name} index {index} is outside the {} configured primes",
                    primes.count
                );
            }
        }
        if self.ledger.contract_id.is_empty() {
            bail!("ledger.contract_id is empty");
        }
        if self.workers.groups == 0 {
            bail!("workers.groups must be at least 1");
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        Self::default().to_toml()
    }

    /// Render this configuration as TOML
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Get the global config instance, initializing it if necessary.
    ///
    /// Falls back to defaults if loading fails.
    pub fn global() -> &'static TesseraConfig {
        GLOBAL_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                log::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            })
        })
    }

    /// Returns `None` if config hasn't been initialized yet.
    pub fn try_global() -> Option<&'static TesseraConfig> {
        GLOBAL_CONFIG.get()
    }

    /// Initialize the global config with a specific instance.
    ///
    /// Returns `Err(config)` if already initialized.
    pub fn set_global(config: TesseraConfig) -> Result<(), TesseraConfig> {
        GLOBAL_CONFIG.set(config)
    }
}

/// Shorthand for `TesseraConfig::global()`.
#[inline]
pub fn global_config() -> &'static TesseraConfig {
    TesseraConfig::global()
}

// ============================================================================
// Tests
// ============================================================================
