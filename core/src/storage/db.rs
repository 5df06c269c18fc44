use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rocksdb::{ColumnFamilyDescriptor, DB, Options, WriteBatch};

use crate::storage::{StateStore, WriteSet};

const CF_STATE: &str = "state";

/// A thread-safe wrapper around RocksDB.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
}

impl RocksDbStore {
    /// Opens the database at the specified path, creating it if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = vec![ColumnFamilyDescriptor::new(CF_STATE, Options::default())];

        let db = DB::open_cf_descriptors(&opts, path, families)
            .map_err(|e| anyhow::anyhow!("Failed to open RocksDB: {}", e))?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl StateStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.db.cf_handle(CF_STATE).context("state CF missing")?;
        Ok(self.db.get_cf(cf, key)?)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.db.cf_handle(CF_STATE).context("state CF missing")?;
        self.db.put_cf(cf, key, value)?;
        Ok(())
    }

    fn write_batch(&self, writes: WriteSet) -> Result<()> {
        let cf = self.db.cf_handle(CF_STATE).context("state CF missing")?;

        let mut batch = WriteBatch::default();
        for (key, value) in &writes {
            batch.put_cf(cf, key, value);
        }
        self.db.write(batch).context("atomic state write failed")?;
        Ok(())
    }
}
