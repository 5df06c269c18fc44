use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::{Result, anyhow};

use crate::storage::{StateStore, WriteSet};

/// In-memory state, used by tests and throwaway ledgers.
#[derive(Debug, Default)]
pub struct MemStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StateStore for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().map_err(|_| anyhow!("state lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| anyhow!("state lock poisoned"))?;
        entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn write_batch(&self, writes: WriteSet) -> Result<()> {
        // one write guard for the whole set
        let mut entries = self.entries.write().map_err(|_| anyhow!("state lock poisoned"))?;
        for (key, value) in writes {
            entries.insert(key, value);
        }
        Ok(())
    }
}
