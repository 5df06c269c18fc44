use anyhow::Result;

/// Ordered key/value writes applied together.
pub type WriteSet = Vec<(Vec<u8>, Vec<u8>)>;

/// decoupling contract logic from the db
pub trait StateStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Applies every write or none of them.
    fn write_batch(&self, writes: WriteSet) -> Result<()>;

    fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}
