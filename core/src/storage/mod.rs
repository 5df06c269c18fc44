pub mod db;
pub mod memory;
pub mod state;

pub use db::RocksDbStore;
pub use memory::MemStore;
pub use state::{StateStore, WriteSet};
