//! Tessera client: share upload, share read-back, batch transfers, and a
//! parallel preparation pool.

pub mod client;
pub mod error;
pub mod prepare;

pub use client::{ShareRefs, TransferClient};
pub use error::ClientError;
pub use prepare::{PrepareFailure, PrepareJob, PrepareKeys, PrepareReport, prepare_item, prepare_items};
