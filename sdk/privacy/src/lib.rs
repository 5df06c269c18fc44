//! Tessera Privacy SDK
//!
//! Confidential split-custody primitives. An item's secret is split into an
//! "alpha" and a "beta" share; each share is encrypted so that only holders
//! of selected primes can read it, and committed so that the ledger can check
//! aggregate totals without reading any share.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Share Upload                            │
//! │                                                                  │
//! │   PrimeSet ──subset S──▶ ReadingKey μ_S  (μ_S ≡ 1 mod p, p ∈ S)   │
//! │                                 │                                │
//! │   (value, opening) ──┬──────────┼───────────────┐                │
//! │                      ▼          ▼               ▼                │
//! │               Commit(v, o)   k·μ_S        AES-CBC_k(v ‖ o)       │
//! │                      │          └───────┬───────┘                │
//! │                      ▼                  ▼                        │
//! │                  commitment            gama                      │
//! │                                                                  │
//! │   Reader with p ∈ S:  k = (k·μ_S) mod p  ──▶  (v, o)              │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod crt;
pub mod encryption;
pub mod error;
pub mod primes;

pub use commitment::{Commitment, CommitmentScheme, Opening, PedersenCommitments};
pub use crt::{PrimeSet, ReadingKey};
pub use encryption::{EncryptedShare, KEY_BITS, KEY_LEN, SecretShare, decrypt, encrypt};
pub use error::PrivacyError;
pub use primes::{generate_prime, is_probable_prime};
