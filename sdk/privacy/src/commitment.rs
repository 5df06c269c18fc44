//! Share Commitments
//!
//! Pedersen commitments over the Ristretto group.
//!
//! ```text
//! C = v·G + o·H
//! ```
//!
//! Commitments are additively homomorphic: `C(v1, o1) + C(v2, o2) = C(v1 + v2, o1 + o2)`,
//! which lets the ledger check a batch total without reading any single share.

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use crate::error::PrivacyError;

/// Domain separator for the second generator.
const H_DOMAIN: &[u8] = b"tessera/pedersen/h/v1";

/// A compressed commitment (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment(pub [u8; 32]);

impl Commitment {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Accepts only 32 bytes that decompress to a Ristretto point.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrivacyError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| PrivacyError::InvalidCommitment)?;
        let commitment = Self(arr);
        commitment.to_point()?;
        Ok(commitment)
    }

    fn to_point(self) -> Result<RistrettoPoint, PrivacyError> {
        CompressedRistretto(self.0)
            .decompress()
            .ok_or(PrivacyError::InvalidCommitment)
    }
}

impl AsRef<[u8]> for Commitment {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Blinding factor of a commitment (32 bytes, little-endian scalar)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Opening(pub [u8; 32]);

impl Opening {
    /// The additive identity.
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Draws a uniformly random canonical scalar.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut wide = [0u8; 64];
        rng.fill_bytes(&mut wide);
        Self(Scalar::from_bytes_mod_order_wide(&wide).to_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    fn to_scalar(self) -> Scalar {
        Scalar::from_bytes_mod_order(self.0)
    }
}

impl AsRef<[u8]> for Opening {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The commitment capability consumed by share encryption and by the ledger.
pub trait CommitmentScheme: Send + Sync {
    fn commit(&self, value: u64, opening: &Opening) -> Result<Commitment, PrivacyError>;

    /// Homomorphic addition: commits to the summed values under the summed openings.
    fn add_commitments(&self, a: &Commitment, b: &Commitment)
    -> Result<Commitment, PrivacyError>;

    fn add_openings(&self, a: &Opening, b: &Opening) -> Opening;

    /// Returns false for malformed commitments as well as mismatches.
    fn verify_opening(&self, commitment: &Commitment, opening: &Opening, value: u64) -> bool;
}

/// Pedersen parameters: `G` is the Ristretto basepoint, `H` is hashed to the group.
#[derive(Debug, Clone)]
pub struct PedersenCommitments {
    g: RistrettoPoint,
    h: RistrettoPoint,
}

impl Default for PedersenCommitments {
    fn default() -> Self {
        Self::new()
    }
}

impl PedersenCommitments {
    pub fn new() -> Self {
        Self {
            g: RISTRETTO_BASEPOINT_POINT,
            h: derive_h(),
        }
    }

    fn point(&self, value: u64, opening: &Opening) -> RistrettoPoint {
        self.g * Scalar::from(value) + self.h * opening.to_scalar()
    }
}

/// Nobody knows log_G(H): H comes from a wide hash, not a scalar multiple of G.
fn derive_h() -> RistrettoPoint {
    let mut hasher = Sha512::new();
    hasher.update(H_DOMAIN);
    hasher.update(RISTRETTO_BASEPOINT_POINT.compress().as_bytes());
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&hasher.finalize());
    RistrettoPoint::from_uniform_bytes(&wide)
}

impl CommitmentScheme for PedersenCommitments {
    fn commit(&self, value: u64, opening: &Opening) -> Result<Commitment, PrivacyError> {
        Ok(Commitment(self.point(value, opening).compress().to_bytes()))
    }

    fn add_commitments(
        &self,
        a: &Commitment,
        b: &Commitment,
    ) -> Result<Commitment, PrivacyError> {
        let sum = a.to_point()? + b.to_point()?;
        Ok(Commitment(sum.compress().to_bytes()))
    }

    fn add_openings(&self, a: &Opening, b: &Opening) -> Opening {
        Opening((a.to_scalar() + b.to_scalar()).to_bytes())
    }

    fn verify_opening(&self, commitment: &Commitment, opening: &Opening, value: u64) -> bool {
        match commitment.to_point() {
            Ok(point) => point == self.point(value, opening),
            Err(_) => false,
        }
    }
}
