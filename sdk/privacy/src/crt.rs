//! CRT Reading Keys
//!
//! For a subset S = {p₁, …, pₖ} of the deployment's primes, with M = ∏ pᵢ:
//!
//! ```text
//! μ_S = Σᵢ (M / pᵢ) · ((M / pᵢ)⁻¹ mod pᵢ)
//! ```
//!
//! Each term is ≡ 1 (mod pᵢ) and ≡ 0 (mod pⱼ), so μ_S mod p = 1 for every
//! p ∈ S. μ_S is left unreduced modulo M; it is used as a blinding multiplier.

use std::fs;
use std::path::Path;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};

use crate::encryption::KEY_BITS;
use crate::error::PrivacyError;
use crate::primes::generate_prime;

/// The blinding scalar for one prime subset. Not secret; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingKey(BigUint);

impl ReadingKey {
    /// Derives μ_S for an ordered, non-empty list of pairwise coprime moduli.
    pub fn derive(moduli: &[BigUint]) -> Result<Self, PrivacyError> {
        if moduli.is_empty() {
            return Err(PrivacyError::EmptyPrimeSubset);
        }

        let product = moduli.iter().fold(BigUint::one(), |acc, p| acc * p);
        let mut mu = BigUint::zero();
        for p in moduli {
            let cofactor = &product / p;
            let inverse = (&cofactor % p)
                .modinv(p)
                .ok_or(PrivacyError::NotInvertible)?;
            mu += cofactor * inverse;
        }
        Ok(Self(mu))
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }
}

/// Ordered, pairwise-distinct primes fixed at deployment time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimeSet {
    primes: Vec<BigUint>,
}

impl PrimeSet {
    /// Every prime must be distinct and strictly wider than the symmetric key,
    /// otherwise `k mod p` cannot recover the key.
    pub fn new(primes: Vec<BigUint>) -> Result<Self, PrivacyError> {
        for (index, p) in primes.iter().enumerate() {
            if p.bits() <= KEY_BITS {
                return Err(PrivacyError::PrimeTooSmall {
                    index,
                    bits: p.bits(),
                    required: KEY_BITS,
                });
            }
            if primes[..index].contains(p) {
                return Err(PrivacyError::DuplicatePrime(index));
            }
        }
        Ok(Self { primes })
    }

    /// Parses one decimal integer per line; blank lines are skipped.
    pub fn from_decimal_lines(text: &str) -> Result<Self, PrivacyError> {
        let mut primes = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let p = BigUint::parse_bytes(line.as_bytes(), 10)
                .ok_or(PrivacyError::InvalidPrimeText(line_no + 1))?;
            primes.push(p);
        }
        Self::new(primes)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PrivacyError> {
        let text = fs::read_to_string(path)?;
        Self::from_decimal_lines(&text)
    }

    pub fn to_decimal_lines(&self) -> String {
        let mut out = String::new();
        for p in &self.primes {
            out.push_str(&p.to_str_radix(10));
            out.push('\n');
        }
        out
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PrivacyError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_decimal_lines())?;
        Ok(())
    }

    /// Generates `count` fresh probable primes of `bits` bits each.
    pub fn generate<R: RngCore + CryptoRng>(
        count: usize,
        bits: u64,
        rng: &mut R,
    ) -> Result<Self, PrivacyError> {
        if bits <= KEY_BITS {
            return Err(PrivacyError::PrimeTooSmall {
                index: 0,
                bits,
                required: KEY_BITS,
            });
        }
        let mut primes: Vec<BigUint> = Vec::with_capacity(count);
        while primes.len() < count {
            let p = generate_prime(bits, rng);
            if !primes.contains(&p) {
                primes.push(p);
            }
        }
        Self::new(primes)
    }

    pub fn len(&self) -> usize {
        self.primes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primes.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&BigUint, PrivacyError> {
        self.primes
            .get(index)
            .ok_or(PrivacyError::PrimeIndexOutOfRange {
                index,
                len: self.primes.len(),
            })
    }

    pub fn primes(&self) -> &[BigUint] {
        &self.primes
    }

    /// Selects primes by index, keeping the caller's order.
    pub fn subset(&self, indices: &[usize]) -> Result<Vec<BigUint>, PrivacyError> {
        indices
            .iter()
            .map(|&i| self.get(i).cloned())
            .collect()
    }

    pub fn reading_key(&self, indices: &[usize]) -> Result<ReadingKey, PrivacyError> {
        ReadingKey::derive(&self.subset(indices)?)
    }
}
