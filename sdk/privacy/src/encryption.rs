//! Blinded Share Encryption
//!
//! A share `(value, opening)` is encrypted under a fresh 128-bit AES key `k`,
//! and `k` travels blinded by the reading key of the chosen prime subset.
//!
//! ```text
//! Encrypt:
//! 1. commitment = Commit(value, opening)
//! 2. k ← 16 random bytes
//! 3. p = k · μ_S                      (no modular reduction)
//! 4. ct = AES-128-CBC_k(value_be ‖ opening), fixed IV, PKCS#7
//! 5. gama = u32_be(len(ct)) ‖ ct ‖ p_be
//!
//! Decrypt with prime q:
//!   k' = p mod q                      (= k when q ∈ S and k < q)
//! ```
//!
//! Decryption under a prime outside S does not fail; it yields unrelated
//! plaintext. Only the on-ledger commitment can certify a decrypted share.

use aes::Aes128;
use aes::cipher::block_padding::{NoPadding, Pkcs7};
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tessera_wire::{ByteReader, put_bytes};

use crate::commitment::{Commitment, CommitmentScheme, Opening};
use crate::crt::ReadingKey;
use crate::error::PrivacyError;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Symmetric key width in bytes
pub const KEY_LEN: usize = 16;

/// Symmetric key width in bits. Every deployment prime must be wider.
pub const KEY_BITS: u64 = (KEY_LEN as u64) * 8;

/// Protocol-wide CBC initialization vector.
pub const IV: &[u8; 16] = b"abcdabcdabcdabcd";

const BLOCK_LEN: usize = 16;

/// value (8, big-endian) ‖ opening (32)
pub const PLAINTEXT_LEN: usize = 8 + 32;

/// Smallest ciphertext that can carry a padded plaintext.
const MIN_CIPHERTEXT_LEN: usize = 48;

/// One custodian's half of an item secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretShare {
    pub value: u64,
    pub opening: Opening,
}

impl SecretShare {
    pub fn new(value: u64, opening: Opening) -> Self {
        Self { value, opening }
    }

    fn to_plaintext(self) -> [u8; PLAINTEXT_LEN] {
        let mut out = [0u8; PLAINTEXT_LEN];
        out[..8].copy_from_slice(&self.value.to_be_bytes());
        out[8..].copy_from_slice(&self.opening.0);
        out
    }
}

/// The wire form of an encrypted share ("gama")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedShare {
    pub ciphertext: Vec<u8>,
    /// `k · μ_S`, big-endian, unbounded width
    pub blinded_key: BigUint,
}

impl EncryptedShare {
    pub fn to_bytes(&self) -> Result<Vec<u8>, PrivacyError> {
        let mut out = Vec::with_capacity(4 + self.ciphertext.len() + 64);
        put_bytes(&mut out, &self.ciphertext)?;
        out.extend_from_slice(&self.blinded_key.to_bytes_be());
        Ok(out)
    }

    /// The blinded key is everything after the prefixed ciphertext.
    pub fn from_bytes(gama: &[u8]) -> Result<Self, PrivacyError> {
        let mut reader = ByteReader::new(gama);
        let ciphertext = reader.read_prefixed()?;
        if ciphertext.len() % BLOCK_LEN != 0 || ciphertext.len() < MIN_CIPHERTEXT_LEN {
            return Err(PrivacyError::InvalidCiphertextLength(ciphertext.len()));
        }
        let blinded_key = BigUint::from_bytes_be(reader.read_rest());
        Ok(Self {
            ciphertext: ciphertext.to_vec(),
            blinded_key,
        })
    }
}

/// Encrypts a share for every holder of a prime in the reading key's subset.
///
/// # Returns
/// The serialized gama and the commitment to `(value, opening)`.
pub fn encrypt<C: CommitmentScheme + ?Sized>(
    scheme: &C,
    reading_key: &ReadingKey,
    share: &SecretShare,
) -> Result<(Vec<u8>, Commitment), PrivacyError> {
    encrypt_with_rng(scheme, reading_key, share, &mut OsRng)
}

pub fn encrypt_with_rng<C, R>(
    scheme: &C,
    reading_key: &ReadingKey,
    share: &SecretShare,
    rng: &mut R,
) -> Result<(Vec<u8>, Commitment), PrivacyError>
where
    C: CommitmentScheme + ?Sized,
    R: RngCore + CryptoRng,
{
    let commitment = scheme.commit(share.value, &share.opening)?;

    let mut key = [0u8; KEY_LEN];
    rng.try_fill_bytes(&mut key)
        .map_err(|e| PrivacyError::Randomness(e.to_string()))?;

    let blinded_key = BigUint::from_bytes_be(&key) * reading_key.value();

    let cipher = Aes128CbcEnc::new_from_slices(&key, IV)
        .map_err(|e| PrivacyError::Cipher(e.to_string()))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(&share.to_plaintext());

    let gama = EncryptedShare {
        ciphertext,
        blinded_key,
    }
    .to_bytes()?;
    Ok((gama, commitment))
}

/// Opens a gama with one deployment prime.
///
/// Only framing errors are reported. A prime outside the encryption subset
/// yields a share that will not match its commitment.
pub fn decrypt(prime: &BigUint, gama: &[u8]) -> Result<SecretShare, PrivacyError> {
    let encrypted = EncryptedShare::from_bytes(gama)?;
    let key = recover_key(&encrypted.blinded_key, prime)?;

    let cipher = Aes128CbcDec::new_from_slices(&key, IV)
        .map_err(|e| PrivacyError::Cipher(e.to_string()))?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<NoPadding>(&encrypted.ciphertext)
        .map_err(|e| PrivacyError::Cipher(e.to_string()))?;

    // padding is not checked: a wrong key must not be distinguishable here
    let mut value = [0u8; 8];
    value.copy_from_slice(&plaintext[..8]);
    let mut opening = [0u8; 32];
    opening.copy_from_slice(&plaintext[8..PLAINTEXT_LEN]);

    Ok(SecretShare {
        value: u64::from_be_bytes(value),
        opening: Opening(opening),
    })
}

/// `p mod q`, left-padded to the key width. Wider residues keep their low bytes.
fn recover_key(blinded_key: &BigUint, prime: &BigUint) -> Result<[u8; KEY_LEN], PrivacyError> {
    if prime < &BigUint::from(2u8) {
        return Err(PrivacyError::InvalidPrime);
    }
    let residue = (blinded_key % prime).to_bytes_be();
    let mut key = [0u8; KEY_LEN];
    if residue.len() >= KEY_LEN {
        key.copy_from_slice(&residue[residue.len() - KEY_LEN..]);
    } else {
        key[KEY_LEN - residue.len()..].copy_from_slice(&residue);
    }
    Ok(key)
}
