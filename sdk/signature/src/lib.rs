//! Tessera Authorization
//!
//! Binds byte payloads to an identity key. Every privileged contract call
//! carries a signature over the exact concatenation of its arguments.
//!
//! ```text
//! digest = SHA256(payload)
//! (R, S) = Ed25519.sign(sk, digest)
//! r      = decimal(LE(R))
//! s      = decimal(LE(S))
//! ```
//!
//! `r` and `s` travel as decimal text so that verifiers never need to agree
//! on a binary integer layout.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Width of each signature component in bytes.
pub const COMPONENT_LEN: usize = 32;

/// Width of a raw Ed25519 public key.
pub const PUBLIC_KEY_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("signature primitive failed: {0}")]
    Primitive(String),
}

/// Why a signature was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("malformed signature component {0}")]
    MalformedComponent(&'static str),

    #[error("public key does not parse")]
    InvalidPublicKey,

    #[error("signature verification failed")]
    Mismatch,
}

/// A signature split into its decimal `r` and `s` components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureParts {
    pub r: String,
    pub s: String,
}

impl SignatureParts {
    pub fn r_bytes(&self) -> &[u8] {
        self.r.as_bytes()
    }

    pub fn s_bytes(&self) -> &[u8] {
        self.s.as_bytes()
    }
}

/// SHA-256 digest of a payload.
pub fn digest(payload: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hasher.finalize().into()
}

/// Concatenates payload fragments in order.
///
/// Client and contract both rebuild signed content through this helper, so
/// argument order is part of the protocol.
pub fn signing_payload(parts: &[&[u8]]) -> Vec<u8> {
    let len = parts.iter().map(|p| p.len()).sum();
    let mut out = Vec::with_capacity(len);
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

/// Signs `payload` with `key`.
pub fn sign(payload: &[u8], key: &SigningKey) -> Result<SignatureParts, SignatureError> {
    let hash = digest(payload);
    let signature = key
        .try_sign(&hash)
        .map_err(|e| SignatureError::Primitive(e.to_string()))?;

    Ok(SignatureParts {
        r: component_to_decimal(signature.r_bytes()),
        s: component_to_decimal(signature.s_bytes()),
    })
}

/// Parses a raw 32-byte Ed25519 public key.
pub fn parse_public_key(public_key: &[u8]) -> Result<VerifyingKey, VerifyError> {
    let pk: [u8; PUBLIC_KEY_LEN] = public_key
        .try_into()
        .map_err(|_| VerifyError::InvalidPublicKey)?;
    VerifyingKey::from_bytes(&pk).map_err(|_| VerifyError::InvalidPublicKey)
}

/// Checks a signature, reporting why it was rejected.
pub fn verify_detailed(
    public_key: &[u8],
    payload: &[u8],
    r_text: &[u8],
    s_text: &[u8],
) -> Result<(), VerifyError> {
    let verifying_key = parse_public_key(public_key)?;

    let r = decimal_to_component(r_text).ok_or(VerifyError::MalformedComponent("r"))?;
    let s = decimal_to_component(s_text).ok_or(VerifyError::MalformedComponent("s"))?;
    let signature = Signature::from_components(r, s);

    let hash = digest(payload);
    verifying_key
        .verify(&hash, &signature)
        .map_err(|_| VerifyError::Mismatch)
}

/// Checks a signature. Malformed input is an invalid result, never a panic.
pub fn verify(public_key: &[u8], payload: &[u8], r_text: &[u8], s_text: &[u8]) -> bool {
    verify_detailed(public_key, payload, r_text, s_text).is_ok()
}

fn component_to_decimal(bytes: &[u8; COMPONENT_LEN]) -> String {
    BigUint::from_bytes_le(bytes).to_str_radix(10)
}

/// Parses canonical decimal text back into a little-endian component.
fn decimal_to_component(text: &[u8]) -> Option<[u8; COMPONENT_LEN]> {
    if text.is_empty() || !text.iter().all(u8::is_ascii_digit) {
        return None;
    }
    // "0" is the only canonical encoding that may start with a zero
    if text.len() > 1 && text[0] == b'0' {
        return None;
    }

    let value = BigUint::parse_bytes(text, 10)?;
    let le = value.to_bytes_le();
    if le.len() > COMPONENT_LEN {
        return None;
    }

    let mut out = [0u8; COMPONENT_LEN];
    out[..le.len()].copy_from_slice(&le);
    Some(out)
}
