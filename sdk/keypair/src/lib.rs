use anyhow::{Context, Result, bail};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tessera_signature::{SignatureError, SignatureParts};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Raw Ed25519 verifying key, as registered on the ledger.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim()).context("public key is not hex")?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .context("public key must be 32 bytes")?;
        Ok(Self(arr))
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// An identity's signing key (the admin or a pseudo-identity).
/// NEVER expose this struct's internals.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generates a fresh random identity.
    pub fn new_random() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Reconstructs an identity from its 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn to_seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Signs a payload, producing decimal `r`/`s` components.
    pub fn sign(&self, payload: &[u8]) -> Result<SignatureParts, SignatureError> {
        tessera_signature::sign(payload, &self.signing_key)
    }

    /// Loads a key file holding a JSON array of the 32 seed bytes.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read key file: {}", path.display()))?;
        let bytes: Vec<u8> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse key file: {}", path.display()))?;

        let seed: [u8; 32] = match bytes.as_slice().try_into() {
            Ok(seed) => seed,
            Err(_) => bail!(
                "key file {} holds {} bytes, expected 32",
                path.display(),
                bytes.len()
            ),
        };
        Ok(Self::from_seed(&seed))
    }

    /// Writes the seed as a JSON array. Refuses to overwrite an existing file.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let json = serde_json::to_string(&self.to_seed().to_vec())?;

        let mut f = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(|| format!("Failed to create key file: {}", path.display()))?;

        #[cfg(unix)]
        {
            // chmod 600 (rw-------)
            let mut perms = f.metadata()?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        f.write_all(json.as_bytes())?;
        Ok(())
    }
}
