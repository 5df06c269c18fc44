use log::{debug, info};
use num_bigint::BigUint;
use tessera_keypair::{Keypair, PublicKey};
use tessera_privacy::{
    Commitment, CommitmentScheme, Opening, ReadingKey, SecretShare, decrypt, encrypt,
};
use tessera_signature::signing_payload;
use tessera_transaction::{ContractArgs, Ledger, Method, Receipt, ShareHalf};
use tessera_wire::{WireError, decode_cipher_pairs, encode_item_ids, encode_secret_total};

use crate::error::ClientError;

/// Where an item's two shares were uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRefs {
    pub item_id: String,
    pub alpha_tx: String,
    pub beta_tx: String,
}

/// Client side of the ownership contract.
pub struct TransferClient<L, C> {
    ledger: L,
    contract_id: String,
    scheme: C,
}

impl<L: Ledger, C: CommitmentScheme> TransferClient<L, C> {
    pub fn new(ledger: L, contract_id: impl Into<String>, scheme: C) -> Self {
        Self {
            ledger,
            contract_id: contract_id.into(),
            scheme,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    pub fn scheme(&self) -> &C {
        &self.scheme
    }

    /// Submits a call; any non-zero status becomes `Rejected`.
    fn submit(&self, method: Method, args: ContractArgs) -> Result<Receipt, ClientError> {
        let receipt = self
            .ledger
            .submit_contract_call(&self.contract_id, method, args)?;
        if !receipt.is_ok() {
            return Err(ClientError::Rejected {
                method,
                tx_id: receipt.tx_id,
                status: receipt.status,
                message: receipt.message,
            });
        }
        Ok(receipt)
    }

    fn signed(
        args: ContractArgs,
        parts: &[&[u8]],
        signer: &Keypair,
    ) -> Result<ContractArgs, ClientError> {
        let sig = signer.sign(&signing_payload(parts))?;
        Ok(args.with("r", sig.r).with("s", sig.s))
    }

    pub fn add_pid(
        &self,
        pid: &str,
        pk: &PublicKey,
        admin: &Keypair,
    ) -> Result<Receipt, ClientError> {
        let args = ContractArgs::new().with("pid", pid).with("pk", pk);
        let args = Self::signed(args, &[pid.as_bytes(), pk.as_bytes()], admin)?;
        self.submit(Method::AddPid, args)
    }

    pub fn create_item(&self, tid: &str, pid: &str, admin: &Keypair) -> Result<Receipt, ClientError> {
        let args = ContractArgs::new().with("tid", tid).with("pid", pid);
        let args = Self::signed(args, &[tid.as_bytes(), pid.as_bytes()], admin)?;
        self.submit(Method::CreateItem, args)
    }

    /// Encrypts one half for the reading key's primes and uploads it with its
    /// commitment. Alpha is signed by the item owner, beta by the admin.
    pub fn upload_share(
        &self,
        half: ShareHalf,
        tid: &str,
        reading_key: &ReadingKey,
        share: &SecretShare,
        signer: &Keypair,
    ) -> Result<Receipt, ClientError> {
        let (gama, commitment) = encrypt(&self.scheme, reading_key, share)?;
        let args = ContractArgs::new()
            .with("tid", tid)
            .with("gama", &gama)
            .with("commit", commitment);
        let args = Self::signed(args, &[tid.as_bytes(), &gama, commitment.as_bytes()], signer)?;
        let receipt = self.submit(half.upload_method(), args)?;
        debug!("uploaded {half} share of {tid} in {}", receipt.tx_id);
        Ok(receipt)
    }

    pub fn upload_alpha(
        &self,
        tid: &str,
        reading_key: &ReadingKey,
        share: &SecretShare,
        owner: &Keypair,
    ) -> Result<Receipt, ClientError> {
        self.upload_share(ShareHalf::Alpha, tid, reading_key, share, owner)
    }

    pub fn upload_beta(
        &self,
        tid: &str,
        reading_key: &ReadingKey,
        share: &SecretShare,
        admin: &Keypair,
    ) -> Result<Receipt, ClientError> {
        self.upload_share(ShareHalf::Beta, tid, reading_key, share, admin)
    }

    /// Fetches an upload transaction and opens its share with `prime`.
    ///
    /// Only accepted uploads are read. The decrypted share is checked against
    /// the commitment uploaded with it, so a prime outside the encryption
    /// subset is reported, not returned.
    pub fn read_share(
        &self,
        tx_id: &str,
        half: ShareHalf,
        prime: &BigUint,
    ) -> Result<SecretShare, ClientError> {
        let tx = self.ledger.get_transaction_by_id(tx_id)?;
        if tx.method != half.upload_method() {
            return Err(ClientError::WrongMethod {
                tx_id: tx_id.to_string(),
                expected: half.upload_method(),
                found: tx.method,
            });
        }
        if !tx.is_ok() {
            return Err(ClientError::RejectedTransaction {
                tx_id: tx_id.to_string(),
                status: tx.status,
            });
        }

        let param = |key: &'static str| {
            tx.parameter(key).ok_or_else(|| ClientError::MissingParameter {
                tx_id: tx_id.to_string(),
                key,
            })
        };
        let share = decrypt(prime, param("gama")?)?;
        let commitment = Commitment::from_slice(param("commit")?)?;

        if !self
            .scheme
            .verify_opening(&commitment, &share.opening, share.value)
        {
            return Err(ClientError::ShareMismatch {
                tx_id: tx_id.to_string(),
            });
        }
        Ok(share)
    }

    /// Returns the `(alpha, beta)` gamas stored for an item.
    pub fn read_cipher(&self, tid: &str) -> Result<(Vec<u8>, Vec<u8>), ClientError> {
        let receipt = self.submit(Method::ReadCipher, ContractArgs::new().with("tid", tid))?;
        decode_cipher_pairs(&receipt.result)?
            .into_iter()
            .next()
            .ok_or(ClientError::Wire(WireError::Truncated {
                needed: 4,
                available: 0,
            }))
    }

    pub fn read_cipher_batch<S: AsRef<str>>(
        &self,
        tids: &[S],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, ClientError> {
        let args = ContractArgs::new().with("tid", encode_item_ids(tids)?);
        let receipt = self.submit(Method::ReadCipherBatch, args)?;
        Ok(decode_cipher_pairs(&receipt.result)?)
    }

    pub fn read_fail_reason(&self) -> Result<String, ClientError> {
        let receipt = self.submit(Method::ReadFailReason, ContractArgs::new())?;
        Ok(String::from_utf8_lossy(&receipt.result).into_owned())
    }

    /// Moves every listed item to `destination_pid` in one batch.
    ///
    /// Both shares of every item are read back through their own upload
    /// transactions. Values are summed and openings are folded with the
    /// scheme's homomorphic addition, so the totals open the sum of the
    /// on-ledger commitments.
    pub fn transfer_product(
        &self,
        items: &[ShareRefs],
        prime: &BigUint,
        destination_pid: &str,
        signer: &Keypair,
    ) -> Result<Receipt, ClientError> {
        let mut total: u64 = 0;
        let mut opening = Opening::zero();
        for item in items {
            let alpha = self.read_share(&item.alpha_tx, ShareHalf::Alpha, prime)?;
            let beta = self.read_share(&item.beta_tx, ShareHalf::Beta, prime)?;

            total = total
                .checked_add(alpha.value)
                .and_then(|t| t.checked_add(beta.value))
                .ok_or(ClientError::TotalOverflow)?;
            opening = self.scheme.add_openings(&opening, &alpha.opening);
            opening = self.scheme.add_openings(&opening, &beta.opening);
        }

        let ids: Vec<&str> = items.iter().map(|i| i.item_id.as_str()).collect();
        let encoded = encode_item_ids(&ids)?;
        let total_be = encode_secret_total(total);

        let args = ContractArgs::new()
            .with("tid", &encoded)
            .with("pid", destination_pid)
            .with("pSecret", total_be)
            .with("opening", opening);
        let args = Self::signed(
            args,
            &[
                destination_pid.as_bytes(),
                &encoded,
                &total_be,
                opening.as_bytes(),
            ],
            signer,
        )?;

        let receipt =
            self.ledger
                .submit_contract_call(&self.contract_id, Method::BatchTransfer, args)?;
        if !receipt.is_ok() {
            return Err(ClientError::TransferFailed(receipt.message));
        }
        info!(
            "transferred {} items to {destination_pid} in {}",
            items.len(),
            receipt.tx_id
        );
        Ok(receipt)
    }
}
