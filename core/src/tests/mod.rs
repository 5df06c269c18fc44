mod contract;
mod ledger;

use rand::rngs::OsRng;
use tessera_keypair::Keypair;
use tessera_privacy::{CommitmentScheme, Opening, PedersenCommitments};
use tessera_signature::signing_payload;
use tessera_transaction::{ContractArgs, Ledger, Method, Receipt, ShareHalf};
use tessera_wire::{encode_item_ids, encode_secret_total};

use crate::contract::ContractState;
use crate::ledger::{LocalLedger, ScopedStore};
use crate::storage::MemStore;

const CONTRACT: &str = "transfer";

/// A deployed contract on a fresh in-memory ledger.
struct Fixture {
    ledger: LocalLedger<MemStore, PedersenCommitments>,
    admin: Keypair,
    scheme: PedersenCommitments,
}

impl Fixture {
    fn new() -> Self {
        let admin = Keypair::new_random();
        let ledger = LocalLedger::new(MemStore::new(), PedersenCommitments::new()).unwrap();
        let receipt = ledger
            .deploy(CONTRACT, admin.public_key().as_bytes())
            .unwrap();
        assert!(receipt.is_ok(), "{}", receipt.message);
        Self {
            ledger,
            admin,
            scheme: PedersenCommitments::new(),
        }
    }

    fn call(&self, method: Method, args: ContractArgs) -> Receipt {
        self.ledger
            .submit_contract_call(CONTRACT, method, args)
            .unwrap()
    }

    fn signed(args: ContractArgs, parts: &[&[u8]], signer: &Keypair) -> ContractArgs {
        let sig = signer.sign(&signing_payload(parts)).unwrap();
        args.with("r", sig.r).with("s", sig.s)
    }

    fn add_pid(&self, pid: &str, key: &Keypair) -> Receipt {
        let pk = key.public_key();
        let args = ContractArgs::new().with("pid", pid).with("pk", pk);
        let args = Self::signed(args, &[pid.as_bytes(), pk.as_bytes()], &self.admin);
        self.call(Method::AddPid, args)
    }

    fn create_item(&self, tid: &str, pid: &str) -> Receipt {
        let args = ContractArgs::new().with("tid", tid).with("pid", pid);
        let args = Self::signed(args, &[tid.as_bytes(), pid.as_bytes()], &self.admin);
        self.call(Method::CreateItem, args)
    }

    fn upload(
        &self,
        half: ShareHalf,
        tid: &str,
        value: u64,
        opening: &Opening,
        signer: &Keypair,
    ) -> Receipt {
        let commitment = self.scheme.commit(value, opening).unwrap();
        let gama = format!("gama-{half}-{tid}");
        let args = ContractArgs::new()
            .with("tid", tid)
            .with("gama", &gama)
            .with("commit", commitment);
        let args = Self::signed(
            args,
            &[tid.as_bytes(), gama.as_bytes(), commitment.as_bytes()],
            signer,
        );
        self.call(half.upload_method(), args)
    }

    fn transfer(
        &self,
        tids: &[&str],
        pid: &str,
        total: u64,
        opening: &Opening,
        signer: &Keypair,
    ) -> Receipt {
        let encoded = encode_item_ids(tids).unwrap();
        let total = encode_secret_total(total);
        let args = ContractArgs::new()
            .with("tid", &encoded)
            .with("pid", pid)
            .with("pSecret", total)
            .with("opening", opening);
        let args = Self::signed(
            args,
            &[pid.as_bytes(), &encoded, &total, opening.as_bytes()],
            signer,
        );
        self.call(Method::BatchTransfer, args)
    }

    fn owner(&self, tid: &str) -> String {
        let scoped = ScopedStore::new(self.ledger.store(), CONTRACT);
        ContractState::new(&scoped).owner(tid).unwrap()
    }

    /// Registers `alice` and `bob`, and gives alice items with both halves uploaded.
    fn with_items(&self, items: &[(&str, u64, u64)]) -> Parties {
        let alice = Keypair::new_random();
        let bob = Keypair::new_random();
        assert!(self.add_pid("alice", &alice).is_ok());
        assert!(self.add_pid("bob", &bob).is_ok());

        let mut opening = Opening::zero();
        let mut total = 0;
        for (tid, alpha, beta) in items {
            assert!(self.create_item(tid, "alice").is_ok());
            let (oa, ob) = (Opening::random(&mut OsRng), Opening::random(&mut OsRng));
            assert!(self.upload(ShareHalf::Alpha, tid, *alpha, &oa, &alice).is_ok());
            assert!(self.upload(ShareHalf::Beta, tid, *beta, &ob, &self.admin).is_ok());
            opening = self.scheme.add_openings(&opening, &oa);
            opening = self.scheme.add_openings(&opening, &ob);
            total += alpha + beta;
        }
        Parties {
            alice,
            bob,
            total,
            opening,
        }
    }
}

struct Parties {
    alice: Keypair,
    bob: Keypair,
    total: u64,
    opening: Opening,
}
