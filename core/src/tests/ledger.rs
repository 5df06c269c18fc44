use tempfile::TempDir;
use tessera_keypair::Keypair;
use tessera_privacy::PedersenCommitments;
use tessera_transaction::{ContractArgs, Ledger, LedgerError, Method};

use super::{CONTRACT, Fixture};
use crate::ledger::LocalLedger;
use crate::storage::{MemStore, RocksDbStore};

#[test]
fn rejected_calls_are_still_recorded() {
    let fx = Fixture::new();
    let receipt = fx.create_item("t1", "nobody");
    assert!(!receipt.is_ok());

    let tx = fx.ledger.get_transaction_by_id(&receipt.tx_id).unwrap();
    assert_eq!(tx.method, Method::CreateItem);
    assert_eq!(tx.contract_id, CONTRACT);
    assert_eq!(tx.parameter("tid"), Some(&b"t1"[..]));
    assert_eq!(tx.id, receipt.tx_id);
    assert_eq!(tx.status, receipt.status);
    assert!(!tx.is_ok());

    let alice = Keypair::new_random();
    let accepted = fx.add_pid("alice", &alice);
    let tx = fx.ledger.get_transaction_by_id(&accepted.tx_id).unwrap();
    assert!(tx.is_ok());
}

#[test]
fn identical_calls_get_distinct_ids() {
    let fx = Fixture::new();
    let a = fx.call(Method::ReadFailReason, ContractArgs::new());
    let b = fx.call(Method::ReadFailReason, ContractArgs::new());
    assert_ne!(a.tx_id, b.tx_id);
    assert_eq!(a.tx_id.len(), 64);

    let (ta, tb) = (
        fx.ledger.get_transaction_by_id(&a.tx_id).unwrap(),
        fx.ledger.get_transaction_by_id(&b.tx_id).unwrap(),
    );
    assert_eq!(tb.sequence, ta.sequence + 1);
}

#[test]
fn unknown_transaction_and_contract() {
    let fx = Fixture::new();
    assert!(matches!(
        fx.ledger.get_transaction_by_id("00"),
        Err(LedgerError::TransactionNotFound(_))
    ));
    assert!(matches!(
        fx.ledger
            .submit_contract_call("other", Method::ReadFailReason, ContractArgs::new()),
        Err(LedgerError::UnknownContract(_))
    ));
}

#[test]
fn reserved_contract_ids_rejected() {
    let ledger = LocalLedger::new(MemStore::new(), PedersenCommitments::new()).unwrap();
    let pk = Keypair::new_random().public_key();
    for id in ["", "tx", "ledger", "a/b"] {
        assert!(matches!(
            ledger.deploy(id, pk.as_bytes()),
            Err(LedgerError::UnknownContract(_))
        ));
    }
}

#[test]
fn contracts_are_isolated() {
    let fx = Fixture::new();
    let alice = Keypair::new_random();
    assert!(fx.add_pid("alice", &alice).is_ok());

    let receipt = fx
        .ledger
        .deploy("second", fx.admin.public_key().as_bytes())
        .unwrap();
    assert!(receipt.is_ok());

    // alice is unknown to the second contract
    let args = ContractArgs::new().with("tid", "t1").with("pid", "alice");
    let args = Fixture::signed(args, &[b"t1", b"alice"], &fx.admin);
    let receipt = fx
        .ledger
        .submit_contract_call("second", Method::CreateItem, args)
        .unwrap();
    assert_eq!(receipt.status, 2);
}

#[test]
fn rocksdb_ledger_keeps_sequence_and_history() {
    let dir = TempDir::new().unwrap();
    let admin = Keypair::new_random();

    let first_id = {
        let store = RocksDbStore::open(dir.path()).unwrap();
        let ledger = LocalLedger::new(store, PedersenCommitments::new()).unwrap();
        let receipt = ledger
            .deploy(CONTRACT, admin.public_key().as_bytes())
            .unwrap();
        assert!(receipt.is_ok());
        receipt.tx_id
    };

    let store = RocksDbStore::open(dir.path()).unwrap();
    let ledger = LocalLedger::new(store, PedersenCommitments::new()).unwrap();
    assert!(ledger.is_deployed(CONTRACT).unwrap());

    let first = ledger.get_transaction_by_id(&first_id).unwrap();
    assert_eq!(first.method, Method::Init);

    let next = ledger
        .submit_contract_call(CONTRACT, Method::ReadFailReason, ContractArgs::new())
        .unwrap();
    let next = ledger.get_transaction_by_id(&next.tx_id).unwrap();
    assert_eq!(next.sequence, first.sequence + 1);
}
