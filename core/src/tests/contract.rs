use rand::rngs::OsRng;
use tessera_keypair::Keypair;
use tessera_privacy::{CommitmentScheme, Opening};
use tessera_transaction::{ContractArgs, Method, ShareHalf};
use tessera_wire::{decode_cipher_pairs, encode_item_ids};

use super::{CONTRACT, Fixture};
use crate::contract::ContractState;
use crate::ledger::ScopedStore;

const PERMISSION_DENIED: u32 = 1;
const NOT_FOUND: u32 = 2;
const COMMITMENT_MISMATCH: u32 = 3;
const ENCODING: u32 = 4;
const CONFLICT: u32 = 5;

#[test]
fn add_pid_requires_admin_signature() {
    let fx = Fixture::new();
    let mallory = Keypair::new_random();
    let alice = Keypair::new_random();

    let pk = alice.public_key();
    let args = ContractArgs::new().with("pid", "alice").with("pk", pk);
    let args = Fixture::signed(args, &[b"alice", pk.as_bytes()], &mallory);
    let receipt = fx.call(Method::AddPid, args);

    assert_eq!(receipt.status, PERMISSION_DENIED);
    assert!(receipt.message.starts_with("permission denied"));

    // nothing was registered, so the legitimate call still succeeds once
    assert!(fx.add_pid("alice", &alice).is_ok());
    assert_eq!(fx.add_pid("alice", &alice).status, CONFLICT);
}

#[test]
fn add_pid_rejects_malformed_key() {
    let fx = Fixture::new();
    let args = ContractArgs::new().with("pid", "bad").with("pk", [1u8; 31]);
    let args = Fixture::signed(args, &[b"bad", &[1u8; 31]], &fx.admin);
    assert_eq!(fx.call(Method::AddPid, args).status, ENCODING);
}

#[test]
fn create_item_rules() {
    let fx = Fixture::new();
    assert_eq!(fx.create_item("t1", "nobody").status, NOT_FOUND);

    let alice = Keypair::new_random();
    fx.add_pid("alice", &alice);
    assert!(fx.create_item("t1", "alice").is_ok());
    assert_eq!(fx.create_item("t1", "alice").status, CONFLICT);
    assert_eq!(fx.owner("t1"), "alice");
}

#[test]
fn share_upload_signers_and_write_once() {
    let fx = Fixture::new();
    let alice = Keypair::new_random();
    fx.add_pid("alice", &alice);
    fx.create_item("t1", "alice");
    let o = Opening::random(&mut OsRng);

    assert_eq!(
        fx.upload(ShareHalf::Alpha, "missing", 1, &o, &alice).status,
        NOT_FOUND
    );
    // alpha belongs to the owner, beta to the admin
    assert_eq!(
        fx.upload(ShareHalf::Alpha, "t1", 1, &o, &fx.admin).status,
        PERMISSION_DENIED
    );
    assert_eq!(
        fx.upload(ShareHalf::Beta, "t1", 1, &o, &alice).status,
        PERMISSION_DENIED
    );

    assert!(fx.upload(ShareHalf::Alpha, "t1", 1, &o, &alice).is_ok());
    assert!(fx.upload(ShareHalf::Beta, "t1", 2, &o, &fx.admin).is_ok());
    assert_eq!(
        fx.upload(ShareHalf::Alpha, "t1", 9, &o, &alice).status,
        CONFLICT
    );
}

#[test]
fn off_curve_commitment_is_rejected_before_storage() {
    let fx = Fixture::new();
    let p = fx.with_items(&[]);
    fx.create_item("t1", "alice");

    let bogus = [0xffu8; 32];
    let args = ContractArgs::new()
        .with("tid", "t1")
        .with("gama", "gama")
        .with("commit", bogus);
    let args = Fixture::signed(args, &[b"t1", b"gama", &bogus], &p.alice);
    let receipt = fx.call(Method::UploadAlpha, args);
    assert_eq!(receipt.status, ENCODING);

    // nothing was stored, so the item can still be prepared and moved
    let (oa, ob) = (Opening::random(&mut OsRng), Opening::random(&mut OsRng));
    assert!(fx.upload(ShareHalf::Alpha, "t1", 2, &oa, &p.alice).is_ok());
    assert!(fx.upload(ShareHalf::Beta, "t1", 3, &ob, &fx.admin).is_ok());
    let opening = fx.scheme.add_openings(&oa, &ob);
    assert!(fx.transfer(&["t1"], "bob", 5, &opening, &p.alice).is_ok());
}

#[test]
fn batch_transfer_checks_aggregate_total() {
    let fx = Fixture::new();
    // secrets 10 and 15, split across the two halves
    let p = fx.with_items(&[("t1", 4, 6), ("t2", 7, 8)]);
    assert_eq!(p.total, 25);

    let wrong = fx.transfer(&["t1", "t2"], "bob", 26, &p.opening, &p.alice);
    assert_eq!(wrong.status, COMMITMENT_MISMATCH);
    assert!(wrong.message.starts_with("verification failed"));
    assert_eq!(fx.owner("t1"), "alice");
    assert_eq!(fx.owner("t2"), "alice");

    let receipt = fx.transfer(&["t1", "t2"], "bob", 25, &p.opening, &p.alice);
    assert!(receipt.is_ok(), "{}", receipt.message);
    assert_eq!(fx.owner("t1"), "bob");
    assert_eq!(fx.owner("t2"), "bob");
}

#[test]
fn replayed_batch_applies_once() {
    let fx = Fixture::new();
    let p = fx.with_items(&[("t1", 3, 4)]);

    assert!(fx.transfer(&["t1"], "bob", 7, &p.opening, &p.alice).is_ok());
    let replay = fx.transfer(&["t1"], "bob", 7, &p.opening, &p.alice);
    assert_eq!(replay.status, CONFLICT);
    assert_eq!(fx.owner("t1"), "bob");

    // the new owner can move it back
    assert!(fx.transfer(&["t1"], "alice", 7, &p.opening, &p.bob).is_ok());
    assert_eq!(fx.owner("t1"), "alice");
}

#[test]
fn tampered_commitment_blocks_whole_batch() {
    let fx = Fixture::new();
    let p = fx.with_items(&[("t1", 5, 5), ("t2", 1, 1)]);

    // t3's beta commits to 100 but the claim pretends it is 0
    fx.create_item("t3", "alice");
    let (oa, ob) = (Opening::random(&mut OsRng), Opening::random(&mut OsRng));
    fx.upload(ShareHalf::Alpha, "t3", 0, &oa, &p.alice);
    fx.upload(ShareHalf::Beta, "t3", 100, &ob, &fx.admin);
    let opening = fx.scheme.add_openings(&p.opening, &oa);
    let opening = fx.scheme.add_openings(&opening, &ob);

    let receipt = fx.transfer(&["t1", "t2", "t3"], "bob", p.total, &opening, &p.alice);
    assert_eq!(receipt.status, COMMITMENT_MISMATCH);
    for tid in ["t1", "t2", "t3"] {
        assert_eq!(fx.owner(tid), "alice");
    }
}

#[test]
fn batch_transfer_must_be_signed_by_current_owner() {
    let fx = Fixture::new();
    let p = fx.with_items(&[("t1", 1, 2)]);

    let receipt = fx.transfer(&["t1"], "bob", 3, &p.opening, &p.bob);
    assert_eq!(receipt.status, PERMISSION_DENIED);
    assert_eq!(fx.owner("t1"), "alice");
}

#[test]
fn batch_transfer_rejects_mixed_owners() {
    let fx = Fixture::new();
    let p = fx.with_items(&[("t1", 1, 1)]);
    fx.create_item("t2", "bob");

    let receipt = fx.transfer(&["t1", "t2"], "bob", 2, &p.opening, &p.alice);
    assert_eq!(receipt.status, CONFLICT);
    assert_eq!(fx.owner("t1"), "alice");
}

#[test]
fn batch_overlapping_an_earlier_move_conflicts() {
    let fx = Fixture::new();
    let p = fx.with_items(&[("t1", 2, 3)]);
    fx.create_item("t2", "alice");
    let (oa, ob) = (Opening::random(&mut OsRng), Opening::random(&mut OsRng));
    fx.upload(ShareHalf::Alpha, "t2", 4, &oa, &p.alice);
    fx.upload(ShareHalf::Beta, "t2", 5, &ob, &fx.admin);
    let both = fx.scheme.add_openings(&p.opening, &oa);
    let both = fx.scheme.add_openings(&both, &ob);

    // t1 alone moves first, leaving t2 with alice
    assert!(fx.transfer(&["t1"], "bob", 5, &p.opening, &p.alice).is_ok());

    let overlap = fx.transfer(&["t1", "t2"], "bob", 14, &both, &p.alice);
    assert_eq!(overlap.status, CONFLICT);
    assert!(overlap.message.starts_with("conflict"));
    assert_eq!(fx.owner("t2"), "alice");
}

#[test]
fn identical_batch_stays_blocked_after_round_trip() {
    let fx = Fixture::new();
    let p = fx.with_items(&[("t1", 6, 1)]);

    assert!(fx.transfer(&["t1"], "bob", 7, &p.opening, &p.alice).is_ok());
    assert!(fx.transfer(&["t1"], "alice", 7, &p.opening, &p.bob).is_ok());
    assert_eq!(fx.owner("t1"), "alice");

    // shares are write-once, so the same move can never be re-signed differently
    let again = fx.transfer(&["t1"], "bob", 7, &p.opening, &p.alice);
    assert_eq!(again.status, CONFLICT);
    assert_eq!(fx.owner("t1"), "alice");
}

#[test]
fn batch_transfer_rejects_bad_lists_and_destinations() {
    let fx = Fixture::new();
    let p = fx.with_items(&[("t1", 1, 1)]);

    assert_eq!(
        fx.transfer(&[], "bob", 0, &Opening::zero(), &p.alice).status,
        ENCODING
    );
    assert_eq!(
        fx.transfer(&["t1", "t1"], "bob", 4, &p.opening, &p.alice).status,
        ENCODING
    );
    assert_eq!(
        fx.transfer(&["t1"], "carol", 2, &p.opening, &p.alice).status,
        NOT_FOUND
    );
    assert_eq!(
        fx.transfer(&["ghost"], "bob", 2, &p.opening, &p.alice).status,
        NOT_FOUND
    );
}

#[test]
fn batch_needs_both_halves() {
    let fx = Fixture::new();
    let p = fx.with_items(&[]);
    fx.create_item("t1", "alice");
    let o = Opening::random(&mut OsRng);
    fx.upload(ShareHalf::Alpha, "t1", 3, &o, &p.alice);

    let receipt = fx.transfer(&["t1"], "bob", 3, &o, &p.alice);
    assert_eq!(receipt.status, NOT_FOUND);
}

#[test]
fn read_cipher_frames_both_halves() {
    let fx = Fixture::new();
    fx.with_items(&[("t1", 1, 2), ("t2", 3, 4)]);

    let single = fx.call(
        Method::ReadCipher,
        ContractArgs::new().with("tid", "t1"),
    );
    assert!(single.is_ok());
    let pairs = decode_cipher_pairs(&single.result).unwrap();
    assert_eq!(
        pairs,
        vec![(b"gama-alpha-t1".to_vec(), b"gama-beta-t1".to_vec())]
    );

    let batch = fx.call(
        Method::ReadCipherBatch,
        ContractArgs::new().with("tid", encode_item_ids(&["t2", "t1"]).unwrap()),
    );
    let pairs = decode_cipher_pairs(&batch.result).unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].0, b"gama-alpha-t2");

    let missing = fx.call(
        Method::ReadCipher,
        ContractArgs::new().with("tid", "nope"),
    );
    assert_eq!(missing.status, NOT_FOUND);
}

#[test]
fn malformed_admin_key_records_fail_reason() {
    let fx = Fixture::new();
    let ledger = &fx.ledger;

    let receipt = ledger.deploy("broken", &[7u8; 5]).unwrap();
    assert_eq!(receipt.status, ENCODING);

    let reason = tessera_transaction::Ledger::submit_contract_call(
        ledger,
        "broken",
        Method::ReadFailReason,
        ContractArgs::new(),
    )
    .unwrap();
    assert!(reason.is_ok());
    assert!(String::from_utf8(reason.result).unwrap().contains("admin key"));

    // a healthy contract reports no failure
    let clean = fx.call(Method::ReadFailReason, ContractArgs::new());
    assert!(clean.result.is_empty());
}

#[test]
fn second_init_is_a_conflict() {
    let fx = Fixture::new();
    let other = Keypair::new_random();
    let receipt = fx
        .ledger
        .deploy(CONTRACT, other.public_key().as_bytes())
        .unwrap();
    assert_eq!(receipt.status, CONFLICT);

    let scoped = ScopedStore::new(fx.ledger.store(), CONTRACT);
    assert_eq!(
        ContractState::new(&scoped).admin_key().unwrap(),
        fx.admin.public_key().as_bytes()
    );
}
