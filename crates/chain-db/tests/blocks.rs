// chain-db/tests/blocks.rs

//! Block pipeline, rollback and fork-choice behavior.

mod common;

use common::*;
use chain_core::{Operation, SignedTransaction, Timestamp, Transaction};
use chain_db::{ChainError, SkipFlags};
use std::sync::{Arc, Mutex};

#[test]
fn test_genesis_bootstraps_once() {
    let db = testnet();
    assert_eq!(db.head_block_num(), 0);
    assert!(db.ledger().globals().is_ok());
    assert!(db
        .ledger()
        .find_account(&chain_core::AccountName::from("null"))
        .is_some());
}

#[test]
fn test_empty_blocks_advance_head() {
    let mut db = testnet();
    produce_blocks(&mut db, 25);

    assert_eq!(db.head_block_num(), 25);
    // emission ran every block
    let globals = db.ledger().globals().unwrap();
    assert!(globals.current_supply.amount > db.config().initial_supply);
    assert!(globals.total_reward_fund.amount > 0);
}

#[test]
fn test_block_with_skipped_slots() {
    let mut db = testnet_with_producers(3);
    produce_blocks(&mut db, 2);
    let before = db.head_block_time();

    produce_block_at_slot(&mut db, 5);
    assert_eq!(
        db.head_block_time(),
        before.saturating_add(5 * db.config().block_interval_secs)
    );

    // the skipped slots were charged to their scheduled producers; the
    // slot owned by the eventual signer is forgiven
    let missed: u32 = db.ledger().witnesses().map(|w| w.total_missed).sum();
    assert_eq!(missed, 3);
}

#[test]
fn test_unsigned_transaction_rejected() {
    let mut db = testnet();
    produce_blocks(&mut db, 1);
    let genesis = chain_db::genesis::init_producer_name(db.config(), 0);

    let tx = SignedTransaction::new(Transaction::new(
        db.head_block_time().saturating_add(60),
        vec![Operation::Transfer(chain_core::operations::TransferOperation {
            from: genesis,
            to: chain_core::AccountName::from("null"),
            amount: chain_core::Asset::agr(100),
            memo: String::new(),
        })],
    ));

    let err = db.push_transaction(tx, SkipFlags::NOTHING).unwrap_err();
    assert!(matches!(err, ChainError::InsufficientAuthority(_)));
}

#[test]
fn test_wrong_key_rejected() {
    let mut db = testnet();
    produce_blocks(&mut db, 1);
    let genesis = chain_db::genesis::init_producer_name(db.config(), 0);
    let imposter = user_key("imposter");

    let err = try_push_ops(
        &mut db,
        &[&imposter],
        vec![Operation::Transfer(chain_core::operations::TransferOperation {
            from: genesis,
            to: chain_core::AccountName::from("null"),
            amount: chain_core::Asset::agr(100),
            memo: String::new(),
        })],
    )
    .unwrap_err();
    assert!(matches!(err, ChainError::InsufficientAuthority(_)));
}

#[test]
fn test_expired_transaction_rejected() {
    let mut db = testnet();
    produce_blocks(&mut db, 2);
    let genesis_key = chain_db::genesis::init_producer_key(db.config(), 0).unwrap();
    let genesis = chain_db::genesis::init_producer_name(db.config(), 0);

    let mut tx = SignedTransaction::new(Transaction::new(
        Timestamp::from_secs(1), // long past
        vec![Operation::Transfer(chain_core::operations::TransferOperation {
            from: genesis,
            to: chain_core::AccountName::from("null"),
            amount: chain_core::Asset::agr(100),
            memo: String::new(),
        })],
    ));
    tx.sign(&genesis_key).unwrap();

    let err = db.push_transaction(tx, SkipFlags::NOTHING).unwrap_err();
    assert!(matches!(err, ChainError::ExpiredTransaction(_)));
}

#[test]
fn test_duplicate_transaction_rejected() {
    let mut db = testnet();
    produce_blocks(&mut db, 1);
    let genesis_key = chain_db::genesis::init_producer_key(db.config(), 0).unwrap();
    let genesis = chain_db::genesis::init_producer_name(db.config(), 0);

    let mut tx = SignedTransaction::new(Transaction::new(
        db.head_block_time().saturating_add(90),
        vec![Operation::Transfer(chain_core::operations::TransferOperation {
            from: genesis,
            to: chain_core::AccountName::from("null"),
            amount: chain_core::Asset::agr(100),
            memo: String::new(),
        })],
    ));
    tx.sign(&genesis_key).unwrap();

    db.push_transaction(tx.clone(), SkipFlags::NOTHING).unwrap();
    let err = db.push_transaction(tx, SkipFlags::NOTHING).unwrap_err();
    assert!(matches!(err, ChainError::DuplicateTransaction(_)));
}

#[test]
fn test_transfer_between_accounts() {
    let mut db = testnet();
    produce_blocks(&mut db, 1);

    let alice_key = create_account(&mut db, "alice", 50_000);
    produce_blocks(&mut db, 1);

    assert_eq!(
        db.ledger()
            .get_account(&"alice".into())
            .unwrap()
            .balance
            .amount,
        50_000
    );

    let to = chain_db::genesis::init_producer_name(db.config(), 0);
    push_ops(
        &mut db,
        &[&alice_key],
        vec![Operation::Transfer(chain_core::operations::TransferOperation {
            from: "alice".into(),
            to,
            amount: chain_core::Asset::agr(20_000),
            memo: "thanks".into(),
        })],
    );
    produce_blocks(&mut db, 1);

    assert_eq!(
        db.ledger()
            .get_account(&"alice".into())
            .unwrap()
            .balance
            .amount,
        30_000
    );
}

#[test]
fn test_overspend_rejected() {
    let mut db = testnet();
    produce_blocks(&mut db, 1);
    let alice_key = create_account(&mut db, "alice", 1_000);
    produce_blocks(&mut db, 1);

    let to = chain_db::genesis::init_producer_name(db.config(), 0);
    let err = try_push_ops(
        &mut db,
        &[&alice_key],
        vec![Operation::Transfer(chain_core::operations::TransferOperation {
            from: "alice".into(),
            to,
            amount: chain_core::Asset::agr(5_000),
            memo: String::new(),
        })],
    )
    .unwrap_err();
    assert!(matches!(err, ChainError::InvalidTransaction(_)));

    // nothing stuck: the speculative state rolled back
    assert_eq!(
        db.ledger()
            .get_account(&"alice".into())
            .unwrap()
            .balance
            .amount,
        1_000
    );
}

#[test]
fn test_pop_and_replay_is_identity() {
    let mut db = testnet_with_producers(5);
    produce_blocks(&mut db, 4);
    create_account(&mut db, "alice", 10_000);
    let blocks: Vec<_> = (0..3).map(|_| produce_block(&mut db)).collect();

    let fingerprint = state_fingerprint(&db);

    for _ in 0..blocks.len() {
        db.pop_block().unwrap();
    }
    assert_eq!(db.head_block_num(), 5);

    for block in &blocks {
        db.push_block(block, SkipFlags::NOTHING).unwrap();
    }
    assert_eq!(state_fingerprint(&db), fingerprint);
}

#[test]
fn test_cannot_pop_irreversible() {
    let mut db = testnet();
    produce_blocks(&mut db, 3);

    // a single producer confirms its own blocks instantly
    assert_eq!(db.last_irreversible_block_num(), db.head_block_num());
    assert!(db.pop_block().is_err());
}

#[test]
fn test_taller_branch_wins_equal_height_does_not() {
    let mut branch_a = testnet_with_producers(3);
    let prefix: Vec<_> = (0..3).map(|_| produce_block(&mut branch_a)).collect();

    // a second instance shares the prefix, then history diverges
    let mut branch_b = testnet_with_producers(3);
    for block in &prefix {
        branch_b.push_block(block, SkipFlags::NOTHING).unwrap();
    }

    let a1 = produce_block_at_slot(&mut branch_a, 1);
    let b1 = produce_block_at_slot(&mut branch_b, 2);
    let b2 = produce_block_at_slot(&mut branch_b, 1);

    // the observer follows branch A first
    let mut observer = testnet_with_producers(3);
    for block in &prefix {
        observer.push_block(block, SkipFlags::NOTHING).unwrap();
    }
    observer.push_block(&a1, SkipFlags::NOTHING).unwrap();
    assert_eq!(observer.head_block_id(), a1.id());

    // an equal-height competitor never reorganizes
    let switched = observer.push_block(&b1, SkipFlags::NOTHING).unwrap();
    assert!(!switched);
    assert_eq!(observer.head_block_id(), a1.id());

    // a strictly taller branch does
    let switched = observer.push_block(&b2, SkipFlags::NOTHING).unwrap();
    assert!(switched);
    assert_eq!(observer.head_block_id(), b2.id());

    // and the state matches having applied branch B directly
    assert_eq!(state_fingerprint(&observer), state_fingerprint(&branch_b));
}

#[test]
fn test_failed_branch_restores_previous_fork() {
    let mut branch_a = testnet_with_producers(3);
    let prefix: Vec<_> = (0..3).map(|_| produce_block(&mut branch_a)).collect();

    let mut branch_b = testnet_with_producers(3);
    for block in &prefix {
        branch_b.push_block(block, SkipFlags::NOTHING).unwrap();
    }

    let a1 = produce_block_at_slot(&mut branch_a, 1);
    let b1 = produce_block_at_slot(&mut branch_b, 2);
    let mut b2 = produce_block_at_slot(&mut branch_b, 1);
    // corrupt the taller branch's tip: same id, bad signature
    b2.producer_signature = b1.producer_signature.clone();

    let mut observer = testnet_with_producers(3);
    for block in &prefix {
        observer.push_block(block, SkipFlags::NOTHING).unwrap();
    }
    observer.push_block(&a1, SkipFlags::NOTHING).unwrap();
    observer.push_block(&b1, SkipFlags::NOTHING).unwrap();

    let before = state_fingerprint(&observer);
    assert!(observer.push_block(&b2, SkipFlags::NOTHING).is_err());

    // the previously winning branch is fully restored
    assert_eq!(observer.head_block_id(), a1.id());
    assert_eq!(state_fingerprint(&observer), before);
}

#[test]
fn test_replay_is_deterministic() {
    // one instance produces a busy history...
    let mut source = testnet();
    let mut blocks = Vec::new();
    blocks.push(produce_block(&mut source));
    let alice_key = create_account(&mut source, "alice", 500_000);
    blocks.push(produce_block(&mut source));
    push_ops(
        &mut source,
        &[&alice_key],
        vec![Operation::TransferToVesting(
            chain_core::operations::TransferToVestingOperation {
                from: "alice".into(),
                to: None,
                amount: chain_core::Asset::agr(100_000),
            },
        )],
    );
    push_ops(
        &mut source,
        &[&alice_key],
        vec![Operation::Post(chain_core::operations::PostOperation {
            parent_author: None,
            parent_permlink: String::new(),
            author: "alice".into(),
            permlink: "hello".into(),
            title: "hello".into(),
            body: "world".into(),
            json_metadata: String::new(),
        })],
    );
    blocks.push(produce_block(&mut source));
    blocks.push(produce_block(&mut source));
    push_ops(
        &mut source,
        &[&alice_key],
        vec![Operation::Vote(chain_core::operations::VoteOperation {
            voter: "alice".into(),
            author: "alice".into(),
            permlink: "hello".into(),
            weight: 10_000,
        })],
    );
    for _ in 0..30 {
        blocks.push(produce_block(&mut source));
    }

    // ...and two fresh instances replay it independently
    let replay = |label: &str| {
        let mut db = testnet();
        let vops = Arc::new(Mutex::new(Vec::new()));
        let sink = vops.clone();
        db.observers_mut().on_post_apply_operation(move |note| {
            if let chain_db::OperationRef::Virtual(vop) = note.op {
                sink.lock().unwrap().push(format!("{:?}", vop));
            }
            Ok(())
        });
        for block in &blocks {
            db.push_block(block, SkipFlags::NOTHING)
                .unwrap_or_else(|e| panic!("{} failed to replay: {}", label, e));
        }
        let seq = vops.lock().unwrap().clone();
        (state_fingerprint(&db), seq)
    };

    let (state_one, vops_one) = replay("first");
    let (state_two, vops_two) = replay("second");

    assert_eq!(state_one, state_two);
    assert_eq!(vops_one, vops_two);
    assert!(!vops_one.is_empty());
}
