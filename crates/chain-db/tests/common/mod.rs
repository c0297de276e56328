// chain-db/tests/common/mod.rs

//! Shared fixtures for the integration suite.

use chain_core::{
    AccountName, Asset, Authority, Operation, SignedBlock, SignedTransaction, Timestamp,
    Transaction,
};
use chain_crypto::{KeyPair, SignatureScheme};
use chain_db::genesis::{init_producer_key, init_producer_name};
use chain_db::{ChainConfig, Database, SkipFlags};

/// A fresh single-producer test chain
pub fn testnet() -> Database {
    Database::open(ChainConfig::testnet()).unwrap()
}

/// A fresh test chain with several genesis producers (for fork tests)
pub fn testnet_with_producers(count: u32) -> Database {
    let config = ChainConfig {
        init_producer_count: count,
        ..ChainConfig::testnet()
    };
    Database::open(config).unwrap()
}

/// Signing key for whichever genesis producer owns the given slot
pub fn producer_key_for(db: &Database, producer: &AccountName) -> KeyPair {
    let config = db.config();
    for i in 0..config.init_producer_count {
        if &init_producer_name(config, i) == producer {
            return init_producer_key(config, i).unwrap();
        }
    }
    panic!("no genesis key for producer {}", producer);
}

/// Produce the next block at the earliest slot
pub fn produce_block(db: &mut Database) -> SignedBlock {
    produce_block_at_slot(db, 1)
}

/// Produce a block at a later slot (skipping the ones between)
pub fn produce_block_at_slot(db: &mut Database, slot: u64) -> SignedBlock {
    let when = db.get_slot_time(slot);
    let producer = db.get_scheduled_producer(slot).unwrap();
    let key = producer_key_for(db, &producer);
    db.generate_block(when, producer, &key, SkipFlags::NOTHING)
        .unwrap()
}

pub fn produce_blocks(db: &mut Database, count: u64) {
    for _ in 0..count {
        produce_block(db);
    }
}

/// Produce blocks until the head time passes `target`
pub fn produce_until(db: &mut Database, target: Timestamp) {
    while db.head_block_time() < target {
        produce_block(db);
    }
}

/// Sign and push a transaction expiring shortly after head time
pub fn push_ops(db: &mut Database, keys: &[&KeyPair], ops: Vec<Operation>) {
    try_push_ops(db, keys, ops).unwrap()
}

pub fn try_push_ops(
    db: &mut Database,
    keys: &[&KeyPair],
    ops: Vec<Operation>,
) -> chain_db::ChainResult<()> {
    let expiration = db.head_block_time().saturating_add(120);
    let mut tx = SignedTransaction::new(Transaction::new(expiration, ops));
    for key in keys {
        tx.sign(key).unwrap();
    }
    db.push_transaction(tx, SkipFlags::NOTHING)
}

/// A deterministic user key
pub fn user_key(seed: &str) -> KeyPair {
    KeyPair::from_seed(SignatureScheme::Ed25519, seed).unwrap()
}

/// Create a funded account via the genesis producer: the creation fee plus
/// an optional liquid grant
pub fn create_account(db: &mut Database, name: &str, grant: i64) -> KeyPair {
    let key = user_key(name);
    let genesis_name = init_producer_name(db.config(), 0);
    let genesis_key = init_producer_key(db.config(), 0).unwrap();
    let fee = db
        .ledger()
        .schedule()
        .unwrap()
        .median_props
        .account_creation_fee;

    let mut ops = vec![Operation::AccountCreate(
        chain_core::operations::AccountCreateOperation {
            fee,
            creator: genesis_name.clone(),
            new_account_name: AccountName::from(name),
            owner: Authority::single_key(key.public_key().clone()),
            active: Authority::single_key(key.public_key().clone()),
            posting: Authority::single_key(key.public_key().clone()),
        },
    )];
    if grant > 0 {
        ops.push(Operation::Transfer(
            chain_core::operations::TransferOperation {
                from: genesis_name,
                to: AccountName::from(name),
                amount: Asset::agr(grant),
                memo: String::new(),
            },
        ));
    }
    push_ops(db, &[&genesis_key], ops);
    key
}

/// Compact structural digest of consensus state, for replay comparisons
pub fn state_fingerprint(db: &Database) -> Vec<String> {
    let mut out = Vec::new();
    let globals = db.ledger().globals().unwrap();
    out.push(format!(
        "head={} id={} supply={} debt={} vests={} fund={} rshares={}",
        globals.head_block_number,
        globals.head_block_id,
        globals.current_supply.amount,
        globals.current_debt_supply.amount,
        globals.total_vesting_shares.amount,
        globals.total_reward_fund.amount,
        globals.total_reward_shares,
    ));
    for account in db.ledger().accounts() {
        out.push(format!(
            "{}: bal={} debt={} sav={} vests={} power={}",
            account.name,
            account.balance.amount,
            account.debt_balance.amount,
            account.savings_balance.amount,
            account.vesting_shares.amount,
            account.voting_power,
        ));
    }
    for comment in db.ledger().comments() {
        out.push(format!(
            "{}/{}: net={} weight={} mode={:?}",
            comment.author,
            comment.permlink,
            comment.net_rshares,
            comment.total_vote_weight,
            comment.mode,
        ));
    }
    for witness in db.ledger().witnesses() {
        out.push(format!("w:{} votes={}", witness.owner, witness.votes));
    }
    out
}
