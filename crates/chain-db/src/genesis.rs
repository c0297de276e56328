// chain-db/src/genesis.rs

//! One-time genesis bootstrap.
//!
//! Creates the system accounts, the initial producers and every singleton,
//! gated on absence of the global-properties object. Optionally imports a
//! snapshot of pre-existing balances validated against a checksum.

use crate::{ChainConfig, ChainError, ChainResult, Database};
use chain_core::{
    Account, AccountName, Asset, Authority, DynamicGlobalProperties, FeedHistory,
    HardforkProperties, ProducerSchedule, Witness,
};
use chain_crypto::{Digestible, KeyPair, SignatureScheme};
use tracing::info;

/// One imported balance
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SnapshotAccount {
    pub name: AccountName,
    pub balance: i64,
}

/// A balance snapshot imported at genesis.
///
/// The checksum is the hex sha256 of the canonical JSON account list; an
/// import whose checksum does not match is refused outright.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GenesisSnapshot {
    pub accounts: Vec<SnapshotAccount>,
    pub checksum: String,
}

impl GenesisSnapshot {
    pub fn new(accounts: Vec<SnapshotAccount>) -> Self {
        let checksum = Self::compute_checksum(&accounts);
        Self { accounts, checksum }
    }

    pub fn compute_checksum(accounts: &[SnapshotAccount]) -> String {
        let canonical =
            serde_json::to_vec(accounts).expect("snapshot serialization is infallible");
        canonical.digest().to_hex()
    }

    pub fn verify(&self) -> ChainResult<()> {
        let computed = Self::compute_checksum(&self.accounts);
        if computed != self.checksum {
            return Err(ChainError::InvalidBlock(format!(
                "snapshot checksum mismatch: declared {}, computed {}",
                self.checksum, computed
            )));
        }
        for account in &self.accounts {
            if !account.name.is_valid() {
                return Err(ChainError::InvalidOperation(format!(
                    "snapshot carries invalid account name {}",
                    account.name
                )));
            }
            if account.balance < 0 {
                return Err(ChainError::InvalidOperation(format!(
                    "snapshot carries negative balance for {}",
                    account.name
                )));
            }
        }
        Ok(())
    }
}

/// Name of the nth initial producer
pub fn init_producer_name(config: &ChainConfig, index: u32) -> AccountName {
    if index == 0 {
        AccountName::new(config.init_producer_name.clone())
    } else {
        AccountName::new(format!("{}-{}", config.init_producer_name, index))
    }
}

/// Deterministic signing key of the nth initial producer
pub fn init_producer_key(config: &ChainConfig, index: u32) -> ChainResult<KeyPair> {
    Ok(KeyPair::from_seed(
        SignatureScheme::Ed25519,
        &format!("{}-{}", config.genesis_key_seed, index),
    )?)
}

pub(crate) fn initialize(
    db: &mut Database,
    snapshot: Option<&GenesisSnapshot>,
) -> ChainResult<()> {
    if db.ledger.globals_initialized() {
        return Err(ChainError::Consistency(
            "genesis state already initialized".into(),
        ));
    }
    let config = db.config.clone();
    let genesis_version = config.hardfork_table[0].0;
    let now = config.genesis_time;

    info!(
        "bootstrapping genesis state with {} producers",
        config.init_producer_count
    );

    // system accounts: the burn sink and the fee-escrow scratch account
    for name in ["null", "temp"] {
        let name = AccountName::from(name);
        db.ledger
            .create_account(name.clone(), Account::new(name, Authority::impossible(), now))?;
    }

    let mut snapshot_total = 0i64;
    if let Some(snapshot) = snapshot {
        snapshot.verify()?;
        for entry in &snapshot.accounts {
            let mut account =
                Account::new(entry.name.clone(), Authority::impossible(), now);
            account.balance = Asset::agr(entry.balance);
            db.ledger.create_account(entry.name.clone(), account)?;
            snapshot_total += entry.balance;
        }
        info!(
            "imported {} snapshot accounts holding {}",
            snapshot.accounts.len(),
            Asset::agr(snapshot_total)
        );
    }

    if snapshot_total + config.initial_vesting > config.initial_supply {
        return Err(ChainError::Consistency(
            "snapshot balances exceed the initial supply".into(),
        ));
    }

    // vested at the bootstrap rate of a thousand micro-shares per unit
    let initial_vesting_shares = config.initial_vesting * 1_000;

    let mut producer_names = Vec::new();
    for i in 0..config.init_producer_count {
        let name = init_producer_name(&config, i);
        let key = init_producer_key(&config, i)?;

        let mut account = Account::new(
            name.clone(),
            Authority::single_key(key.public_key().clone()),
            now,
        );
        if i == 0 {
            // the remainder of the initial supply funds the first
            // producer, part liquid and part staked
            account.balance =
                Asset::agr(config.initial_supply - snapshot_total - config.initial_vesting);
            account.vesting_shares = Asset::vests(initial_vesting_shares);
        }
        db.ledger.create_account(name.clone(), account)?;

        let mut witness = Witness::new(name.clone(), key.public_key().clone(), now);
        witness.running_version = genesis_version;
        witness.hardfork_version_vote = genesis_version;
        witness.hardfork_time_vote = now;
        db.ledger.create_witness(name.clone(), witness)?;

        producer_names.push(name);
    }

    let mut globals = DynamicGlobalProperties {
        time: now,
        current_witness: producer_names[0].clone(),
        current_supply: Asset::agr(config.initial_supply),
        virtual_supply: Asset::agr(config.initial_supply),
        total_vesting_fund: Asset::agr(config.initial_vesting),
        total_vesting_shares: Asset::vests(initial_vesting_shares),
        ..DynamicGlobalProperties::default()
    };
    globals.max_virtual_bandwidth = globals.maximum_block_size as u128
        * globals.current_reserve_ratio as u128
        * config.bandwidth_precision as u128
        * config.bandwidth_average_window_secs as u128
        / config.block_interval_secs as u128;
    db.ledger.init_globals(globals)?;

    db.ledger.init_feed_history(FeedHistory::default())?;

    let schedule = ProducerSchedule {
        current_shuffled_witnesses: producer_names.clone(),
        num_scheduled_witnesses: producer_names.len().max(1) as u8,
        majority_version: genesis_version,
        ..ProducerSchedule::default()
    };
    db.ledger.init_schedule(schedule)?;

    db.ledger.init_hardforks(HardforkProperties {
        last_hardfork: 0,
        processed_hardforks: vec![now],
        current_version: genesis_version,
        next_hardfork: genesis_version,
        next_hardfork_time: now,
    })?;

    Ok(())
}
