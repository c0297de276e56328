// chain-core/src/objects/witness.rs

use crate::{AccountName, Asset, Price, ProtocolVersion, Timestamp};
use chain_crypto::PublicKey;
use serde::{Deserialize, Serialize};

/// Which scheduling class a producer was last placed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleClass {
    /// Not currently scheduled
    None,
    /// One of the top-voted producers
    Top,
    /// Rotating producer scheduled by virtual time
    Timeshare,
    /// Producer qualified through the proof-of-work queue
    Pow,
}

/// Chain parameters a producer proposes; the schedule medians govern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainProperties {
    pub account_creation_fee: Asset,
    pub maximum_block_size: u32,
    pub debt_interest_rate: u16,
}

impl Default for ChainProperties {
    fn default() -> Self {
        Self {
            account_creation_fee: Asset::agr(1000),
            maximum_block_size: 65_536,
            debt_interest_rate: 1000,
        }
    }
}

/// A block producer record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Witness {
    pub owner: AccountName,
    pub created: Timestamp,
    pub url: String,

    /// Sum of stake-weighted approvals; bounded above by total stake
    pub votes: i64,
    pub schedule: ScheduleClass,

    /// Weighted round-robin bookkeeping. `virtual_position` advances
    /// proportionally to votes as virtual time passes;
    /// `virtual_scheduled_time` is the closed-form instant the position
    /// reaches a full lap.
    pub virtual_last_update: u128,
    pub virtual_position: u128,
    pub virtual_scheduled_time: u128,

    /// Empty key means the producer is shut down and unschedulable
    pub signing_key: PublicKey,

    pub props: ChainProperties,

    /// Published price feed for the debt asset, if any
    pub exchange_rate: Option<Price>,
    pub last_exchange_update: Timestamp,

    pub total_missed: u32,
    pub last_confirmed_block_num: u64,
    pub last_aslot: u64,

    /// Nonzero while queued for a proof-of-work slot
    pub pow_worker: u64,

    pub running_version: ProtocolVersion,
    pub hardfork_version_vote: ProtocolVersion,
    pub hardfork_time_vote: Timestamp,
}

impl Witness {
    pub fn new(owner: AccountName, signing_key: PublicKey, created: Timestamp) -> Self {
        Self {
            owner,
            created,
            url: String::new(),
            votes: 0,
            schedule: ScheduleClass::None,
            virtual_last_update: 0,
            virtual_position: 0,
            virtual_scheduled_time: u128::MAX,
            signing_key,
            props: ChainProperties::default(),
            exchange_rate: None,
            last_exchange_update: Timestamp::ZERO,
            total_missed: 0,
            last_confirmed_block_num: 0,
            last_aslot: 0,
            pow_worker: 0,
            running_version: ProtocolVersion::default(),
            hardfork_version_vote: ProtocolVersion::default(),
            hardfork_time_vote: Timestamp::ZERO,
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.signing_key.is_empty()
    }
}
