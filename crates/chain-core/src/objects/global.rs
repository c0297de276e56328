// chain-core/src/objects/global.rs

use crate::{
    AccountName, Asset, BlockId, ChainProperties, Price, ProtocolVersion, Symbol, Timestamp,
    TransactionId,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// The ledger's shared mutable singleton: head-block metadata, supplies,
/// reward pools and bandwidth state. Nearly every periodic process touches
/// it; all access goes through the store's transactional modify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicGlobalProperties {
    pub head_block_number: u64,
    pub head_block_id: BlockId,
    pub time: Timestamp,
    pub current_witness: AccountName,

    pub current_supply: Asset,
    pub current_debt_supply: Asset,
    /// Core supply plus debt supply valued at the median price
    pub virtual_supply: Asset,

    pub total_vesting_fund: Asset,
    pub total_vesting_shares: Asset,

    pub total_reward_fund: Asset,
    /// Sum of every pending item's curve-transformed reward shares
    pub total_reward_shares: u128,

    pub debt_interest_rate: u16,
    /// Fraction of author debt payouts actually printed as debt asset
    pub debt_print_rate: u16,
    /// Set while the market-cap floor forces the median price
    pub is_forced_min_price: bool,

    pub maximum_block_size: u32,
    pub average_block_size: u32,
    pub custom_ops_bandwidth_multiplier: u16,
    pub current_reserve_ratio: u64,
    pub max_virtual_bandwidth: u128,

    /// Absolute slot number of the head block since genesis
    pub current_aslot: u64,
    /// Bitmap of the last 128 slots; a set bit is a produced block
    pub recent_slots_filled: u128,
    pub participation_count: u8,

    pub last_irreversible_block_num: u64,
    pub num_pow_witnesses: u32,
}

impl DynamicGlobalProperties {
    /// Stake-for-core exchange rate implied by the vesting fund. The ratio
    /// must not change when a user adds funds: Vn = (V * Cn) / C.
    pub fn vesting_share_price(&self) -> Price {
        if self.total_vesting_fund.amount <= 0 || self.total_vesting_shares.amount <= 0 {
            // bootstrap rate: one thousand micro-shares per unit
            return Price {
                base: Asset::vests(1_000_000),
                quote: Asset::agr(1_000),
            };
        }
        Price {
            base: self.total_vesting_shares,
            quote: self.total_vesting_fund,
        }
    }
}

impl Default for DynamicGlobalProperties {
    fn default() -> Self {
        Self {
            head_block_number: 0,
            head_block_id: BlockId::zero(),
            time: Timestamp::ZERO,
            current_witness: AccountName::default(),
            current_supply: Asset::zero(Symbol::Agr),
            current_debt_supply: Asset::zero(Symbol::Agd),
            virtual_supply: Asset::zero(Symbol::Agr),
            total_vesting_fund: Asset::zero(Symbol::Agr),
            total_vesting_shares: Asset::zero(Symbol::Vests),
            total_reward_fund: Asset::zero(Symbol::Agr),
            total_reward_shares: 0,
            debt_interest_rate: 1000,
            debt_print_rate: crate::PERCENT_100,
            is_forced_min_price: false,
            maximum_block_size: 65_536,
            average_block_size: 0,
            custom_ops_bandwidth_multiplier: 10,
            current_reserve_ratio: 1,
            max_virtual_bandwidth: 0,
            current_aslot: 0,
            recent_slots_filled: u128::MAX,
            participation_count: 128,
            last_irreversible_block_num: 0,
            num_pow_witnesses: 0,
        }
    }
}

/// Bounded rolling window of median feed prices
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedHistory {
    /// Median of the window, after the market-cap floor clamp
    pub current_median: Option<Price>,
    pub price_history: VecDeque<Price>,
}

/// The producer rotation for the current round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerSchedule {
    pub current_virtual_time: u128,
    pub next_shuffle_block_num: u64,
    pub current_shuffled_witnesses: Vec<AccountName>,
    pub num_scheduled_witnesses: u8,

    /// Pay weights per schedule class
    pub top_weight: u16,
    pub timeshare_weight: u16,
    pub pow_weight: u16,
    pub witness_pay_normalization_factor: u32,

    pub median_props: ChainProperties,
    pub majority_version: ProtocolVersion,
}

impl Default for ProducerSchedule {
    fn default() -> Self {
        Self {
            current_virtual_time: 0,
            next_shuffle_block_num: 1,
            current_shuffled_witnesses: Vec::new(),
            num_scheduled_witnesses: 1,
            top_weight: 1,
            timeshare_weight: 5,
            pow_weight: 5,
            witness_pay_normalization_factor: 25,
            median_props: ChainProperties::default(),
            majority_version: ProtocolVersion::default(),
        }
    }
}

/// Versioned consensus-rule state: which hardforks have been applied and
/// which one the producers have scheduled next
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardforkProperties {
    /// Index of the last applied hardfork; 0 is genesis rules
    pub last_hardfork: u32,
    /// Application times of every processed hardfork, index-aligned
    pub processed_hardforks: Vec<Timestamp>,
    pub current_version: ProtocolVersion,
    pub next_hardfork: ProtocolVersion,
    pub next_hardfork_time: Timestamp,
}

impl HardforkProperties {
    /// True once hardfork number `n` has been applied
    pub fn has_hardfork(&self, n: u32) -> bool {
        self.processed_hardforks.len() as u32 > n
    }
}

/// Dedup record for a recently applied transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionObject {
    pub trx_id: TransactionId,
    pub expiration: Timestamp,
}
