// chain-db/src/config.rs

use chain_core::{Asset, ProtocolVersion, Timestamp};
use consensus::ScheduleConfig;
use tokenomics::EmissionParams;

/// Hardfork numbers with compiled-in rule changes
pub mod hardforks {
    /// Linear reward curve for new content and a single payout window
    pub const LINEAR_CURVE: u32 = 1;
    /// Vote-count retally after the witness-vote bookkeeping fix
    pub const VOTE_RETALLY: u32 = 2;
}

/// Consensus constants.
///
/// Every value here is part of consensus: two nodes with different configs
/// diverge. `Default` is the production parameter set; `testnet()` shrinks
/// the windows so integration tests can cross them in a handful of blocks.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub genesis_time: Timestamp,
    /// Seed for the deterministic genesis producer key
    pub genesis_key_seed: String,
    pub init_producer_name: String,
    pub init_producer_count: u32,
    pub initial_supply: i64,
    /// Portion of the initial supply vested to the first producer, so the
    /// chain starts with nonzero stake and a working bandwidth quota
    pub initial_vesting: i64,

    pub block_interval_secs: u64,
    pub schedule: ScheduleConfig,
    pub emission: EmissionParams,
    pub hardfork_table: Vec<(ProtocolVersion, Timestamp)>,

    /// Blocks the undo history can rewind; also the fork-index depth bound
    pub max_undo_history: u64,
    /// Producer confirmations (in basis points of the schedule) required
    /// before a block is irreversible
    pub irreversible_threshold_bps: u16,

    pub feed_interval_blocks: u64,
    pub feed_history_window: usize,
    pub max_feed_age_secs: u64,
    pub min_feeds: usize,

    pub cashout_window_secs: u64,
    pub second_cashout_window_secs: u64,
    pub min_payout: Asset,
    pub auction_window_secs: u32,
    pub default_curation_percent: u16,
    pub max_comment_depth: u16,
    pub min_root_post_interval_secs: u64,
    pub vote_regeneration_secs: u64,

    pub vesting_withdraw_interval_secs: u64,
    pub vesting_withdraw_intervals: u32,
    pub savings_withdraw_delay_secs: u64,
    pub savings_withdraw_limit: u16,
    pub delegation_return_delay_secs: u64,
    pub conversion_delay_secs: u64,
    pub decline_voting_delay_secs: u64,
    /// Blocks of producer silence before the scheduler shuts the key down
    pub producer_shutdown_blocks: u64,
    pub max_vote_changes: i8,
    /// Divisor limiting how much voting power one full-strength vote burns
    pub vote_power_divisor: u16,

    pub interest_compound_interval_secs: u64,
    pub seconds_per_year: u64,
    /// Debt print rate starts throttling at this share of market cap
    pub debt_start_percent: u16,
    /// ... and stops printing entirely at this share
    pub debt_stop_percent: u16,

    pub bandwidth_average_window_secs: u64,
    pub bandwidth_precision: u64,
    pub market_bandwidth_multiplier: u64,
    pub max_reserve_ratio: u64,

    pub liquidity_reward_interval_blocks: u64,
    pub min_liquidity_reward: Asset,
    pub min_liquidity_age_secs: u64,
    /// Market-making volume resets after this much inactivity
    pub liquidity_timeout_secs: u64,

    pub max_transaction_expiration_secs: u64,
    /// Bytes reserved for the block header when sizing transactions
    pub block_header_reserve: usize,
    /// Account-authority resolution depth during signature checking
    pub max_sig_check_depth: u32,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            genesis_time: Timestamp::from_secs(1_640_995_200), // 2022-01-01
            genesis_key_seed: "genesis".into(),
            init_producer_name: "genesis".into(),
            init_producer_count: 1,
            initial_supply: 1_000_000_000,
            initial_vesting: 1_000_000,

            block_interval_secs: 3,
            schedule: ScheduleConfig::default(),
            emission: EmissionParams::default(),
            hardfork_table: vec![
                (ProtocolVersion::new(0, 1, 0), Timestamp::from_secs(1_640_995_200)),
                (ProtocolVersion::new(0, 2, 0), Timestamp::from_secs(1_672_531_200)),
                (ProtocolVersion::new(0, 3, 0), Timestamp::from_secs(1_704_067_200)),
            ],

            max_undo_history: 10_000,
            irreversible_threshold_bps: 7_500,

            feed_interval_blocks: 1_200,
            feed_history_window: 84,
            max_feed_age_secs: 7 * 24 * 3_600,
            min_feeds: 7,

            cashout_window_secs: 24 * 3_600,
            second_cashout_window_secs: 30 * 24 * 3_600,
            min_payout: Asset::agd(20),
            auction_window_secs: 1_800,
            default_curation_percent: 2_500,
            max_comment_depth: 6,
            min_root_post_interval_secs: 5 * 60,
            vote_regeneration_secs: 5 * 24 * 3_600,

            vesting_withdraw_interval_secs: 7 * 24 * 3_600,
            vesting_withdraw_intervals: 13,
            savings_withdraw_delay_secs: 3 * 24 * 3_600,
            savings_withdraw_limit: 100,
            delegation_return_delay_secs: 7 * 24 * 3_600,
            conversion_delay_secs: 3 * 24 * 3_600 + 12 * 3_600,
            decline_voting_delay_secs: 30 * 24 * 3_600,
            producer_shutdown_blocks: 28_800,
            max_vote_changes: 5,
            vote_power_divisor: 30,

            interest_compound_interval_secs: 30 * 24 * 3_600,
            seconds_per_year: 31_536_000,
            debt_start_percent: 200,
            debt_stop_percent: 500,

            bandwidth_average_window_secs: 7 * 24 * 3_600,
            bandwidth_precision: 1_000_000,
            market_bandwidth_multiplier: 10,
            max_reserve_ratio: 20_000,

            liquidity_reward_interval_blocks: 1_200,
            min_liquidity_reward: Asset::agr(1_000),
            min_liquidity_age_secs: 60,
            liquidity_timeout_secs: 7 * 24 * 3_600,

            max_transaction_expiration_secs: 3_600,
            block_header_reserve: 256,
            max_sig_check_depth: 2,
        }
    }
}

impl ChainConfig {
    /// Shrunken windows for integration tests: payouts, withdrawals and
    /// feeds all mature within a few blocks, one feed makes a quorum, and
    /// the hardfork table activates shortly after genesis.
    pub fn testnet() -> Self {
        let genesis = Timestamp::from_secs(1_000_000);
        Self {
            genesis_time: genesis,
            initial_supply: 1_000_000_000,
            schedule: ScheduleConfig {
                hardfork_required_witnesses: 1,
                ..ScheduleConfig::default()
            },
            hardfork_table: vec![
                (ProtocolVersion::new(0, 1, 0), genesis),
                (ProtocolVersion::new(0, 2, 0), genesis.saturating_add(3_600)),
                (ProtocolVersion::new(0, 3, 0), genesis.saturating_add(7_200)),
            ],
            feed_interval_blocks: 5,
            feed_history_window: 4,
            min_feeds: 1,
            cashout_window_secs: 60,
            second_cashout_window_secs: 300,
            min_payout: Asset::agd(0),
            auction_window_secs: 30,
            min_root_post_interval_secs: 0,
            vesting_withdraw_interval_secs: 30,
            vesting_withdraw_intervals: 4,
            savings_withdraw_delay_secs: 30,
            delegation_return_delay_secs: 30,
            conversion_delay_secs: 30,
            decline_voting_delay_secs: 30,
            liquidity_reward_interval_blocks: 20,
            min_liquidity_age_secs: 0,
            ..Self::default()
        }
    }

    pub fn block_interval(&self) -> u64 {
        self.block_interval_secs
    }

    /// The largest transaction `push_transaction` accepts: the dynamic
    /// block-size cap minus reserved header room
    pub fn max_transaction_size(&self, maximum_block_size: u32) -> usize {
        (maximum_block_size as usize).saturating_sub(self.block_header_reserve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hardfork_table_is_valid() {
        let cfg = ChainConfig::default();
        assert!(consensus::HardforkSchedule::new(&cfg.hardfork_table).is_ok());
    }

    #[test]
    fn test_testnet_windows_shrunk() {
        let cfg = ChainConfig::testnet();
        assert!(cfg.cashout_window_secs < ChainConfig::default().cashout_window_secs);
        assert_eq!(cfg.min_feeds, 1);
    }

    #[test]
    fn test_max_transaction_size_reserves_header_room() {
        let cfg = ChainConfig::default();
        assert_eq!(cfg.max_transaction_size(65_536), 65_536 - 256);
    }
}
