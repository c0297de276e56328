// tokenomics/src/emission.rs

use chain_core::{ChainError, ChainResult, PERCENT_100};
use serde::{Deserialize, Serialize};

/// Parameters of the time-decaying inflation schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionParams {
    /// Annual inflation at genesis, basis points
    pub start_inflation_bps: u16,
    /// Inflation floor reached after the narrowing completes, basis points
    pub stop_inflation_bps: u16,
    /// Blocks per 0.01% inflation step down
    pub narrowing_period_blocks: u64,
    pub blocks_per_year: u64,
    /// Share of each block's emission routed to the content-reward pool
    pub content_reward_percent: u16,
    /// Share routed to the stake fund
    pub vesting_fund_percent: u16,
    /// Producers per rotation; scales the producer share before the
    /// class-weight normalization divides it back down
    pub max_witnesses: u32,
}

impl Default for EmissionParams {
    fn default() -> Self {
        Self {
            start_inflation_bps: 1515,
            stop_inflation_bps: 95,
            narrowing_period_blocks: 250_000,
            blocks_per_year: 10_512_000,
            content_reward_percent: 6667,
            vesting_fund_percent: 2667,
            max_witnesses: 21,
        }
    }
}

/// Annual inflation in basis points at a given height: starts at the
/// configured rate and steps down 0.01% per narrowing period until the
/// floor.
pub fn current_inflation_rate_bps(head_block_num: u64, params: &EmissionParams) -> u16 {
    let adjustment = head_block_num / params.narrowing_period_blocks;
    let start = params.start_inflation_bps as u64;
    let floor = params.stop_inflation_bps as u64;
    start.saturating_sub(adjustment).max(floor) as u16
}

/// One block's emission, split three ways
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmissionSplit {
    /// Total new supply this block (content + vesting + producer)
    pub new_supply: i64,
    pub content_reward: i64,
    pub vesting_reward: i64,
    pub producer_reward: i64,
}

/// Compute the block emission at the current height and split it into the
/// content pool, the stake fund and the signing producer's pay.
///
/// The producer share is weighted by the producer's schedule class and
/// divided by the round's normalization factor, so a rotation's total
/// producer pay is independent of its class mix.
pub fn emission_split(
    virtual_supply: i64,
    head_block_num: u64,
    producer_class_weight: u16,
    pay_normalization_factor: u32,
    params: &EmissionParams,
) -> ChainResult<EmissionSplit> {
    let rate = current_inflation_rate_bps(head_block_num, params) as i128;

    let new_supply = (virtual_supply as i128 * rate)
        / (PERCENT_100 as i128 * params.blocks_per_year as i128);

    let content_reward = (new_supply * params.content_reward_percent as i128)
        / PERCENT_100 as i128;
    let vesting_reward = (new_supply * params.vesting_fund_percent as i128)
        / PERCENT_100 as i128;

    let mut producer_reward = new_supply - content_reward - vesting_reward;
    producer_reward *= params.max_witnesses as i128;
    producer_reward *= producer_class_weight as i128;
    producer_reward /= pay_normalization_factor.max(1) as i128;

    let total = content_reward + vesting_reward + producer_reward;

    let as_i64 = |v: i128| i64::try_from(v).map_err(|_| ChainError::Overflow("emission"));
    Ok(EmissionSplit {
        new_supply: as_i64(total)?,
        content_reward: as_i64(content_reward)?,
        vesting_reward: as_i64(vesting_reward)?,
        producer_reward: as_i64(producer_reward)?,
    })
}

/// Interest due on a seconds-weighted debt balance
pub fn debt_interest(debt_seconds: u128, interest_rate_bps: u16, seconds_per_year: u64) -> i64 {
    let interest = (debt_seconds * interest_rate_bps as u128)
        / (seconds_per_year as u128 * PERCENT_100 as u128);
    i64::try_from(interest).unwrap_or(i64::MAX)
}
