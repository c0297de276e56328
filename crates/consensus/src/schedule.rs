// consensus/src/schedule.rs

//! Block-producer rotation.
//!
//! Producers fall into three classes: the top-voted set, rotating
//! "timeshare" producers picked by a weighted virtual-time round robin, and
//! producers qualified through the proof-of-work queue. The round robin
//! advances each producer's virtual position by `LAP_LENGTH / (votes + 1)`
//! per produced block, so higher-voted producers are scheduled more often
//! without starving low-voted ones. Once per full rotation the schedule is
//! rebuilt and reshuffled with a deterministic generator seeded from the
//! head-block time.

use chain_core::{
    AccountName, ChainError, ChainProperties, ChainResult, Ledger, ProtocolVersion,
    ScheduleClass, Timestamp,
};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::debug;

/// One full lap of the virtual schedule
pub const VIRTUAL_SCHEDULE_LAP_LENGTH: u128 = u128::MAX;

/// Multiplier of the xorshift round-shuffle generator
const SHUFFLE_MULTIPLIER: u64 = 2685821657736338717;

/// Producer-count parameters of the rotation
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ScheduleConfig {
    /// Total producers per round
    pub max_witnesses: usize,
    /// Slots reserved for the top-voted class
    pub max_voted_witnesses: usize,
    /// Slots reserved for the proof-of-work queue
    pub max_miner_witnesses: usize,
    /// Producers that must agree on a version for it to be the majority
    pub hardfork_required_witnesses: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            max_witnesses: 21,
            max_voted_witnesses: 19,
            max_miner_witnesses: 1,
            hardfork_required_witnesses: 17,
        }
    }
}

/// Rebuild the schedule if the head block completes a rotation.
///
/// Runs once per `max_witnesses` blocks; other blocks return immediately.
pub fn update_producer_schedule(ledger: &mut Ledger, cfg: &ScheduleConfig) -> ChainResult<()> {
    let head_block_num = ledger.globals()?.head_block_number;
    if head_block_num % cfg.max_witnesses as u64 != 0 {
        return Ok(());
    }
    rebuild_schedule(ledger, cfg)
}

fn rebuild_schedule(ledger: &mut Ledger, cfg: &ScheduleConfig) -> ChainResult<()> {
    let head_block_num = ledger.globals()?.head_block_number;
    let head_block_time = ledger.globals()?.time;

    let mut active: Vec<AccountName> = Vec::with_capacity(cfg.max_witnesses);

    // Highest-voted producers first, ties by name
    let mut by_votes: Vec<(i64, AccountName)> = ledger
        .witnesses()
        .map(|w| (w.votes, w.owner.clone()))
        .collect();
    by_votes.sort_by(|a, b| (Reverse(a.0), &a.1).cmp(&(Reverse(b.0), &b.1)));

    let mut selected: Vec<AccountName> = Vec::new();
    for (_, name) in by_votes.iter() {
        if selected.len() >= cfg.max_voted_witnesses {
            break;
        }
        if ledger.get_witness(name)?.is_shut_down() {
            continue;
        }
        selected.push(name.clone());
        active.push(name.clone());
        ledger.modify_witness(name, |w| w.schedule = ScheduleClass::Top)?;
    }
    let num_top = active.len();

    // Drain the proof-of-work queue, oldest worker first
    let mut pow_queue: Vec<(u64, AccountName)> = ledger
        .witnesses()
        .filter(|w| w.pow_worker > 0)
        .map(|w| (w.pow_worker, w.owner.clone()))
        .collect();
    pow_queue.sort();

    let mut num_pow = 0usize;
    for (_, name) in pow_queue {
        if num_pow < cfg.max_miner_witnesses
            && !selected.contains(&name)
            && !ledger.get_witness(&name)?.is_shut_down()
        {
            selected.push(name.clone());
            active.push(name.clone());
            ledger.modify_witness(&name, |w| w.schedule = ScheduleClass::Pow)?;
            num_pow += 1;
        }
        // processed workers leave the queue either way
        ledger.modify_witness(&name, |w| w.pow_worker = 0)?;
        ledger.modify_globals(|g| g.num_pow_witnesses = g.num_pow_witnesses.saturating_sub(1))?;
    }

    // Fill the rest with the timeshare producers furthest along in
    // virtual time; everyone walked over advances to that time
    let mut by_schedule_time: Vec<(u128, AccountName)> = ledger
        .witnesses()
        .map(|w| (w.virtual_scheduled_time, w.owner.clone()))
        .collect();
    by_schedule_time.sort();

    let mut new_virtual_time = ledger.schedule()?.current_virtual_time;
    let mut processed: Vec<AccountName> = Vec::new();
    let mut count = active.len();
    for (scheduled_time, name) in by_schedule_time {
        if count >= cfg.max_witnesses {
            break;
        }
        new_virtual_time = scheduled_time;
        processed.push(name.clone());

        if ledger.get_witness(&name)?.is_shut_down() {
            continue;
        }
        if !selected.contains(&name) {
            active.push(name.clone());
            ledger.modify_witness(&name, |w| w.schedule = ScheduleClass::Timeshare)?;
            count += 1;
        }
    }
    let num_timeshare = active.len() - num_top - num_pow;

    // Everyone processed restarts the lap from the new virtual time
    let mut reset_virtual_time = false;
    for name in &processed {
        let votes = ledger.get_witness(name)?.votes;
        match new_virtual_time
            .checked_add(VIRTUAL_SCHEDULE_LAP_LENGTH / (votes.max(0) as u128 + 1))
        {
            Some(next) => {
                ledger.modify_witness(name, |w| {
                    w.virtual_position = 0;
                    w.virtual_last_update = new_virtual_time;
                    w.virtual_scheduled_time = next;
                })?;
            }
            None => {
                reset_virtual_time = true;
                break;
            }
        }
    }
    if reset_virtual_time {
        new_virtual_time = 0;
        reset_virtual_schedule_time(ledger)?;
        debug!("virtual schedule time overflowed; resetting lap positions");
    }

    let (majority_version, hardfork_vote) = tally_versions(ledger, cfg)?;
    if let Some((version, time)) = hardfork_vote {
        ledger.modify_hardforks(|h| {
            h.next_hardfork = version;
            h.next_hardfork_time = time;
        })?;
    } else {
        ledger.modify_hardforks(|h| h.next_hardfork = h.current_version)?;
    }

    let normalization = ledger.schedule()?.top_weight as u32 * num_top as u32
        + ledger.schedule()?.pow_weight as u32 * num_pow as u32
        + ledger.schedule()?.timeshare_weight as u32 * num_timeshare as u32;

    let mut shuffled = active;
    shuffle(&mut shuffled, head_block_time);
    let num_scheduled = shuffled.len().max(1) as u8;

    ledger.modify_schedule(|s| {
        s.current_shuffled_witnesses = shuffled;
        s.num_scheduled_witnesses = num_scheduled;
        s.witness_pay_normalization_factor = normalization.max(1);
        s.current_virtual_time = new_virtual_time;
        s.next_shuffle_block_num = head_block_num + num_scheduled as u64;
        s.majority_version = majority_version;
    })?;

    update_median_chain_properties(ledger)
}

/// Deterministic in-place shuffle seeded from the head-block time.
/// Not cryptographically secure, but replay-identical across nodes.
fn shuffle(names: &mut [AccountName], time: Timestamp) {
    let now_hi = time.secs() << 32;
    let n = names.len();
    for i in 0..n {
        let mut k = now_hi.wrapping_add((i as u64).wrapping_mul(SHUFFLE_MULTIPLIER));
        k ^= k >> 12;
        k ^= k << 25;
        k ^= k >> 27;
        k = k.wrapping_mul(SHUFFLE_MULTIPLIER);

        let jmax = (n - i) as u64;
        let j = i + (k % jmax) as usize;
        names.swap(i, j);
    }
}

/// Version consensus across the producers of the outgoing round: the
/// highest version a required majority runs, and the hardfork
/// (version, time) pair a required majority votes for, if any.
fn tally_versions(
    ledger: &Ledger,
    cfg: &ScheduleConfig,
) -> ChainResult<(ProtocolVersion, Option<(ProtocolVersion, Timestamp)>)> {
    let schedule = ledger.schedule()?;
    let mut running_versions: BTreeMap<Reverse<ProtocolVersion>, usize> = BTreeMap::new();
    let mut hardfork_votes: BTreeMap<(ProtocolVersion, Timestamp), usize> = BTreeMap::new();

    for name in &schedule.current_shuffled_witnesses {
        let witness = ledger.get_witness(name)?;
        *running_versions
            .entry(Reverse(witness.running_version))
            .or_default() += 1;
        *hardfork_votes
            .entry((witness.hardfork_version_vote, witness.hardfork_time_vote))
            .or_default() += 1;
    }

    let mut majority_version = schedule.majority_version;
    let mut on_version = 0usize;
    for (Reverse(version), count) in &running_versions {
        on_version += count;
        if on_version >= cfg.hardfork_required_witnesses {
            majority_version = *version;
            break;
        }
    }

    let hardfork_vote = hardfork_votes
        .iter()
        .find(|(_, count)| **count >= cfg.hardfork_required_witnesses)
        .map(|(vote, _)| *vote);

    Ok((majority_version, hardfork_vote))
}

/// Recompute the governing chain properties as the per-field median of the
/// scheduled producers' proposals
fn update_median_chain_properties(ledger: &mut Ledger) -> ChainResult<()> {
    let schedule = ledger.schedule()?;
    let mut fees = Vec::with_capacity(schedule.current_shuffled_witnesses.len());
    let mut sizes = Vec::new();
    let mut rates = Vec::new();
    for name in &schedule.current_shuffled_witnesses {
        let props = &ledger.get_witness(name)?.props;
        fees.push(props.account_creation_fee.amount);
        sizes.push(props.maximum_block_size);
        rates.push(props.debt_interest_rate);
    }
    if fees.is_empty() {
        return Ok(());
    }
    fees.sort_unstable();
    sizes.sort_unstable();
    rates.sort_unstable();
    let mid = fees.len() / 2;

    let median = ChainProperties {
        account_creation_fee: chain_core::Asset::agr(fees[mid]),
        maximum_block_size: sizes[mid],
        debt_interest_rate: rates[mid],
    };

    ledger.modify_schedule(|s| s.median_props = median.clone())?;
    ledger.modify_globals(|g| {
        g.maximum_block_size = median.maximum_block_size;
        g.debt_interest_rate = median.debt_interest_rate;
    })
}

/// Closed-form perturbation of one producer's virtual schedule after a
/// vote-weight change; avoids a full schedule recompute.
pub fn adjust_witness_vote(
    ledger: &mut Ledger,
    witness: &AccountName,
    delta: i64,
) -> ChainResult<()> {
    let current_virtual_time = ledger.schedule()?.current_virtual_time;
    let total_stake = ledger.globals()?.total_vesting_shares.amount;

    let w = ledger.get_witness(witness)?;
    let new_votes = w.votes + delta;
    if new_votes > total_stake {
        return Err(ChainError::Consistency(format!(
            "witness {} votes {} exceed total stake {}",
            witness, new_votes, total_stake
        )));
    }

    ledger.modify_witness(witness, |w| {
        let elapsed = current_virtual_time.wrapping_sub(w.virtual_last_update);
        w.virtual_position = w
            .virtual_position
            .wrapping_add((w.votes.max(0) as u128).wrapping_mul(elapsed));
        w.virtual_last_update = current_virtual_time;
        w.votes = new_votes;

        let remaining = VIRTUAL_SCHEDULE_LAP_LENGTH.saturating_sub(w.virtual_position);
        w.virtual_scheduled_time = match current_virtual_time
            .checked_add(remaining / (w.votes.max(0) as u128 + 1))
        {
            Some(t) => t,
            None => u128::MAX,
        };

        // low-voted producers can compute a time already in the past;
        // push them a full lap out instead
        if w.virtual_scheduled_time < current_virtual_time {
            w.virtual_scheduled_time = u128::MAX;
        }
    })
}

/// Zero every producer's lap position after a virtual-time overflow
pub fn reset_virtual_schedule_time(ledger: &mut Ledger) -> ChainResult<()> {
    ledger.modify_schedule(|s| s.current_virtual_time = 0)?;

    let names: Vec<AccountName> = ledger.witnesses().map(|w| w.owner.clone()).collect();
    for name in names {
        ledger.modify_witness(&name, |w| {
            w.virtual_position = 0;
            w.virtual_last_update = 0;
            w.virtual_scheduled_time =
                VIRTUAL_SCHEDULE_LAP_LENGTH / (w.votes.max(0) as u128 + 1);
        })?;
    }
    Ok(())
}
