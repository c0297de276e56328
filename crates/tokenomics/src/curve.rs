// tokenomics/src/curve.rs

use chain_core::{
    AccountName, AuctionWindowDestination, ChainError, ChainResult, RewardCurve, PERCENT_100,
};
use num_bigint::BigUint;
use num_traits::ToPrimitive;

/// Shift constant of the quadratic curve; chosen so small posts still earn
pub const CONTENT_CONSTANT: u128 = 2_000_000_000_000;

/// Transform accumulated reward shares through the item's persisted curve
pub fn evaluate_reward_curve(rshares: u128, curve: RewardCurve) -> u128 {
    match curve {
        RewardCurve::Linear => rshares,
        RewardCurve::Quadratic => {
            let s = CONTENT_CONSTANT;
            let shifted = rshares + s;
            shifted * shifted - s * s
        }
    }
}

/// Tokens an item claims from the reward pool: `pool * vshares / total`,
/// scaled by the item's reward weight.
///
/// The product exceeds 128 bits, so the claim is computed in arbitrary
/// precision; a result that does not fit the payout type is a fatal
/// consistency error, not a clamp.
pub fn payout_from_vshares(
    reward_pool: i64,
    vshares: u128,
    total_vshares: u128,
    reward_weight_bps: u16,
) -> ChainResult<u64> {
    if total_vshares == 0 {
        return Ok(0);
    }

    let weighted = (BigUint::from(vshares) * BigUint::from(reward_weight_bps))
        / BigUint::from(PERCENT_100);
    let claim = (BigUint::from(reward_pool.max(0) as u64) * weighted)
        / BigUint::from(total_vshares);

    claim
        .to_u64()
        .filter(|c| *c <= i64::MAX as u64)
        .ok_or(ChainError::Overflow("reward payout"))
}

/// Curation weight a vote earns: the growth of the curve over the item's
/// cumulative positive rshares that this vote caused.
pub fn curation_weight_delta(
    old_vote_rshares: i64,
    new_vote_rshares: i64,
    curve: RewardCurve,
) -> u64 {
    let old = evaluate_reward_curve(old_vote_rshares.max(0) as u128, curve);
    let new = evaluate_reward_curve(new_vote_rshares.max(0) as u128, curve);
    u64::try_from(new.saturating_sub(old)).unwrap_or(u64::MAX)
}

/// Split a vote's full curation weight between the part it keeps and the
/// part forfeited to the auction window. A vote `elapsed` seconds into the
/// window keeps `elapsed / window` of its weight.
pub fn auction_window_split(full_weight: u64, elapsed: u32, window: u32) -> (u64, u64) {
    if window == 0 || elapsed >= window {
        return (full_weight, 0);
    }
    let kept = ((full_weight as u128 * elapsed as u128) / window as u128) as u64;
    (kept, full_weight - kept)
}

/// One vote's standing at cashout
#[derive(Debug, Clone)]
pub struct VoteWeight {
    pub voter: AccountName,
    pub weight: u64,
    /// True when the vote landed after the auction window closed
    pub after_window: bool,
}

/// Result of apportioning the curation side of a payout
#[derive(Debug, Clone, Default)]
pub struct CurationOutcome {
    /// Per-curator claims in pool tokens, in payment order
    pub claims: Vec<(AccountName, u64)>,
    /// Unclaimed tokens returned to the reward pool
    pub to_reward_fund: i64,
    /// Unclaimed tokens the author keeps
    pub back_to_author: i64,
}

/// Apportion `max_rewards` pool tokens among curators by stored weight.
///
/// Every vote claims `max_rewards * weight / total_vote_weight`. The
/// auction-window share — the weight early votes forfeited — goes where the
/// item routed it: back to the pool, to the author, or shared among the
/// votes cast after the window closed, with the heaviest such vote
/// absorbing the rounding remainder.
pub fn apportion_curation(
    max_rewards: i64,
    total_vote_weight: u128,
    auction_window_weight: u128,
    votes_after_window_weight: u128,
    destination: AuctionWindowDestination,
    allow_curation_rewards: bool,
    votes: &[VoteWeight],
) -> CurationOutcome {
    let mut outcome = CurationOutcome::default();

    if !allow_curation_rewards {
        outcome.to_reward_fund = max_rewards;
        return outcome;
    }
    if total_vote_weight == 0 || max_rewards <= 0 {
        outcome.back_to_author = max_rewards.max(0);
        return outcome;
    }

    // heaviest votes first; claims only shrink as we walk down
    let mut ordered: Vec<&VoteWeight> = votes.iter().collect();
    ordered.sort_by(|a, b| b.weight.cmp(&a.weight).then(a.voter.cmp(&b.voter)));

    let total = total_vote_weight;
    let auction_reward =
        (max_rewards as u128 * auction_window_weight) / total;

    let mut unclaimed = max_rewards as u128;
    let mut heaviest_after_window: Option<&VoteWeight> = None;

    for vote in ordered {
        let mut claim = (max_rewards as u128 * vote.weight as u128) / total;

        if destination == AuctionWindowDestination::Curators && vote.after_window {
            if votes_after_window_weight > 0 {
                claim += (auction_reward * vote.weight as u128) / votes_after_window_weight;
            }
            if heaviest_after_window.is_none() {
                // the heaviest post-window vote is settled last with the
                // remainder; skip it here
                heaviest_after_window = Some(vote);
                continue;
            }
        }

        if claim == 0 {
            break;
        }
        unclaimed = unclaimed.saturating_sub(claim);
        outcome.claims.push((vote.voter.clone(), claim as u64));
    }

    if let Some(heaviest) = heaviest_after_window {
        // remainder absorbed by the heaviest post-window curator
        outcome
            .claims
            .push((heaviest.voter.clone(), unclaimed as u64));
        unclaimed = 0;
    }

    match destination {
        AuctionWindowDestination::Author => outcome.back_to_author = unclaimed as i64,
        _ => outcome.to_reward_fund = unclaimed as i64,
    }
    outcome
}
