// chain-db/src/evaluators/content.rs

use crate::config::hardforks;
use crate::{ChainError, ChainResult, Database};
use chain_core::operations::*;
use chain_core::{
    AuctionWindowDestination, Comment, PayoutMode, RewardCurve, VoteRecord, PERCENT_100,
};
use tokenomics::{auction_window_split, curation_weight_delta, evaluate_reward_curve};

fn logic(msg: impl Into<String>) -> ChainError {
    ChainError::LogicViolation(msg.into())
}

pub(super) fn post(db: &mut Database, op: &PostOperation) -> ChainResult<()> {
    let author = db.ledger().get_account(&op.author)?;
    let now = db.head_block_time();
    let last_root_post = author.last_root_post;

    if let Some(existing) = db.ledger().find_comment_by_permlink(&op.author, &op.permlink) {
        // edit
        if existing.mode == PayoutMode::Archived {
            return Err(logic("cannot edit archived content"));
        }
        let id = existing.id;
        return db.ledger_mut().modify_comment(&id, |c| c.last_update = now);
    }

    let parent = match &op.parent_author {
        Some(parent_author) => {
            let parent = db
                .ledger()
                .get_comment_by_permlink(parent_author, &op.parent_permlink)?;
            if !parent.allow_replies {
                return Err(logic("parent does not accept replies"));
            }
            if parent.depth >= db.config().max_comment_depth {
                return Err(logic("reply nesting is too deep"));
            }
            Some((parent.id, parent.root, parent.depth))
        }
        None => {
            if now.secs_since(last_root_post) < db.config().min_root_post_interval_secs {
                return Err(logic("root posts are rate limited"));
            }
            None
        }
    };

    let curve = if db.has_hardfork(hardforks::LINEAR_CURVE) {
        RewardCurve::Linear
    } else {
        RewardCurve::Quadratic
    };

    let id = db.ledger_mut().allocate_content_id();
    let comment = Comment {
        id,
        author: op.author.clone(),
        permlink: op.permlink.clone(),
        parent: parent.map(|(pid, _, _)| pid),
        root: parent.map(|(_, root, _)| root).unwrap_or(id),
        depth: parent.map(|(_, _, d)| d + 1).unwrap_or(0),
        children: 0,
        created: now,
        last_update: now,
        last_payout: chain_core::Timestamp::ZERO,
        cashout_time: now.saturating_add(db.config().cashout_window_secs),
        max_cashout_time: now.saturating_add(db.config().second_cashout_window_secs),
        mode: PayoutMode::FirstWindow,
        net_rshares: 0,
        abs_rshares: 0,
        vote_rshares: 0,
        net_votes: 0,
        total_vote_weight: 0,
        auction_window_weight: 0,
        votes_after_auction_window_weight: 0,
        reward_weight: PERCENT_100,
        reward_curve: curve,
        curation_percent: db.config().default_curation_percent,
        auction_window_size: db.config().auction_window_secs,
        auction_window_destination: AuctionWindowDestination::RewardFund,
        max_accepted_payout: chain_core::Asset::agd(1_000_000_000_000),
        percent_debt: PERCENT_100,
        allow_replies: true,
        allow_votes: true,
        allow_curation_rewards: true,
        beneficiaries: Vec::new(),
    };
    db.ledger_mut().create_comment(comment)?;

    // bump child counters up the whole ancestor chain
    let mut cursor = parent.map(|(pid, _, _)| pid);
    while let Some(pid) = cursor {
        db.ledger_mut().modify_comment(&pid, |c| c.children += 1)?;
        cursor = db.ledger().get_comment(&pid)?.parent;
    }

    db.ledger_mut().modify_account(&op.author, |a| {
        a.post_count += 1;
        if parent.is_none() {
            a.last_root_post = now;
        }
    })
}

pub(super) fn comment_options(
    db: &mut Database,
    op: &CommentOptionsOperation,
) -> ChainResult<()> {
    let comment = db
        .ledger()
        .get_comment_by_permlink(&op.author, &op.permlink)?;
    if comment.mode == PayoutMode::Archived {
        return Err(logic("cannot change options of archived content"));
    }

    // only restrictions may follow votes
    if op.max_accepted_payout > comment.max_accepted_payout {
        return Err(logic("payout cap can only be lowered"));
    }
    if op.percent_debt > comment.percent_debt {
        return Err(logic("debt percent can only be lowered"));
    }
    if !comment.allow_votes && op.allow_votes {
        return Err(logic("voting cannot be re-enabled"));
    }
    if !comment.allow_curation_rewards && op.allow_curation_rewards {
        return Err(logic("curation rewards cannot be re-enabled"));
    }

    let has_votes = comment.abs_rshares != 0;
    if has_votes
        && (!op.beneficiaries.is_empty()
            || op.curation_percent.is_some()
            || op.auction_window_destination.is_some())
    {
        return Err(logic("cannot change payout routing once votes exist"));
    }
    if !comment.beneficiaries.is_empty() && !op.beneficiaries.is_empty() {
        return Err(logic("beneficiaries are already set"));
    }
    for route in &op.beneficiaries {
        db.ledger().get_account(&route.account)?;
    }

    let id = comment.id;
    let op = op.clone();
    db.ledger_mut().modify_comment(&id, |c| {
        c.max_accepted_payout = op.max_accepted_payout;
        c.percent_debt = op.percent_debt;
        c.allow_votes = op.allow_votes;
        c.allow_curation_rewards = op.allow_curation_rewards;
        if let Some(p) = op.curation_percent {
            c.curation_percent = p;
        }
        if let Some(d) = op.auction_window_destination {
            c.auction_window_destination = d;
        }
        if !op.beneficiaries.is_empty() {
            c.beneficiaries = op.beneficiaries;
        }
    })
}

pub(super) fn delete_content(db: &mut Database, op: &DeleteContentOperation) -> ChainResult<()> {
    let comment = db
        .ledger()
        .get_comment_by_permlink(&op.author, &op.permlink)?;
    if comment.children > 0 {
        return Err(logic("cannot delete content with replies"));
    }
    if comment.net_rshares > 0 {
        return Err(logic("cannot delete content with positive reward shares"));
    }
    if comment.mode != PayoutMode::FirstWindow {
        return Err(logic("cannot delete content past its first payout"));
    }

    let id = comment.id;
    let parent = comment.parent;

    let voters: Vec<_> = db
        .ledger()
        .comment_votes_for(id)
        .map(|v| v.voter.clone())
        .collect();
    for voter in voters {
        db.ledger_mut().remove_comment_vote(&(id, voter))?;
    }

    let mut cursor = parent;
    while let Some(pid) = cursor {
        db.ledger_mut().modify_comment(&pid, |c| c.children -= 1)?;
        cursor = db.ledger().get_comment(&pid)?.parent;
    }

    db.ledger_mut().remove_comment(&id)
}

pub(super) fn vote(db: &mut Database, op: &VoteOperation) -> ChainResult<()> {
    let voter = db.ledger().get_account(&op.voter)?;
    if !voter.can_vote {
        return Err(logic("account has declined its voting rights"));
    }

    let comment = db
        .ledger()
        .get_comment_by_permlink(&op.author, &op.permlink)?;
    if comment.mode == PayoutMode::Archived {
        return Err(logic("cannot vote on archived content"));
    }
    if !comment.allow_votes {
        return Err(logic("content does not accept votes"));
    }
    let comment_id = comment.id;
    let curve = comment.reward_curve;
    let auction_window = comment.auction_window_size;
    let created = comment.created;

    let now = db.head_block_time();

    // regenerate voting power since the last vote, then spend a slice
    // proportional to the vote strength
    let regen_secs = db.config().vote_regeneration_secs;
    let elapsed = now.secs_since(voter.last_vote_time);
    let regenerated = (voter.voting_power as u64
        + elapsed * PERCENT_100 as u64 / regen_secs.max(1))
    .min(PERCENT_100 as u64) as u16;

    let abs_weight = op.weight.unsigned_abs().min(PERCENT_100);
    let used_power = ((regenerated as u64 * abs_weight as u64)
        / PERCENT_100 as u64
        / db.config().vote_power_divisor.max(1) as u64) as u16
        + if abs_weight > 0 { 1 } else { 0 };
    if used_power > regenerated {
        return Err(logic("voting power is exhausted"));
    }

    let effective = voter.effective_vesting_shares().max(0);
    let mut rshares =
        ((effective as i128 * used_power as i128) / PERCENT_100 as i128) as i64;
    if op.weight < 0 {
        rshares = -rshares;
    }

    let vote_key = (comment_id, op.voter.clone());
    let existing = db.ledger().find_comment_vote(&vote_key).cloned();

    db.ledger_mut().modify_account(&op.voter, |a| {
        a.voting_power = regenerated - used_power;
        a.last_vote_time = now;
    })?;

    match existing {
        None => {
            let old_net = db.ledger().get_comment(&comment_id)?.net_rshares;
            let old_vote_rshares = db.ledger().get_comment(&comment_id)?.vote_rshares;

            let old_vshares = evaluate_reward_curve(old_net.max(0) as u128, curve);
            let new_net = old_net + rshares;
            let new_vshares = evaluate_reward_curve(new_net.max(0) as u128, curve);
            db.adjust_reward_shares(old_vshares, new_vshares)?;

            // only positive votes earn curation weight
            let (kept, forfeited, elapsed_in_window, full) = if rshares > 0 {
                let new_vote_rshares = old_vote_rshares + rshares;
                let full = curation_weight_delta(old_vote_rshares, new_vote_rshares, curve);
                let elapsed_in_window =
                    (now.secs_since(created) as u32).min(auction_window);
                let (kept, forfeited) =
                    auction_window_split(full, elapsed_in_window, auction_window);
                (kept, forfeited, elapsed_in_window, full)
            } else {
                (0, 0, (now.secs_since(created) as u32).min(auction_window), 0)
            };

            db.ledger_mut().modify_comment(&comment_id, |c| {
                c.net_rshares = new_net;
                c.abs_rshares += rshares.abs();
                if rshares > 0 {
                    c.vote_rshares += rshares;
                }
                c.net_votes += if rshares >= 0 { 1 } else { -1 };
                c.total_vote_weight += full as u128;
                c.auction_window_weight += forfeited as u128;
                if elapsed_in_window >= auction_window {
                    c.votes_after_auction_window_weight += kept as u128;
                }
            })?;

            db.ledger_mut().create_comment_vote(
                vote_key,
                VoteRecord {
                    comment: comment_id,
                    voter: op.voter.clone(),
                    percent: op.weight,
                    weight: kept,
                    rshares,
                    auction_time: elapsed_in_window,
                    last_update: now,
                    num_changes: 0,
                },
            )
        }
        Some(previous) => {
            if previous.num_changes >= db.config().max_vote_changes {
                return Err(logic("vote has been changed too many times"));
            }
            if previous.percent == op.weight {
                return Err(logic("vote is unchanged"));
            }

            let old_net = db.ledger().get_comment(&comment_id)?.net_rshares;
            let old_vshares = evaluate_reward_curve(old_net.max(0) as u128, curve);
            let new_net = old_net - previous.rshares + rshares;
            let new_vshares = evaluate_reward_curve(new_net.max(0) as u128, curve);
            db.adjust_reward_shares(old_vshares, new_vshares)?;

            // an edited vote forfeits its curation weight
            let was_after_window = previous.auction_time >= auction_window;
            db.ledger_mut().modify_comment(&comment_id, |c| {
                c.net_rshares = new_net;
                c.abs_rshares += rshares.abs();
                if previous.rshares > 0 {
                    c.vote_rshares -= previous.rshares;
                }
                if rshares > 0 {
                    c.vote_rshares += rshares;
                }
                c.net_votes += match (previous.rshares >= 0, rshares >= 0) {
                    (true, false) => -2,
                    (false, true) => 2,
                    _ => 0,
                };
                c.total_vote_weight -= previous.weight as u128;
                if was_after_window {
                    c.votes_after_auction_window_weight -= previous.weight as u128;
                }
            })?;

            db.ledger_mut().modify_comment_vote(&vote_key, |v| {
                v.percent = op.weight;
                v.weight = 0;
                v.rshares = rshares;
                v.last_update = now;
                v.num_changes += 1;
            })
        }
    }
}
