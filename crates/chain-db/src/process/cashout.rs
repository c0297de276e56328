// chain-db/src/process/cashout.rs

use crate::config::hardforks;
use crate::{ChainResult, Database};
use chain_core::{
    Asset, ContentId, PayoutMode, Timestamp, VirtualOperation,
};
use tokenomics::{apportion_curation, evaluate_reward_curve, payout_from_vshares, VoteWeight};

impl Database {
    /// Settle every content item whose deadline has elapsed. A block where
    /// nothing is ready is a no-op.
    pub(crate) fn process_comment_cashout(&mut self) -> ChainResult<()> {
        let now = self.head_block_time();

        let mut ready: Vec<(Timestamp, ContentId)> = self
            .ledger
            .comments()
            .filter(|c| c.mode != PayoutMode::Archived && c.next_payout_time() <= now)
            .map(|c| (c.next_payout_time(), c.id))
            .collect();
        ready.sort_unstable();

        for (_, id) in ready {
            self.cashout_comment(id)?;
        }
        Ok(())
    }

    fn cashout_comment(&mut self, id: ContentId) -> ChainResult<()> {
        let comment = self.ledger.get_comment(&id)?.clone();
        let now = self.head_block_time();

        if comment.net_rshares > 0 {
            let vshares =
                evaluate_reward_curve(comment.net_rshares as u128, comment.reward_curve);
            let globals = self.ledger.globals()?;

            // the item's share of the pool; overflow of the payout type is
            // a fatal consistency error, not a clamp
            let mut payout = payout_from_vshares(
                globals.total_reward_fund.amount,
                vshares,
                globals.total_reward_shares,
                comment.reward_weight,
            )? as i64;

            // explicit clamps: the dust threshold and the author's cap
            if self.to_debt(Asset::agr(payout))? < self.config.min_payout {
                payout = 0;
            }
            let payout_in_debt = self.to_debt(Asset::agr(payout))?;
            if payout_in_debt > comment.max_accepted_payout {
                payout = self.to_coin(comment.max_accepted_payout)?.amount;
            }

            self.ledger
                .modify_globals(|g| g.total_reward_fund.amount -= payout)?;

            if payout > 0 {
                let curation_tokens = Asset::agr(payout).percent(comment.curation_percent);
                let mut author_tokens = payout - curation_tokens.amount;

                let votes: Vec<VoteWeight> = self
                    .ledger
                    .comment_votes_for(id)
                    .filter(|v| v.weight > 0)
                    .map(|v| VoteWeight {
                        voter: v.voter.clone(),
                        weight: v.weight,
                        after_window: v.auction_time >= comment.auction_window_size,
                    })
                    .collect();

                let outcome = apportion_curation(
                    curation_tokens.amount,
                    comment.total_vote_weight,
                    comment.auction_window_weight,
                    comment.votes_after_auction_window_weight,
                    comment.auction_window_destination,
                    comment.allow_curation_rewards,
                    &votes,
                );

                author_tokens += outcome.back_to_author;
                if outcome.to_reward_fund > 0 {
                    let returned = outcome.to_reward_fund;
                    self.ledger
                        .modify_globals(|g| g.total_reward_fund.amount += returned)?;
                    self.push_virtual_operation(VirtualOperation::AuctionWindowReward {
                        reward: Asset::agr(returned),
                        author: comment.author.clone(),
                        permlink: comment.permlink.clone(),
                    });
                }

                let mut total_curator = 0i64;
                for (curator, claim) in &outcome.claims {
                    let claim = *claim as i64;
                    if claim == 0 {
                        continue;
                    }
                    let reward = self.create_vesting(curator, Asset::agr(claim))?;
                    self.ledger
                        .modify_account(curator, |a| a.curation_rewards += claim)?;
                    self.push_virtual_operation(VirtualOperation::CurationReward {
                        curator: curator.clone(),
                        reward,
                        author: comment.author.clone(),
                        permlink: comment.permlink.clone(),
                    });
                    total_curator += claim;
                }
                // nothing minted or destroyed by the split
                debug_assert_eq!(
                    total_curator + author_tokens + outcome.to_reward_fund,
                    payout
                );

                // beneficiary routes come out of the author's side
                let mut total_beneficiary = 0i64;
                for route in &comment.beneficiaries {
                    let share = Asset::agr(author_tokens).percent(route.weight);
                    if share.amount == 0 {
                        continue;
                    }
                    let reward = self.create_vesting(&route.account, share)?;
                    self.push_virtual_operation(VirtualOperation::CommentBenefactorReward {
                        benefactor: route.account.clone(),
                        author: comment.author.clone(),
                        permlink: comment.permlink.clone(),
                        reward,
                    });
                    total_beneficiary += share.amount;
                }
                author_tokens -= total_beneficiary;

                // the author side splits between debt asset and stake
                let debt_side = (author_tokens as i128 * comment.percent_debt as i128
                    / (2 * chain_core::PERCENT_100 as i128)) as i64;
                let vesting_side = author_tokens - debt_side;

                let vest_created =
                    self.create_vesting(&comment.author, Asset::agr(vesting_side))?;
                let (debt_paid, coin_paid) =
                    self.create_debt(&comment.author, Asset::agr(debt_side))?;

                self.ledger
                    .modify_account(&comment.author, |a| a.posting_rewards += author_tokens)?;

                self.push_virtual_operation(VirtualOperation::AuthorReward {
                    author: comment.author.clone(),
                    permlink: comment.permlink.clone(),
                    debt_payout: debt_paid,
                    coin_payout: coin_paid,
                    vesting_payout: vest_created,
                });
                self.push_virtual_operation(VirtualOperation::CommentReward {
                    author: comment.author.clone(),
                    permlink: comment.permlink.clone(),
                    payout: self.to_debt(Asset::agr(payout))?,
                });
            }

            self.adjust_reward_shares(vshares, 0)?;
        }

        // advance the payout lifecycle; negative reward shares hang around
        // for the next window
        let single_window = self.has_hardfork(hardforks::LINEAR_CURVE);
        let second_window = self.config.second_cashout_window_secs;
        let archived = single_window || comment.last_payout != Timestamp::ZERO;

        self.ledger.modify_comment(&id, |c| {
            if c.net_rshares > 0 {
                c.net_rshares = 0;
            }
            c.abs_rshares = 0;
            c.vote_rshares = 0;
            c.total_vote_weight = 0;
            c.auction_window_weight = 0;
            c.votes_after_auction_window_weight = 0;

            if archived {
                c.cashout_time = Timestamp::MAX;
                c.max_cashout_time = Timestamp::MAX;
                c.mode = PayoutMode::Archived;
            } else {
                c.cashout_time = now.saturating_add(second_window);
                c.max_cashout_time = Timestamp::MAX;
                c.mode = PayoutMode::SecondWindow;
            }
            c.last_payout = now;
        })?;

        self.push_virtual_operation(VirtualOperation::CommentPayoutUpdate {
            author: comment.author.clone(),
            permlink: comment.permlink.clone(),
        });

        // archived content drops its vote records in one sweep
        if archived {
            let voters: Vec<_> = self
                .ledger
                .comment_votes_for(id)
                .map(|v| v.voter.clone())
                .collect();
            for voter in voters {
                self.ledger.remove_comment_vote(&(id, voter))?;
            }
        }
        Ok(())
    }
}
