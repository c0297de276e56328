// chain-core/src/objects/content.rs

use crate::{AccountName, Asset, ContentId, Timestamp};
use serde::{Deserialize, Serialize};

/// Payout lifecycle of a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutMode {
    /// Accumulating votes toward the first settlement window
    FirstWindow,
    /// First settlement done; accumulating toward the second window
    SecondWindow,
    /// Settled for good; votes are purged and further payout is impossible
    Archived,
}

/// Reward-share transform used to apportion the content-reward pool.
///
/// The curve is chosen when the item is created and persists through its
/// whole lifecycle; a later rule change only affects new items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardCurve {
    Linear,
    Quadratic,
}

/// Where the auction-window discount on early votes is routed at cashout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionWindowDestination {
    /// Returned to the content-reward pool
    RewardFund,
    /// Shared among the votes cast after the window closed
    Curators,
    /// Kept by the author
    Author,
}

/// Fixed-point share of author proceeds routed to another account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryRoute {
    pub account: AccountName,
    pub weight: u16,
}

/// A post or reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: ContentId,
    pub author: AccountName,
    pub permlink: String,

    /// `None` for root posts
    pub parent: Option<ContentId>,
    /// Root post of the thread (self for root posts)
    pub root: ContentId,
    pub depth: u16,
    pub children: u32,

    pub created: Timestamp,
    pub last_update: Timestamp,
    /// Zero until the first settlement
    pub last_payout: Timestamp,

    pub cashout_time: Timestamp,
    pub max_cashout_time: Timestamp,
    pub mode: PayoutMode,

    /// Net signed reward shares accumulated from votes
    pub net_rshares: i64,
    /// Sum of absolute vote rshares (edit/downvote bookkeeping)
    pub abs_rshares: i64,
    /// Sum of positive vote rshares, basis of curation weight ordering
    pub vote_rshares: i64,
    pub net_votes: i32,

    /// Total curation weight of all votes
    pub total_vote_weight: u128,
    /// Portion of the weight forfeited by votes inside the auction window
    pub auction_window_weight: u128,
    /// Total weight of votes cast after the auction window closed
    pub votes_after_auction_window_weight: u128,

    /// Penalty factor (basis points) applied to this item's payout
    pub reward_weight: u16,

    pub reward_curve: RewardCurve,
    pub curation_percent: u16,
    pub auction_window_size: u32,
    pub auction_window_destination: AuctionWindowDestination,

    pub max_accepted_payout: Asset,
    /// Fraction of the author side paid as debt asset (the rest vests)
    pub percent_debt: u16,
    pub allow_replies: bool,
    pub allow_votes: bool,
    pub allow_curation_rewards: bool,
    pub beneficiaries: Vec<BeneficiaryRoute>,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The deadline that governs the next settlement, or `Timestamp::MAX`
    /// if the item will never settle again
    pub fn next_payout_time(&self) -> Timestamp {
        self.cashout_time.min(self.max_cashout_time)
    }
}

/// One account's vote on one content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub comment: ContentId,
    pub voter: AccountName,
    /// Signed vote strength in basis points as cast
    pub percent: i16,
    /// Curation weight earned by this vote
    pub weight: u64,
    /// Signed reward-share delta contributed to the item
    pub rshares: i64,
    /// Seconds into the item's life the vote landed, capped at the
    /// auction window size
    pub auction_time: u32,
    pub last_update: Timestamp,
    /// Edit counter; negative values mark votes on archived content,
    /// ready for purge
    pub num_changes: i8,
}

impl VoteRecord {
    pub fn marked_for_removal(&self) -> bool {
        self.num_changes < 0
    }

    /// Flip the edit counter to its archived encoding
    pub fn mark_for_removal(&mut self) {
        self.num_changes = -1 - self.num_changes;
    }
}
