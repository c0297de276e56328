// chain-core/src/objects/mod.rs

//! Ledger-resident object model

pub mod account;
pub mod bandwidth;
pub mod content;
pub mod global;
pub mod market;
pub mod witness;

pub use account::{
    Account, DeclineVotingRightsRequest, WithdrawVestingRoute, MAX_PROXY_RECURSION_DEPTH,
};
pub use bandwidth::{AccountBandwidth, BandwidthType};
pub use content::{
    AuctionWindowDestination, BeneficiaryRoute, Comment, PayoutMode, RewardCurve, VoteRecord,
};
pub use global::{
    DynamicGlobalProperties, FeedHistory, HardforkProperties, ProducerSchedule, TransactionObject,
};
pub use market::{
    ConvertRequest, Escrow, LimitOrder, LiquidityRewardBalance, SavingsWithdraw,
    VestingDelegation, VestingDelegationExpiration,
};
pub use witness::{ChainProperties, ScheduleClass, Witness};
