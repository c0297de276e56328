// tokenomics/src/lib.rs

//! Consensus economics, as pure math
//!
//! This crate holds the arithmetic behind the periodic economic processes:
//! - Inflation emission and its content/stake/producer split
//! - Reward-share curves and the 256-bit payout claim
//! - Curation claim apportioning with auction-window handling
//! - Median price-feed computation and the market-cap floor
//! - Vesting-withdrawal and interest math
//!
//! Nothing here touches the ledger; the engine applies these results. That
//! keeps every formula independently testable and every mutation site in
//! one place.

pub mod curve;
pub mod emission;
pub mod feed;
pub mod vesting;

pub use curve::{
    apportion_curation, auction_window_split, curation_weight_delta, evaluate_reward_curve,
    payout_from_vshares, CurationOutcome, VoteWeight, CONTENT_CONSTANT,
};
pub use emission::{current_inflation_rate_bps, debt_interest, emission_split, EmissionParams, EmissionSplit};
pub use feed::{clamp_to_floor, market_cap_floor, median_price};
pub use vesting::{route_share, withdraw_amount_due};
