// chain-core/src/objects/bandwidth.rs

use crate::{AccountName, Timestamp};
use serde::{Deserialize, Serialize};

/// Traffic class a transaction is charged under
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum BandwidthType {
    /// Posts, votes, transfers — the default class
    Forum,
    /// Market operations, charged at a size multiple
    Market,
    /// Custom-data operations, charged at a configured multiple
    Custom,
}

/// Decaying-average bandwidth consumption of one account in one class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBandwidth {
    pub account: AccountName,
    pub bandwidth_type: BandwidthType,
    /// Exponentially decayed running average, in size units scaled by the
    /// bandwidth precision
    pub average_bandwidth: u128,
    pub lifetime_bandwidth: u128,
    pub last_bandwidth_update: Timestamp,
}

impl AccountBandwidth {
    pub fn new(account: AccountName, bandwidth_type: BandwidthType) -> Self {
        Self {
            account,
            bandwidth_type,
            average_bandwidth: 0,
            lifetime_bandwidth: 0,
            last_bandwidth_update: Timestamp::ZERO,
        }
    }
}
