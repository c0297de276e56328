// chain-core/src/objects/market.rs

use crate::{AccountName, Asset, ChainResult, Price, Timestamp};
use serde::{Deserialize, Serialize};

/// An open order on the internal market, keyed by a global object id.
///
/// Orders match by price-time priority: best price first, then lowest id
/// (creation order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOrder {
    pub id: u64,
    pub created: Timestamp,
    pub expiration: Timestamp,
    pub seller: AccountName,
    /// Seller-scoped order number, unique per open order of that account
    pub orderid: u32,
    pub for_sale: i64,
    pub sell_price: Price,
}

impl LimitOrder {
    pub fn amount_for_sale(&self) -> Asset {
        Asset::new(self.for_sale, self.sell_price.base.symbol)
    }

    pub fn amount_to_receive(&self) -> ChainResult<Asset> {
        self.amount_for_sale().convert(&self.sell_price)
    }
}

/// A pending debt-to-core conversion maturing at `conversion_date`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub owner: AccountName,
    pub requestid: u32,
    pub amount: Asset,
    pub conversion_date: Timestamp,
}

/// Funds parked with an agent until released or disputed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escrow {
    pub escrow_id: u32,
    pub from: AccountName,
    pub to: AccountName,
    pub agent: AccountName,
    /// Unapproved escrows are returned after this deadline
    pub ratification_deadline: Timestamp,
    pub escrow_expiration: Timestamp,
    pub debt_balance: Asset,
    pub coin_balance: Asset,
    pub pending_fee: Asset,
    pub to_approved: bool,
    pub agent_approved: bool,
    pub disputed: bool,
}

impl Escrow {
    pub fn is_approved(&self) -> bool {
        self.to_approved && self.agent_approved
    }
}

/// A savings withdrawal in its three-day cooling window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsWithdraw {
    pub from: AccountName,
    pub to: AccountName,
    pub memo: String,
    pub request_id: u32,
    pub amount: Asset,
    pub complete: Timestamp,
}

/// Stake lent from one account to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingDelegation {
    pub delegator: AccountName,
    pub delegatee: AccountName,
    pub vesting_shares: Asset,
    pub min_delegation_time: Timestamp,
}

/// Returned delegation still locked until `expiration`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingDelegationExpiration {
    pub id: u64,
    pub delegator: AccountName,
    pub vesting_shares: Asset,
    pub expiration: Timestamp,
}

/// Rolling market-making volume eligible for the liquidity reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityRewardBalance {
    pub owner: AccountName,
    pub coin_volume: i64,
    pub debt_volume: i64,
    pub weight: u128,
    pub last_update: Timestamp,
}

impl LiquidityRewardBalance {
    /// Weight rewards balanced two-sided volume; one-sided volume earns
    /// nothing.
    pub fn update_weight(&mut self) {
        let c = self.coin_volume.max(0) as u128;
        let d = self.debt_volume.max(0) as u128;
        self.weight = c.min(d).pow(2);
    }

    pub fn volume_weight(&self) -> u128 {
        self.weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_receive_amount() {
        let order = LimitOrder {
            id: 1,
            created: Timestamp::ZERO,
            expiration: Timestamp::MAX,
            seller: AccountName::from("alice"),
            orderid: 7,
            for_sale: 1000,
            sell_price: Price::new(Asset::agr(1000), Asset::agd(500)).unwrap(),
        };
        assert_eq!(order.amount_for_sale(), Asset::agr(1000));
        assert_eq!(order.amount_to_receive().unwrap(), Asset::agd(500));
    }

    #[test]
    fn test_escrow_approval() {
        let mut e = Escrow {
            escrow_id: 1,
            from: AccountName::from("alice"),
            to: AccountName::from("bob"),
            agent: AccountName::from("carol"),
            ratification_deadline: Timestamp::MAX,
            escrow_expiration: Timestamp::MAX,
            debt_balance: Asset::agd(0),
            coin_balance: Asset::agr(100),
            pending_fee: Asset::agr(1),
            to_approved: true,
            agent_approved: false,
            disputed: false,
        };
        assert!(!e.is_approved());
        e.agent_approved = true;
        assert!(e.is_approved());
    }

    #[test]
    fn test_liquidity_weight_needs_both_sides() {
        let mut lrb = LiquidityRewardBalance {
            owner: AccountName::from("mm"),
            coin_volume: 1000,
            debt_volume: 0,
            weight: 0,
            last_update: Timestamp::ZERO,
        };
        lrb.update_weight();
        assert_eq!(lrb.volume_weight(), 0);

        lrb.debt_volume = 500;
        lrb.update_weight();
        assert!(lrb.volume_weight() > 0);
    }
}
