// chain-core/src/objects/account.rs

use crate::{AccountName, Asset, Authority, Symbol, Timestamp};
use serde::{Deserialize, Serialize};

/// Maximum depth of proxy-vote propagation
pub const MAX_PROXY_RECURSION_DEPTH: usize = 4;

/// An account and everything hanging off it.
///
/// Balances are never negative; the evaluators enforce this before any
/// mutation becomes visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub name: AccountName,

    pub owner: Authority,
    pub active: Authority,
    pub posting: Authority,

    pub created: Timestamp,

    /// Liquid core-asset balance
    pub balance: Asset,
    /// Liquid debt-asset balance
    pub debt_balance: Asset,
    pub savings_balance: Asset,
    pub savings_debt_balance: Asset,
    pub savings_withdraw_requests: u16,

    /// Seconds-weighted debt balance, basis of interest accrual
    pub debt_seconds: u128,
    pub debt_seconds_last_update: Timestamp,
    pub debt_last_interest_payment: Timestamp,
    pub savings_debt_seconds: u128,
    pub savings_debt_seconds_last_update: Timestamp,
    pub savings_debt_last_interest_payment: Timestamp,

    /// Stake
    pub vesting_shares: Asset,
    pub delegated_vesting_shares: Asset,
    pub received_vesting_shares: Asset,

    /// Withdrawal schedule: `vesting_withdraw_rate` released every interval
    /// until `withdrawn` reaches `to_withdraw`
    pub vesting_withdraw_rate: Asset,
    pub next_vesting_withdrawal: Timestamp,
    pub withdrawn: i64,
    pub to_withdraw: i64,

    /// Voting proxy; `None` means the account votes with its own stake
    pub proxy: Option<AccountName>,
    /// Stake proxied to this account, bucketed by proxy-chain distance
    pub proxied_vsf_votes: [i64; MAX_PROXY_RECURSION_DEPTH],
    pub witnesses_voted_for: u16,
    pub can_vote: bool,

    /// Content-vote power in basis points, regenerating over time
    pub voting_power: u16,
    pub last_vote_time: Timestamp,
    pub last_root_post: Timestamp,
    pub post_count: u32,

    /// Lifetime reward tallies (display bookkeeping, not spendable)
    pub posting_rewards: i64,
    pub curation_rewards: i64,
}

impl Account {
    pub fn new(name: AccountName, owner: Authority, created: Timestamp) -> Self {
        Self {
            name,
            active: owner.clone(),
            posting: owner.clone(),
            owner,
            created,
            balance: Asset::zero(Symbol::Agr),
            debt_balance: Asset::zero(Symbol::Agd),
            savings_balance: Asset::zero(Symbol::Agr),
            savings_debt_balance: Asset::zero(Symbol::Agd),
            savings_withdraw_requests: 0,
            debt_seconds: 0,
            debt_seconds_last_update: Timestamp::ZERO,
            debt_last_interest_payment: Timestamp::ZERO,
            savings_debt_seconds: 0,
            savings_debt_seconds_last_update: Timestamp::ZERO,
            savings_debt_last_interest_payment: Timestamp::ZERO,
            vesting_shares: Asset::zero(Symbol::Vests),
            delegated_vesting_shares: Asset::zero(Symbol::Vests),
            received_vesting_shares: Asset::zero(Symbol::Vests),
            vesting_withdraw_rate: Asset::zero(Symbol::Vests),
            next_vesting_withdrawal: Timestamp::MAX,
            withdrawn: 0,
            to_withdraw: 0,
            proxy: None,
            proxied_vsf_votes: [0; MAX_PROXY_RECURSION_DEPTH],
            witnesses_voted_for: 0,
            can_vote: true,
            voting_power: crate::PERCENT_100,
            last_vote_time: Timestamp::ZERO,
            last_root_post: Timestamp::ZERO,
            post_count: 0,
            posting_rewards: 0,
            curation_rewards: 0,
        }
    }

    /// Stake usable for bandwidth and content votes: own, minus delegated
    /// away, plus received
    pub fn effective_vesting_shares(&self) -> i64 {
        self.vesting_shares.amount - self.delegated_vesting_shares.amount
            + self.received_vesting_shares.amount
    }

    /// Weight this account contributes to witness votes: own stake plus all
    /// stake proxied to it
    pub fn witness_vote_weight(&self) -> i64 {
        self.vesting_shares.amount + self.proxied_vsf_votes.iter().sum::<i64>()
    }

    pub fn proxied_vsf_votes_total(&self) -> i64 {
        self.proxied_vsf_votes.iter().sum()
    }
}

/// Standing instruction to route a fraction of vesting withdrawals to
/// another account, as stake or as liquid asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawVestingRoute {
    pub from_account: AccountName,
    pub to_account: AccountName,
    pub percent: u16,
    pub auto_vest: bool,
}

/// Pending request to irreversibly give up governance votes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclineVotingRightsRequest {
    pub account: AccountName,
    pub effective_date: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account::new(
            AccountName::from("alice"),
            Authority::impossible(),
            Timestamp::ZERO,
        )
    }

    #[test]
    fn test_new_account_defaults() {
        let a = account();
        assert!(a.balance.is_zero());
        assert_eq!(a.voting_power, crate::PERCENT_100);
        assert_eq!(a.next_vesting_withdrawal, Timestamp::MAX);
        assert!(a.can_vote);
    }

    #[test]
    fn test_effective_vesting_shares() {
        let mut a = account();
        a.vesting_shares = Asset::vests(1000);
        a.delegated_vesting_shares = Asset::vests(300);
        a.received_vesting_shares = Asset::vests(50);
        assert_eq!(a.effective_vesting_shares(), 750);
    }

    #[test]
    fn test_witness_vote_weight_includes_proxied() {
        let mut a = account();
        a.vesting_shares = Asset::vests(1000);
        a.proxied_vsf_votes[0] = 200;
        a.proxied_vsf_votes[2] = 100;
        assert_eq!(a.witness_vote_weight(), 1300);
    }
}
