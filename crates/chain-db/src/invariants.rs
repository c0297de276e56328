// chain-db/src/invariants.rs

//! Full-ledger consistency check.
//!
//! Walks every account and economic object and proves the conservation
//! identities: per-asset supply, vesting totals, witness vote bounds,
//! proxied-vote bookkeeping and the reward-share total. A violation is a
//! fatal consistency error; this runs after any block when not skipped.

use crate::{ChainError, ChainResult, Database};
use chain_core::{Symbol, MAX_PROXY_RECURSION_DEPTH};
use tokenomics::evaluate_reward_curve;

impl Database {
    pub fn validate_invariants(&self) -> ChainResult<()> {
        let globals = self.ledger.globals()?;

        let mut total_coin = 0i64;
        let mut total_debt = 0i64;
        let mut total_vesting = 0i64;
        let mut total_vsf_votes = 0i64;

        for account in self.ledger.accounts() {
            if account.balance.is_negative()
                || account.debt_balance.is_negative()
                || account.savings_balance.is_negative()
                || account.savings_debt_balance.is_negative()
                || account.vesting_shares.is_negative()
            {
                return Err(ChainError::Consistency(format!(
                    "account {} holds a negative balance",
                    account.name
                )));
            }

            total_coin += account.balance.amount + account.savings_balance.amount;
            total_debt += account.debt_balance.amount + account.savings_debt_balance.amount;
            total_vesting += account.vesting_shares.amount;

            // an account voting through a proxy shows up in the proxy's
            // buckets instead of its own weight
            total_vsf_votes += if account.proxy.is_none() {
                account.witness_vote_weight()
            } else {
                account.proxied_vsf_votes[MAX_PROXY_RECURSION_DEPTH - 1]
            };

            if account.withdrawn > account.to_withdraw {
                return Err(ChainError::Consistency(format!(
                    "account {} withdrew more stake than requested",
                    account.name
                )));
            }
        }

        for witness in self.ledger.witnesses() {
            if witness.votes > globals.total_vesting_shares.amount {
                return Err(ChainError::Consistency(format!(
                    "witness {} carries more votes than total stake",
                    witness.owner
                )));
            }
        }

        for request in self.ledger.convert_requests() {
            match request.amount.symbol {
                Symbol::Agr => total_coin += request.amount.amount,
                Symbol::Agd => total_debt += request.amount.amount,
                Symbol::Vests => {
                    return Err(ChainError::Consistency(
                        "conversion request in stake".into(),
                    ))
                }
            }
        }

        for order in self.ledger.limit_orders() {
            match order.sell_price.base.symbol {
                Symbol::Agr => total_coin += order.for_sale,
                Symbol::Agd => total_debt += order.for_sale,
                Symbol::Vests => {
                    return Err(ChainError::Consistency("order book holds stake".into()))
                }
            }
        }

        for escrow in self.ledger.escrows() {
            total_coin += escrow.coin_balance.amount;
            total_debt += escrow.debt_balance.amount;
            match escrow.pending_fee.symbol {
                Symbol::Agr => total_coin += escrow.pending_fee.amount,
                Symbol::Agd => total_debt += escrow.pending_fee.amount,
                Symbol::Vests => {
                    return Err(ChainError::Consistency("escrow fee in stake".into()))
                }
            }
        }

        for withdraw in self.ledger.savings_withdraws() {
            match withdraw.amount.symbol {
                Symbol::Agr => total_coin += withdraw.amount.amount,
                Symbol::Agd => total_debt += withdraw.amount.amount,
                Symbol::Vests => {
                    return Err(ChainError::Consistency(
                        "savings withdrawal in stake".into(),
                    ))
                }
            }
        }

        let mut total_reward_shares = 0u128;
        for comment in self.ledger.comments() {
            if comment.net_rshares > 0 {
                total_reward_shares +=
                    evaluate_reward_curve(comment.net_rshares as u128, comment.reward_curve);
            }
        }

        total_coin += globals.total_vesting_fund.amount + globals.total_reward_fund.amount;

        if globals.current_supply.amount != total_coin {
            return Err(ChainError::Consistency(format!(
                "core supply drift: recorded {}, summed {}",
                globals.current_supply.amount, total_coin
            )));
        }
        if globals.current_debt_supply.amount != total_debt {
            return Err(ChainError::Consistency(format!(
                "debt supply drift: recorded {}, summed {}",
                globals.current_debt_supply.amount, total_debt
            )));
        }
        if globals.total_vesting_shares.amount != total_vesting {
            return Err(ChainError::Consistency(format!(
                "stake drift: recorded {}, summed {}",
                globals.total_vesting_shares.amount, total_vesting
            )));
        }
        if globals.total_vesting_shares.amount != total_vsf_votes {
            return Err(ChainError::Consistency(format!(
                "proxied vote drift: stake {}, counted votes {}",
                globals.total_vesting_shares.amount, total_vsf_votes
            )));
        }
        if globals.total_reward_shares != total_reward_shares {
            return Err(ChainError::Consistency(format!(
                "reward share drift: recorded {}, summed {}",
                globals.total_reward_shares, total_reward_shares
            )));
        }

        if globals.virtual_supply < globals.current_supply {
            return Err(ChainError::Consistency(
                "virtual supply below core supply".into(),
            ));
        }
        if let Some(median) = self.ledger.feed_history()?.current_median {
            let debt_in_core = globals.current_debt_supply.convert(&median)?;
            let expected = globals.current_supply.amount + debt_in_core.amount;
            if globals.virtual_supply.amount != expected {
                return Err(ChainError::Consistency(format!(
                    "virtual supply drift: recorded {}, expected {}",
                    globals.virtual_supply.amount, expected
                )));
            }
        }
        Ok(())
    }
}
