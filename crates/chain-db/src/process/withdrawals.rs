// chain-db/src/process/withdrawals.rs

use crate::{ChainResult, Database};
use chain_core::{AccountName, Asset, Timestamp, VirtualOperation};
use tokenomics::{route_share, withdraw_amount_due};

impl Database {
    /// Release one step of every matured stake-withdrawal schedule,
    /// honoring the account's withdraw routes.
    pub(crate) fn process_vesting_withdrawals(&mut self) -> ChainResult<()> {
        let now = self.head_block_time();

        let mut ready: Vec<(Timestamp, AccountName)> = self
            .ledger
            .accounts()
            .filter(|a| a.next_vesting_withdrawal <= now)
            .map(|a| (a.next_vesting_withdrawal, a.name.clone()))
            .collect();
        ready.sort_unstable();

        for (_, name) in ready {
            self.withdraw_vesting_step(&name)?;
        }
        Ok(())
    }

    fn withdraw_vesting_step(&mut self, name: &AccountName) -> ChainResult<()> {
        let account = self.ledger.get_account(name)?.clone();
        let now = self.head_block_time();
        let price = self.ledger.globals()?.vesting_share_price();

        let to_withdraw = withdraw_amount_due(
            account.vesting_shares.amount,
            account.vesting_withdraw_rate.amount,
            account.withdrawn,
            account.to_withdraw,
        );

        let routes = self.ledger.withdraw_routes_from(name);
        let mut deposited_as_vests = 0i64;
        let mut deposited_as_coin = 0i64;

        // Two passes: stake-retaining routes first so their share is taken
        // at full precision, then the liquid routes.
        for route in routes.iter().filter(|r| r.auto_vest) {
            let share = route_share(to_withdraw, route.percent);
            if share == 0 {
                continue;
            }
            deposited_as_vests += share;

            self.ledger.modify_account(&route.to_account, |a| {
                a.vesting_shares.amount += share;
            })?;
            self.adjust_proxied_witness_votes(&route.to_account, share)?;
            self.push_virtual_operation(VirtualOperation::FillVestingWithdraw {
                from_account: name.clone(),
                to_account: route.to_account.clone(),
                withdrawn: Asset::vests(share),
                deposited: Asset::vests(share),
            });
        }

        for route in routes.iter().filter(|r| !r.auto_vest) {
            let share = route_share(to_withdraw, route.percent);
            if share == 0 {
                continue;
            }
            deposited_as_coin += share;
            let converted = Asset::vests(share).convert(&price)?;

            self.ledger.modify_account(&route.to_account, |a| {
                a.balance.amount += converted.amount;
            })?;
            self.ledger.modify_globals(|g| {
                g.total_vesting_fund.amount -= converted.amount;
                g.total_vesting_shares.amount -= share;
            })?;
            self.push_virtual_operation(VirtualOperation::FillVestingWithdraw {
                from_account: name.clone(),
                to_account: route.to_account.clone(),
                withdrawn: Asset::vests(share),
                deposited: converted,
            });
        }

        let to_convert = (to_withdraw - deposited_as_vests - deposited_as_coin).max(0);
        let converted = Asset::vests(to_convert).convert(&price)?;

        let interval = self.config.vesting_withdraw_interval_secs;
        self.ledger.modify_account(name, |a| {
            a.vesting_shares.amount -= to_withdraw;
            a.balance.amount += converted.amount;
            a.withdrawn += to_withdraw;

            if a.withdrawn >= a.to_withdraw || a.vesting_shares.amount == 0 {
                a.vesting_withdraw_rate.amount = 0;
                a.next_vesting_withdrawal = Timestamp::MAX;
                a.withdrawn = 0;
                a.to_withdraw = 0;
            } else {
                a.next_vesting_withdrawal = a.next_vesting_withdrawal.saturating_add(interval);
            }
        })?;
        self.ledger.modify_globals(|g| {
            g.total_vesting_fund.amount -= converted.amount;
            g.total_vesting_shares.amount -= to_convert;
        })?;

        if to_withdraw > 0 {
            self.adjust_proxied_witness_votes(name, -to_withdraw)?;
            self.push_virtual_operation(VirtualOperation::FillVestingWithdraw {
                from_account: name.clone(),
                to_account: name.clone(),
                withdrawn: Asset::vests(to_withdraw),
                deposited: converted,
            });
        }
        Ok(())
    }

    /// Pay out savings withdrawals whose cooling window has elapsed
    pub(crate) fn process_savings_withdraws(&mut self) -> ChainResult<()> {
        let now = self.head_block_time();

        let mut ready: Vec<(Timestamp, AccountName, u32)> = self
            .ledger
            .savings_withdraws()
            .filter(|w| w.complete <= now)
            .map(|w| (w.complete, w.from.clone(), w.request_id))
            .collect();
        ready.sort_unstable();

        for (_, from, request_id) in ready {
            let key = (from.clone(), request_id);
            let withdraw = self.ledger.get_savings_withdraw(&key)?.clone();

            self.adjust_balance(&withdraw.to, withdraw.amount)?;
            self.ledger
                .modify_account(&withdraw.from, |a| a.savings_withdraw_requests -= 1)?;
            self.ledger.remove_savings_withdraw(&key)?;

            self.push_virtual_operation(VirtualOperation::FillTransferFromSavings {
                from: withdraw.from,
                to: withdraw.to,
                amount: withdraw.amount,
                request_id,
                memo: withdraw.memo,
            });
        }
        Ok(())
    }
}
