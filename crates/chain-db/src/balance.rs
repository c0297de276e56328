// chain-db/src/balance.rs

//! Balance, supply and vote-weight adjustment helpers.
//!
//! Every balance mutation in the engine funnels through these, so the
//! supply bookkeeping and the interest accrual on debt balances cannot be
//! bypassed.

use crate::{Database, ChainError, ChainResult};
use chain_core::{
    AccountName, Asset, Symbol, VirtualOperation, MAX_PROXY_RECURSION_DEPTH,
};
use tokenomics::debt_interest;

impl Database {
    /// Credit or debit a liquid balance. Debt-asset movements first accrue
    /// the seconds-weighted interest owed on the old balance.
    pub(crate) fn adjust_balance(&mut self, name: &AccountName, delta: Asset) -> ChainResult<()> {
        match delta.symbol {
            Symbol::Agr => {
                let balance = self.ledger.get_account(name)?.balance;
                let new_balance = balance.checked_add(delta)?;
                if new_balance.is_negative() {
                    return Err(ChainError::InsufficientBalance(format!(
                        "{} holds {} but needs {}",
                        name,
                        balance,
                        delta.negate()
                    )));
                }
                self.ledger.modify_account(name, |a| a.balance = new_balance)
            }
            Symbol::Agd => self.adjust_debt_balance(name, delta),
            Symbol::Vests => Err(ChainError::Consistency(
                "stake is not a liquid balance".into(),
            )),
        }
    }

    fn adjust_debt_balance(&mut self, name: &AccountName, delta: Asset) -> ChainResult<()> {
        let now = self.head_block_time();
        let globals = self.ledger.globals()?;
        let interest_rate = globals.debt_interest_rate;
        // interest stops while the market-cap floor is forcing the price
        let interest_enabled = !globals.is_forced_min_price;
        let compound_interval = self.config.interest_compound_interval_secs;
        let seconds_per_year = self.config.seconds_per_year;

        let account = self.ledger.get_account(name)?;
        let mut debt_seconds = account.debt_seconds;
        let mut interest_paid = Asset::zero(Symbol::Agd);

        if account.debt_seconds_last_update != now {
            debt_seconds += account.debt_balance.amount.max(0) as u128
                * now.secs_since(account.debt_seconds_last_update) as u128;

            if interest_enabled
                && debt_seconds > 0
                && now.secs_since(account.debt_last_interest_payment) > compound_interval
            {
                interest_paid = Asset::agd(debt_interest(
                    debt_seconds,
                    interest_rate,
                    seconds_per_year,
                ));
                debt_seconds = 0;
            }
        }

        let new_balance = self
            .ledger
            .get_account(name)?
            .debt_balance
            .checked_add(delta)?
            .checked_add(interest_paid)?;
        if new_balance.is_negative() {
            return Err(ChainError::InsufficientBalance(format!(
                "{} lacks debt-asset funds for {}",
                name, delta
            )));
        }

        self.ledger.modify_account(name, |a| {
            a.debt_balance = new_balance;
            a.debt_seconds = debt_seconds;
            a.debt_seconds_last_update = now;
            if !interest_paid.is_zero() {
                a.debt_last_interest_payment = now;
            }
        })?;

        if !interest_paid.is_zero() {
            let median = self.ledger.feed_history()?.current_median;
            self.ledger.modify_globals(|g| {
                g.current_debt_supply.amount += interest_paid.amount;
                // keep the virtual-supply identity exact under the median
                if let Some(median) = median {
                    if let Ok(debt_in_core) = g.current_debt_supply.convert(&median) {
                        g.virtual_supply.amount =
                            g.current_supply.amount + debt_in_core.amount;
                    }
                }
            })?;
            self.push_virtual_operation(VirtualOperation::Interest {
                owner: name.clone(),
                interest: interest_paid,
            });
        }
        Ok(())
    }

    /// Savings balances accrue the same debt interest as liquid ones
    pub(crate) fn adjust_savings_balance(
        &mut self,
        name: &AccountName,
        delta: Asset,
    ) -> ChainResult<()> {
        match delta.symbol {
            Symbol::Agr => {
                let balance = self.ledger.get_account(name)?.savings_balance;
                let new_balance = balance.checked_add(delta)?;
                if new_balance.is_negative() {
                    return Err(ChainError::InsufficientBalance(format!(
                        "{} lacks savings for {}",
                        name, delta
                    )));
                }
                self.ledger
                    .modify_account(name, |a| a.savings_balance = new_balance)
            }
            Symbol::Agd => {
                let now = self.head_block_time();
                let interest_rate = self.ledger.globals()?.debt_interest_rate;
                let compound_interval = self.config.interest_compound_interval_secs;
                let seconds_per_year = self.config.seconds_per_year;

                let account = self.ledger.get_account(name)?;
                let mut seconds = account.savings_debt_seconds;
                let mut interest_paid = Asset::zero(Symbol::Agd);

                if account.savings_debt_seconds_last_update != now {
                    seconds += account.savings_debt_balance.amount.max(0) as u128
                        * now.secs_since(account.savings_debt_seconds_last_update) as u128;
                    if seconds > 0
                        && now.secs_since(account.savings_debt_last_interest_payment)
                            > compound_interval
                    {
                        interest_paid = Asset::agd(debt_interest(
                            seconds,
                            interest_rate,
                            seconds_per_year,
                        ));
                        seconds = 0;
                    }
                }

                let new_balance = account
                    .savings_debt_balance
                    .checked_add(delta)?
                    .checked_add(interest_paid)?;
                if new_balance.is_negative() {
                    return Err(ChainError::InsufficientBalance(format!(
                        "{} lacks debt savings for {}",
                        name, delta
                    )));
                }

                self.ledger.modify_account(name, |a| {
                    a.savings_debt_balance = new_balance;
                    a.savings_debt_seconds = seconds;
                    a.savings_debt_seconds_last_update = now;
                    if !interest_paid.is_zero() {
                        a.savings_debt_last_interest_payment = now;
                    }
                })?;

                if !interest_paid.is_zero() {
                    let median = self.ledger.feed_history()?.current_median;
                    self.ledger.modify_globals(|g| {
                        g.current_debt_supply.amount += interest_paid.amount;
                        if let Some(median) = median {
                            if let Ok(debt_in_core) = g.current_debt_supply.convert(&median) {
                                g.virtual_supply.amount =
                                    g.current_supply.amount + debt_in_core.amount;
                            }
                        }
                    })?;
                    self.push_virtual_operation(VirtualOperation::Interest {
                        owner: name.clone(),
                        interest: interest_paid,
                    });
                }
                Ok(())
            }
            Symbol::Vests => Err(ChainError::Consistency(
                "stake cannot be moved to savings".into(),
            )),
        }
    }

    /// Track a supply change in the global properties
    pub(crate) fn adjust_supply(&mut self, delta: Asset) -> ChainResult<()> {
        let median = self.ledger.feed_history()?.current_median;
        self.ledger.modify_globals(|g| match delta.symbol {
            Symbol::Agr => {
                g.current_supply.amount += delta.amount;
                g.virtual_supply.amount += delta.amount;
            }
            Symbol::Agd => {
                g.current_debt_supply.amount += delta.amount;
                // recompute rather than accumulate, so per-step rounding
                // can never drift the identity
                match median {
                    Some(median) => {
                        if let Ok(debt_in_core) = g.current_debt_supply.convert(&median) {
                            g.virtual_supply.amount =
                                g.current_supply.amount + debt_in_core.amount;
                        }
                    }
                    None => {}
                }
            }
            Symbol::Vests => {}
        })?;
        let globals = self.ledger.globals()?;
        if globals.current_supply.is_negative() || globals.current_debt_supply.is_negative() {
            return Err(ChainError::Consistency("supply went negative".into()));
        }
        Ok(())
    }

    /// Charge a fee: the amount leaves the payer and the supply entirely
    pub(crate) fn pay_fee(&mut self, name: &AccountName, fee: Asset) -> ChainResult<()> {
        if fee.amount < 0 {
            return Err(ChainError::Consistency("negative fee".into()));
        }
        if fee.is_zero() {
            return Ok(());
        }
        self.adjust_balance(name, fee.negate())?;
        self.adjust_supply(fee.negate())
    }

    /// Convert core asset into stake for `to`.
    ///
    /// The ratio of the vesting fund to outstanding shares must not move:
    /// the new shares are `amount * total_shares / fund`. The caller is
    /// responsible for having accounted `amount` into the supply; this
    /// routine moves it into the vesting fund.
    pub(crate) fn create_vesting(
        &mut self,
        to: &AccountName,
        amount: Asset,
    ) -> ChainResult<Asset> {
        if amount.symbol != Symbol::Agr {
            return Err(ChainError::Consistency(
                "vesting is created from the core asset".into(),
            ));
        }
        let price = self.ledger.globals()?.vesting_share_price();
        let new_vesting = amount.convert(&price)?;

        self.ledger
            .modify_account(to, |a| a.vesting_shares.amount += new_vesting.amount)?;
        self.ledger.modify_globals(|g| {
            g.total_vesting_fund.amount += amount.amount;
            g.total_vesting_shares.amount += new_vesting.amount;
        })?;
        self.adjust_proxied_witness_votes(to, new_vesting.amount)?;

        Ok(new_vesting)
    }

    /// Pay `amount` of core asset partly as debt asset per the print rate.
    /// Returns the (debt, core) actually credited.
    pub(crate) fn create_debt(
        &mut self,
        to: &AccountName,
        amount: Asset,
    ) -> ChainResult<(Asset, Asset)> {
        if amount.symbol != Symbol::Agr {
            return Err(ChainError::Consistency(
                "debt is printed against the core asset".into(),
            ));
        }
        if amount.is_zero() {
            return Ok((Asset::zero(Symbol::Agd), Asset::zero(Symbol::Agr)));
        }

        let median = self.ledger.feed_history()?.current_median;
        match median {
            Some(median) => {
                let print_rate = self.ledger.globals()?.debt_print_rate;
                let to_debt_core = amount.percent(print_rate);
                let stays_core = amount.checked_sub(to_debt_core)?;

                let debt = to_debt_core.convert(&median)?;
                self.adjust_balance(to, debt)?;
                self.adjust_balance(to, stays_core)?;
                self.adjust_supply(to_debt_core.negate())?;
                self.adjust_supply(debt)?;
                Ok((debt, stays_core))
            }
            None => {
                // no price feed yet: pay everything in core asset
                self.adjust_balance(to, amount)?;
                Ok((Asset::zero(Symbol::Agd), amount))
            }
        }
    }

    /// Value of a core amount in debt asset at the median; zero without a
    /// feed
    pub(crate) fn to_debt(&self, amount: Asset) -> ChainResult<Asset> {
        match self.ledger.feed_history()?.current_median {
            Some(median) => amount.convert(&median),
            None => Ok(Asset::zero(Symbol::Agd)),
        }
    }

    /// Value of a debt amount in core asset at the median; zero without a
    /// feed
    pub(crate) fn to_coin(&self, amount: Asset) -> ChainResult<Asset> {
        match self.ledger.feed_history()?.current_median {
            Some(median) => amount.convert(&median),
            None => Ok(Asset::zero(Symbol::Agr)),
        }
    }

    // --- witness vote propagation ---

    /// Propagate a stake-weight change through the proxy chain to the
    /// voting account, then into its approved witnesses. Iterative with a
    /// static depth bound.
    pub(crate) fn adjust_proxied_witness_votes(
        &mut self,
        name: &AccountName,
        delta: i64,
    ) -> ChainResult<()> {
        let mut current = name.clone();
        let mut depth = 0usize;

        loop {
            let proxy = self.ledger.get_account(&current)?.proxy.clone();
            match proxy {
                Some(proxy) => {
                    if depth >= MAX_PROXY_RECURSION_DEPTH {
                        // deeper chains do not propagate
                        return Ok(());
                    }
                    self.ledger
                        .modify_account(&proxy, |a| a.proxied_vsf_votes[depth] += delta)?;
                    current = proxy;
                    depth += 1;
                }
                None => {
                    return self.adjust_witness_votes(&current, delta);
                }
            }
        }
    }

    /// Move a whole proxied-vote subtree when an account switches proxy.
    /// `deltas[i]` is the weight at proxy distance `i`.
    pub(crate) fn adjust_proxied_witness_votes_array(
        &mut self,
        name: &AccountName,
        deltas: &[i64; MAX_PROXY_RECURSION_DEPTH + 1],
    ) -> ChainResult<()> {
        let mut current = name.clone();
        let mut depth = 0usize;

        loop {
            let proxy = self.ledger.get_account(&current)?.proxy.clone();
            match proxy {
                Some(proxy) => {
                    if depth >= MAX_PROXY_RECURSION_DEPTH {
                        return Ok(());
                    }
                    self.ledger.modify_account(&proxy, |a| {
                        for i in (0..MAX_PROXY_RECURSION_DEPTH - depth).rev() {
                            a.proxied_vsf_votes[i + depth] += deltas[i];
                        }
                    })?;
                    current = proxy;
                    depth += 1;
                }
                None => {
                    let total: i64 = deltas[..=MAX_PROXY_RECURSION_DEPTH - depth].iter().sum();
                    return self.adjust_witness_votes(&current, total);
                }
            }
        }
    }

    /// Apply a weight delta to every witness the account approves
    pub(crate) fn adjust_witness_votes(
        &mut self,
        name: &AccountName,
        delta: i64,
    ) -> ChainResult<()> {
        for witness in self.ledger.witness_votes_by(name) {
            consensus::schedule::adjust_witness_vote(&mut self.ledger, &witness, delta)?;
        }
        Ok(())
    }

    /// Drop every witness approval an account holds
    pub(crate) fn clear_witness_votes(&mut self, name: &AccountName) -> ChainResult<()> {
        for witness in self.ledger.witness_votes_by(name) {
            self.ledger
                .remove_witness_vote(&(name.clone(), witness))?;
        }
        self.ledger
            .modify_account(name, |a| a.witnesses_voted_for = 0)
    }

    /// Track a change in a content item's curve-transformed reward shares
    pub(crate) fn adjust_reward_shares(
        &mut self,
        old_vshares: u128,
        new_vshares: u128,
    ) -> ChainResult<()> {
        self.ledger.modify_globals(|g| {
            g.total_reward_shares = g.total_reward_shares - old_vshares + new_vshares;
        })
    }

    /// Funds sent to the null account are burned at the start of each
    /// block. Burns bypass the interest accrual on purpose: a balance being
    /// destroyed earns nothing.
    pub(crate) fn clear_null_account_balance(&mut self) -> ChainResult<()> {
        let null_name = AccountName::from("null");
        let account = match self.ledger.find_account(&null_name) {
            Some(a) => a.clone(),
            None => return Ok(()),
        };

        let burned_coin = account.balance.amount + account.savings_balance.amount;
        let burned_debt = account.debt_balance.amount + account.savings_debt_balance.amount;
        let burned_vesting = account.vesting_shares.amount;

        if burned_coin == 0 && burned_debt == 0 && burned_vesting == 0 {
            return Ok(());
        }

        let price = self.ledger.globals()?.vesting_share_price();
        let vesting_in_core = Asset::vests(burned_vesting).convert(&price)?;

        self.ledger.modify_account(&null_name, |a| {
            a.balance.amount = 0;
            a.savings_balance.amount = 0;
            a.debt_balance.amount = 0;
            a.savings_debt_balance.amount = 0;
            a.debt_seconds = 0;
            a.savings_debt_seconds = 0;
            a.vesting_shares.amount = 0;
        })?;

        if burned_coin > 0 {
            self.adjust_supply(Asset::agr(-burned_coin))?;
        }
        if burned_debt > 0 {
            self.adjust_supply(Asset::agd(-burned_debt))?;
        }
        if burned_vesting > 0 {
            self.ledger.modify_globals(|g| {
                g.total_vesting_shares.amount -= burned_vesting;
                g.total_vesting_fund.amount -= vesting_in_core.amount;
                g.current_supply.amount -= vesting_in_core.amount;
                g.virtual_supply.amount -= vesting_in_core.amount;
            })?;
        }
        Ok(())
    }
}
