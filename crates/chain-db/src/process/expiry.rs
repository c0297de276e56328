// chain-db/src/process/expiry.rs

use crate::{ChainResult, Database};
use chain_core::{AccountName, Timestamp, VirtualOperation, MAX_PROXY_RECURSION_DEPTH};

impl Database {
    /// Drop dedup records whose transactions can no longer replay
    pub(crate) fn clear_expired_transactions(&mut self) -> ChainResult<()> {
        let now = self.head_block_time();
        let expired: Vec<_> = self
            .ledger
            .transaction_objects()
            .filter(|t| t.expiration < now)
            .map(|t| t.trx_id)
            .collect();
        for id in expired {
            self.ledger.remove_transaction_object(&id)?;
        }
        Ok(())
    }

    /// Cancel expired orders, refunding the unfilled remainder
    pub(crate) fn clear_expired_orders(&mut self) -> ChainResult<()> {
        let now = self.head_block_time();
        let mut expired: Vec<(Timestamp, u64)> = self
            .ledger
            .limit_orders()
            .filter(|o| o.expiration < now)
            .map(|o| (o.expiration, o.id))
            .collect();
        expired.sort_unstable();

        for (_, id) in expired {
            self.cancel_order(id)?;
        }
        Ok(())
    }

    /// Return delegated stake whose lock has elapsed to its delegator
    pub(crate) fn clear_expired_delegations(&mut self) -> ChainResult<()> {
        let now = self.head_block_time();
        let mut expired: Vec<(Timestamp, u64)> = self
            .ledger
            .delegation_expirations()
            .filter(|d| d.expiration <= now)
            .map(|d| (d.expiration, d.id))
            .collect();
        expired.sort_unstable();

        for (_, id) in expired {
            let entry = self.ledger.get_delegation_expiration(&id)?.clone();
            self.ledger.modify_account(&entry.delegator, |a| {
                a.delegated_vesting_shares.amount -= entry.vesting_shares.amount;
            })?;
            self.ledger.remove_delegation_expiration(&id)?;
            self.push_virtual_operation(VirtualOperation::ReturnVestingDelegation {
                account: entry.delegator,
                vesting_shares: entry.vesting_shares,
            });
        }
        Ok(())
    }

    /// Return escrows nobody ratified before their deadline
    pub(crate) fn expire_escrow_ratifications(&mut self) -> ChainResult<()> {
        let now = self.head_block_time();
        let mut expired: Vec<(Timestamp, AccountName, u32)> = self
            .ledger
            .escrows()
            .filter(|e| !e.is_approved() && e.ratification_deadline <= now)
            .map(|e| (e.ratification_deadline, e.from.clone(), e.escrow_id))
            .collect();
        expired.sort_unstable();

        for (_, from, escrow_id) in expired {
            let key = (from, escrow_id);
            let escrow = self.ledger.get_escrow(&key)?.clone();
            self.ledger.remove_escrow(&key)?;

            if escrow.coin_balance.amount > 0 {
                self.adjust_balance(&escrow.from, escrow.coin_balance)?;
            }
            if escrow.debt_balance.amount > 0 {
                self.adjust_balance(&escrow.from, escrow.debt_balance)?;
            }
            if escrow.pending_fee.amount > 0 {
                self.adjust_balance(&escrow.from, escrow.pending_fee)?;
            }
        }
        Ok(())
    }

    /// Finalize matured requests to give up governance votes
    pub(crate) fn process_decline_voting_rights(&mut self) -> ChainResult<()> {
        let now = self.head_block_time();
        let matured: Vec<AccountName> = self
            .ledger
            .decline_requests()
            .filter(|r| r.effective_date <= now)
            .map(|r| r.account.clone())
            .collect();

        for name in matured {
            let account = self.ledger.get_account(&name)?;
            let mut deltas = [0i64; MAX_PROXY_RECURSION_DEPTH + 1];
            deltas[0] = account.vesting_shares.amount;
            for i in 0..MAX_PROXY_RECURSION_DEPTH {
                deltas[i + 1] = account.proxied_vsf_votes[i];
            }
            let negated = deltas.map(|d| -d);

            self.adjust_proxied_witness_votes_array(&name, &negated)?;
            self.clear_witness_votes(&name)?;
            self.ledger.modify_account(&name, |a| {
                a.can_vote = false;
                a.proxy = None;
            })?;
            self.ledger.remove_decline_request(&name)?;
        }
        Ok(())
    }
}
