// chain-db/src/auth.rs

//! Signature authority resolution.
//!
//! A transaction must satisfy, for every account an operation names, that
//! account's authority in the required role. Posting requirements may be
//! met by the stronger active or owner authority, and active by owner.
//! Account-authorities resolve recursively to a fixed depth so that a
//! multisig account can delegate to member accounts without unbounded
//! recursion.

use crate::{Database, SkipFlags};
use chain_core::{AccountName, Authority, ChainError, ChainResult, SignedTransaction};
use chain_crypto::PublicKey;
use std::collections::BTreeSet;

/// Which authority level an operation demanded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Owner,
    Active,
    Posting,
}

impl Database {
    pub(crate) fn verify_authority(
        &self,
        tx: &SignedTransaction,
        owner: &BTreeSet<AccountName>,
        active: &BTreeSet<AccountName>,
        posting: &BTreeSet<AccountName>,
    ) -> ChainResult<()> {
        // posting authorities never mix with higher roles in one
        // transaction; a stolen posting key must not ride along with an
        // active-level operation
        if !posting.is_empty() && (!owner.is_empty() || !active.is_empty()) {
            return Err(ChainError::InvalidTransaction(
                "cannot combine posting and active/owner operations".into(),
            ));
        }

        let mut candidates: Vec<PublicKey> = Vec::new();
        for name in owner.iter().chain(active.iter()).chain(posting.iter()) {
            self.gather_candidate_keys(name, 0, &mut candidates)?;
        }
        candidates.sort();
        candidates.dedup();

        let signed: BTreeSet<PublicKey> = tx
            .signed_by(&candidates)?
            .into_iter()
            .cloned()
            .collect();

        for name in posting {
            if !self.account_authority_satisfied(name, Role::Posting, &signed, 0)? {
                return Err(ChainError::InsufficientAuthority("posting"));
            }
        }
        for name in active {
            if !self.account_authority_satisfied(name, Role::Active, &signed, 0)? {
                return Err(ChainError::InsufficientAuthority("active"));
            }
        }
        for name in owner {
            if !self.account_authority_satisfied(name, Role::Owner, &signed, 0)? {
                return Err(ChainError::InsufficientAuthority("owner"));
            }
        }
        Ok(())
    }

    /// Every key that could contribute to satisfying `name`'s authorities,
    /// to the configured recursion depth
    fn gather_candidate_keys(
        &self,
        name: &AccountName,
        depth: u32,
        out: &mut Vec<PublicKey>,
    ) -> ChainResult<()> {
        let account = match self.ledger.find_account(name) {
            Some(a) => a,
            None => return Ok(()),
        };
        for auth in [&account.owner, &account.active, &account.posting] {
            out.extend(auth.key_auths.keys().cloned());
            if depth < self.config.max_sig_check_depth {
                let members: Vec<AccountName> = auth.account_auths.keys().cloned().collect();
                for member in members {
                    self.gather_candidate_keys(&member, depth + 1, out)?;
                }
            }
        }
        Ok(())
    }

    fn account_authority_satisfied(
        &self,
        name: &AccountName,
        role: Role,
        signed: &BTreeSet<PublicKey>,
        depth: u32,
    ) -> ChainResult<bool> {
        let account = self.ledger.get_account(name)?;

        // a stronger role always suffices
        let ladder: &[&Authority] = match role {
            Role::Posting => &[&account.posting, &account.active, &account.owner],
            Role::Active => &[&account.active, &account.owner],
            Role::Owner => &[&account.owner],
        };

        for auth in ladder {
            if self.authority_satisfied(auth, role, signed, depth)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn authority_satisfied(
        &self,
        auth: &Authority,
        role: Role,
        signed: &BTreeSet<PublicKey>,
        depth: u32,
    ) -> ChainResult<bool> {
        let mut weight = 0u64;

        for (key, w) in &auth.key_auths {
            if signed.contains(key) {
                weight += *w as u64;
                if weight >= auth.weight_threshold as u64 {
                    return Ok(true);
                }
            }
        }

        if depth < self.config.max_sig_check_depth {
            for (member, w) in &auth.account_auths {
                if self.ledger.find_account(member).is_none() {
                    continue;
                }
                if self.account_authority_satisfied(member, role, signed, depth + 1)? {
                    weight += *w as u64;
                    if weight >= auth.weight_threshold as u64 {
                        return Ok(true);
                    }
                }
            }
        }

        Ok(weight >= auth.weight_threshold as u64)
    }

    /// Charge each required account's bandwidth for this transaction,
    /// under every traffic class its operations touch
    pub(crate) fn charge_bandwidth(
        &mut self,
        tx: &SignedTransaction,
        owner: &BTreeSet<AccountName>,
        active: &BTreeSet<AccountName>,
        posting: &BTreeSet<AccountName>,
    ) -> ChainResult<()> {
        let size = tx.serialized_size() as u64;

        let mut required: BTreeSet<AccountName> = BTreeSet::new();
        required.extend(owner.iter().cloned());
        required.extend(active.iter().cloned());
        required.extend(posting.iter().cloned());

        let has_market = tx.tx.operations.iter().any(|op| op.is_market_operation());
        let has_custom = tx.tx.operations.iter().any(|op| op.is_custom_operation());
        let custom_multiplier = self
            .ledger
            .globals()?
            .custom_ops_bandwidth_multiplier as u64;

        for name in required {
            self.update_account_bandwidth(
                &name,
                size,
                chain_core::BandwidthType::Forum,
            )?;
            if has_market {
                self.update_account_bandwidth(
                    &name,
                    size * self.config.market_bandwidth_multiplier,
                    chain_core::BandwidthType::Market,
                )?;
            }
            if has_custom {
                self.update_account_bandwidth(
                    &name,
                    size * custom_multiplier,
                    chain_core::BandwidthType::Custom,
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // authority resolution is exercised end to end in the integration
    // suite, where accounts with real keys sign transactions
}
