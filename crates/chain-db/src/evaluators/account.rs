// chain-db/src/evaluators/account.rs

use crate::{ChainError, ChainResult, Database};
use chain_core::operations::*;
use chain_core::{
    Account, Asset, Authority, ChainProperties, DeclineVotingRightsRequest, Timestamp,
    VestingDelegation, VestingDelegationExpiration, Witness, WithdrawVestingRoute,
    MAX_PROXY_RECURSION_DEPTH,
};

fn logic(msg: impl Into<String>) -> ChainError {
    ChainError::LogicViolation(msg.into())
}

/// Every account an authority references must exist
fn check_authority_accounts(db: &Database, auth: &Authority) -> ChainResult<()> {
    for name in auth.account_auths.keys() {
        db.ledger().get_account(name)?;
    }
    Ok(())
}

pub(super) fn account_create(db: &mut Database, op: &AccountCreateOperation) -> ChainResult<()> {
    db.ledger().get_account(&op.creator)?;
    if db.ledger().find_account(&op.new_account_name).is_some() {
        return Err(ChainError::duplicate("account", &op.new_account_name));
    }

    let required_fee = db.ledger().schedule()?.median_props.account_creation_fee;
    if op.fee < required_fee {
        return Err(logic(format!(
            "creation fee {} below the required {}",
            op.fee, required_fee
        )));
    }

    check_authority_accounts(db, &op.owner)?;
    check_authority_accounts(db, &op.active)?;
    check_authority_accounts(db, &op.posting)?;

    db.adjust_balance(&op.creator, op.fee.negate())?;

    let now = db.head_block_time();
    let mut account = Account::new(op.new_account_name.clone(), op.owner.clone(), now);
    account.active = op.active.clone();
    account.posting = op.posting.clone();
    db.ledger_mut()
        .create_account(op.new_account_name.clone(), account)?;

    // the fee seeds the new account's stake
    if op.fee.amount > 0 {
        db.create_vesting(&op.new_account_name, op.fee)?;
    }
    Ok(())
}

pub(super) fn account_update(db: &mut Database, op: &AccountUpdateOperation) -> ChainResult<()> {
    db.ledger().get_account(&op.account)?;

    for auth in [&op.owner, &op.active, &op.posting].into_iter().flatten() {
        check_authority_accounts(db, auth)?;
    }

    let (owner, active, posting) = (op.owner.clone(), op.active.clone(), op.posting.clone());
    db.ledger_mut().modify_account(&op.account, |a| {
        if let Some(owner) = owner {
            a.owner = owner;
        }
        if let Some(active) = active {
            a.active = active;
        }
        if let Some(posting) = posting {
            a.posting = posting;
        }
    })
}

pub(super) fn transfer(db: &mut Database, op: &TransferOperation) -> ChainResult<()> {
    db.ledger().get_account(&op.to)?;
    db.adjust_balance(&op.from, op.amount.negate())?;
    db.adjust_balance(&op.to, op.amount)
}

pub(super) fn transfer_to_vesting(
    db: &mut Database,
    op: &TransferToVestingOperation,
) -> ChainResult<()> {
    let to = op.to.clone().unwrap_or_else(|| op.from.clone());
    db.ledger().get_account(&to)?;
    db.adjust_balance(&op.from, op.amount.negate())?;
    db.create_vesting(&to, op.amount)?;
    Ok(())
}

pub(super) fn withdraw_vesting(
    db: &mut Database,
    op: &WithdrawVestingOperation,
) -> ChainResult<()> {
    let account = db.ledger().get_account(&op.account)?;

    if op.vesting_shares.is_zero() {
        if account.vesting_withdraw_rate.amount == 0 {
            return Err(logic("no withdrawal to cancel"));
        }
        return db.ledger_mut().modify_account(&op.account, |a| {
            a.vesting_withdraw_rate = Asset::vests(0);
            a.next_vesting_withdrawal = Timestamp::MAX;
            a.to_withdraw = 0;
            a.withdrawn = 0;
        });
    }

    let own = account.vesting_shares.amount - account.delegated_vesting_shares.amount;
    if own < op.vesting_shares.amount {
        return Err(logic(format!(
            "cannot withdraw {}: only {} undelegated stake held",
            op.vesting_shares, own
        )));
    }

    let intervals = db.config().vesting_withdraw_intervals as i64;
    let interval_secs = db.config().vesting_withdraw_interval_secs;
    let mut rate = op.vesting_shares.amount / intervals.max(1);
    if rate == 0 {
        rate = 1;
    }
    let now = db.head_block_time();
    let amount = op.vesting_shares.amount;

    db.ledger_mut().modify_account(&op.account, |a| {
        a.vesting_withdraw_rate = Asset::vests(rate);
        a.next_vesting_withdrawal = now.saturating_add(interval_secs);
        a.to_withdraw = amount;
        a.withdrawn = 0;
    })
}

pub(super) fn set_withdraw_vesting_route(
    db: &mut Database,
    op: &SetWithdrawVestingRouteOperation,
) -> ChainResult<()> {
    db.ledger().get_account(&op.from_account)?;
    db.ledger().get_account(&op.to_account)?;

    let key = (op.from_account.clone(), op.to_account.clone());
    let exists = db.ledger().find_withdraw_route(&key).is_some();

    if op.percent == 0 {
        if !exists {
            return Err(logic("no such withdraw route"));
        }
        return db.ledger_mut().remove_withdraw_route(&key);
    }

    let other_total: u32 = db
        .ledger()
        .withdraw_routes_from(&op.from_account)
        .iter()
        .filter(|r| r.to_account != op.to_account)
        .map(|r| r.percent as u32)
        .sum();
    if other_total + op.percent as u32 > chain_core::PERCENT_100 as u32 {
        return Err(logic("withdraw routes exceed 100%"));
    }

    if exists {
        db.ledger_mut().modify_withdraw_route(&key, |r| {
            r.percent = op.percent;
            r.auto_vest = op.auto_vest;
        })
    } else {
        db.ledger_mut().create_withdraw_route(
            key,
            WithdrawVestingRoute {
                from_account: op.from_account.clone(),
                to_account: op.to_account.clone(),
                percent: op.percent,
                auto_vest: op.auto_vest,
            },
        )
    }
}

pub(super) fn feed_publish(db: &mut Database, op: &FeedPublishOperation) -> ChainResult<()> {
    db.ledger().get_witness(&op.publisher)?;
    let rate = op.exchange_rate;
    let now = db.head_block_time();
    db.ledger_mut().modify_witness(&op.publisher, |w| {
        w.exchange_rate = Some(rate);
        w.last_exchange_update = now;
    })
}

pub(super) fn witness_update(db: &mut Database, op: &WitnessUpdateOperation) -> ChainResult<()> {
    db.ledger().get_account(&op.owner)?;

    if db.ledger().find_witness(&op.owner).is_some() {
        let (url, key, props) = (op.url.clone(), op.block_signing_key.clone(), op.props.clone());
        db.ledger_mut().modify_witness(&op.owner, |w| {
            w.url = url;
            w.signing_key = key;
            w.props = props;
        })
    } else {
        if op.fee.amount > 0 {
            db.pay_fee(&op.owner, op.fee)?;
        }
        let now = db.head_block_time();
        let mut witness = Witness::new(op.owner.clone(), op.block_signing_key.clone(), now);
        witness.url = op.url.clone();
        witness.props = ChainProperties {
            account_creation_fee: op.props.account_creation_fee,
            maximum_block_size: op.props.maximum_block_size,
            debt_interest_rate: op.props.debt_interest_rate,
        };
        db.ledger_mut().create_witness(op.owner.clone(), witness)
    }
}

/// Upper bound on simultaneous witness approvals per account
const MAX_WITNESS_VOTES: u16 = 30;

pub(super) fn account_witness_vote(
    db: &mut Database,
    op: &AccountWitnessVoteOperation,
) -> ChainResult<()> {
    let account = db.ledger().get_account(&op.account)?;
    if !account.can_vote {
        return Err(logic("account has declined its voting rights"));
    }
    if account.proxy.is_some() {
        return Err(logic("cannot vote directly while a proxy is set"));
    }
    let weight = account.witness_vote_weight();
    let voted = account.witnesses_voted_for;

    db.ledger().get_witness(&op.witness)?;
    let key = (op.account.clone(), op.witness.clone());
    let exists = db.ledger().find_witness_vote(&key).is_some();

    if op.approve {
        if exists {
            return Err(logic("witness already approved"));
        }
        if voted >= MAX_WITNESS_VOTES {
            return Err(logic("too many witness approvals"));
        }
        db.ledger_mut().create_witness_vote(key, ())?;
        consensus::schedule::adjust_witness_vote(db.ledger_mut(), &op.witness, weight)?;
        db.ledger_mut()
            .modify_account(&op.account, |a| a.witnesses_voted_for += 1)
    } else {
        if !exists {
            return Err(logic("witness is not currently approved"));
        }
        db.ledger_mut().remove_witness_vote(&key)?;
        consensus::schedule::adjust_witness_vote(db.ledger_mut(), &op.witness, -weight)?;
        db.ledger_mut()
            .modify_account(&op.account, |a| a.witnesses_voted_for -= 1)
    }
}

pub(super) fn account_witness_proxy(
    db: &mut Database,
    op: &AccountWitnessProxyOperation,
) -> ChainResult<()> {
    let account = db.ledger().get_account(&op.account)?;
    if !account.can_vote {
        return Err(logic("account has declined its voting rights"));
    }
    if account.proxy == op.proxy {
        return Err(logic("proxy is unchanged"));
    }

    if let Some(new_proxy) = &op.proxy {
        // reject cycles: walking the proposed chain must not return here
        let mut cursor = new_proxy.clone();
        for _ in 0..=MAX_PROXY_RECURSION_DEPTH {
            if cursor == op.account {
                return Err(logic("proxy chain would form a cycle"));
            }
            match db.ledger().get_account(&cursor)?.proxy.clone() {
                Some(next) => cursor = next,
                None => break,
            }
        }
    }

    let mut deltas = [0i64; MAX_PROXY_RECURSION_DEPTH + 1];
    deltas[0] = account.vesting_shares.amount;
    for i in 0..MAX_PROXY_RECURSION_DEPTH {
        deltas[i + 1] = account.proxied_vsf_votes[i];
    }
    let negated = deltas.map(|d| -d);

    db.adjust_proxied_witness_votes_array(&op.account, &negated)?;

    let proxy = op.proxy.clone();
    db.ledger_mut()
        .modify_account(&op.account, |a| a.proxy = proxy)?;

    db.adjust_proxied_witness_votes_array(&op.account, &deltas)
}

pub(super) fn custom_json(db: &mut Database, op: &CustomJsonOperation) -> ChainResult<()> {
    // consensus only guarantees the named accounts exist and signed;
    // the payload itself is for observers
    for name in op.required_auths.iter().chain(op.required_posting_auths.iter()) {
        db.ledger().get_account(name)?;
    }
    Ok(())
}

pub(super) fn delegate_vesting_shares(
    db: &mut Database,
    op: &DelegateVestingSharesOperation,
) -> ChainResult<()> {
    db.ledger().get_account(&op.delegator)?;
    db.ledger().get_account(&op.delegatee)?;

    let key = (op.delegator.clone(), op.delegatee.clone());
    let existing = db
        .ledger()
        .find_vesting_delegation(&key)
        .map(|d| d.vesting_shares.amount)
        .unwrap_or(0);
    let target = op.vesting_shares.amount;
    let now = db.head_block_time();

    if target > existing {
        let delta = target - existing;
        let delegator = db.ledger().get_account(&op.delegator)?;
        let available =
            delegator.vesting_shares.amount - delegator.delegated_vesting_shares.amount;
        if available < delta {
            return Err(logic(format!(
                "cannot delegate {} more shares: only {} available",
                delta, available
            )));
        }

        if existing == 0 {
            db.ledger_mut().create_vesting_delegation(
                key,
                VestingDelegation {
                    delegator: op.delegator.clone(),
                    delegatee: op.delegatee.clone(),
                    vesting_shares: op.vesting_shares,
                    min_delegation_time: now,
                },
            )?;
        } else {
            db.ledger_mut()
                .modify_vesting_delegation(&key, |d| d.vesting_shares = Asset::vests(target))?;
        }
        db.ledger_mut().modify_account(&op.delegator, |a| {
            a.delegated_vesting_shares.amount += delta
        })?;
        db.ledger_mut().modify_account(&op.delegatee, |a| {
            a.received_vesting_shares.amount += delta
        })
    } else if target < existing {
        let returned = existing - target;

        // the returned shares stay locked until the expiration clears
        let id = db.ledger_mut().allocate_expiration_id();
        let expiration = now.saturating_add(db.config().delegation_return_delay_secs);
        db.ledger_mut().create_delegation_expiration(
            id,
            VestingDelegationExpiration {
                id,
                delegator: op.delegator.clone(),
                vesting_shares: Asset::vests(returned),
                expiration,
            },
        )?;

        if target == 0 {
            db.ledger_mut().remove_vesting_delegation(&key)?;
        } else {
            db.ledger_mut()
                .modify_vesting_delegation(&key, |d| d.vesting_shares = Asset::vests(target))?;
        }
        db.ledger_mut().modify_account(&op.delegatee, |a| {
            a.received_vesting_shares.amount -= returned
        })
    } else {
        Err(logic("delegation is unchanged"))
    }
}

pub(super) fn decline_voting_rights(
    db: &mut Database,
    op: &DeclineVotingRightsOperation,
) -> ChainResult<()> {
    let account = db.ledger().get_account(&op.account)?;
    if !account.can_vote {
        return Err(logic("voting rights already declined"));
    }

    let exists = db.ledger().find_decline_request(&op.account).is_some();
    if op.decline {
        if exists {
            return Err(ChainError::duplicate("decline request", &op.account));
        }
        let effective_date = db
            .head_block_time()
            .saturating_add(db.config().decline_voting_delay_secs);
        db.ledger_mut().create_decline_request(
            op.account.clone(),
            DeclineVotingRightsRequest {
                account: op.account.clone(),
                effective_date,
            },
        )
    } else {
        if !exists {
            return Err(logic("no decline request to cancel"));
        }
        db.ledger_mut().remove_decline_request(&op.account)
    }
}
