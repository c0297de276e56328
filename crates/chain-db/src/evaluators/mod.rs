// chain-db/src/evaluators/mod.rs

//! Operation evaluators.
//!
//! One function per operation kind: validate dynamic preconditions against
//! current ledger state, apply exactly the implied mutations, emit virtual
//! operations for observers. Atomicity comes from the pipeline, which runs
//! every evaluator inside a nested checkpoint; an evaluator that fails must
//! simply return the error and leave the rest to the rollback.
//!
//! Dispatch is an exhaustive match: a new operation variant without an
//! evaluator is a compile error.

mod account;
mod content;
mod market;

use crate::{ChainResult, Database};
use chain_core::Operation;

pub(crate) fn apply(db: &mut Database, op: &Operation) -> ChainResult<()> {
    use Operation::*;
    match op {
        AccountCreate(op) => account::account_create(db, op),
        AccountUpdate(op) => account::account_update(db, op),
        Transfer(op) => account::transfer(db, op),
        TransferToVesting(op) => account::transfer_to_vesting(db, op),
        WithdrawVesting(op) => account::withdraw_vesting(db, op),
        SetWithdrawVestingRoute(op) => account::set_withdraw_vesting_route(db, op),
        Convert(op) => market::convert(db, op),
        LimitOrderCreate(op) => market::limit_order_create(db, op),
        LimitOrderCancel(op) => market::limit_order_cancel(db, op),
        FeedPublish(op) => account::feed_publish(db, op),
        WitnessUpdate(op) => account::witness_update(db, op),
        AccountWitnessVote(op) => account::account_witness_vote(db, op),
        AccountWitnessProxy(op) => account::account_witness_proxy(db, op),
        Post(op) => content::post(db, op),
        CommentOptions(op) => content::comment_options(db, op),
        DeleteContent(op) => content::delete_content(db, op),
        Vote(op) => content::vote(db, op),
        CustomJson(op) => account::custom_json(db, op),
        TransferToSavings(op) => market::transfer_to_savings(db, op),
        TransferFromSavings(op) => market::transfer_from_savings(db, op),
        CancelTransferFromSavings(op) => market::cancel_transfer_from_savings(db, op),
        DelegateVestingShares(op) => account::delegate_vesting_shares(db, op),
        EscrowTransfer(op) => market::escrow_transfer(db, op),
        EscrowApprove(op) => market::escrow_approve(db, op),
        EscrowDispute(op) => market::escrow_dispute(db, op),
        EscrowRelease(op) => market::escrow_release(db, op),
        DeclineVotingRights(op) => account::decline_voting_rights(db, op),
    }
}
