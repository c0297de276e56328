// chain-db/src/evaluators/market.rs

use crate::{ChainError, ChainResult, Database};
use chain_core::operations::*;
use chain_core::{Asset, ConvertRequest, Escrow, LimitOrder, SavingsWithdraw};

fn logic(msg: impl Into<String>) -> ChainError {
    ChainError::LogicViolation(msg.into())
}

pub(super) fn convert(db: &mut Database, op: &ConvertOperation) -> ChainResult<()> {
    db.ledger().get_account(&op.owner)?;
    let key = (op.owner.clone(), op.requestid);
    if db.ledger().find_convert_request(&key).is_some() {
        return Err(ChainError::duplicate(
            "conversion request",
            format!("{}/{}", op.owner, op.requestid),
        ));
    }

    db.adjust_balance(&op.owner, op.amount.negate())?;

    let conversion_date = db
        .head_block_time()
        .saturating_add(db.config().conversion_delay_secs);
    db.ledger_mut().create_convert_request(
        key,
        ConvertRequest {
            owner: op.owner.clone(),
            requestid: op.requestid,
            amount: op.amount,
            conversion_date,
        },
    )
}

pub(super) fn limit_order_create(
    db: &mut Database,
    op: &LimitOrderCreateOperation,
) -> ChainResult<()> {
    db.ledger().get_account(&op.owner)?;
    if op.expiration <= db.head_block_time() {
        return Err(logic("order expiration is in the past"));
    }
    if db.find_order(&op.owner, op.orderid).is_some() {
        return Err(ChainError::duplicate(
            "limit order",
            format!("{}/{}", op.owner, op.orderid),
        ));
    }

    let sell_price = op.sell_price()?;
    db.adjust_balance(&op.owner, op.amount_to_sell.negate())?;

    let id = db.ledger_mut().allocate_order_id();
    let now = db.head_block_time();
    db.ledger_mut().create_limit_order(
        id,
        LimitOrder {
            id,
            created: now,
            expiration: op.expiration,
            seller: op.owner.clone(),
            orderid: op.orderid,
            for_sale: op.amount_to_sell.amount,
            sell_price,
        },
    )?;

    let filled = db.apply_order(id)?;
    if op.fill_or_kill && !filled {
        return Err(logic("fill-or-kill order was not fully filled"));
    }
    Ok(())
}

pub(super) fn limit_order_cancel(
    db: &mut Database,
    op: &LimitOrderCancelOperation,
) -> ChainResult<()> {
    let order = db
        .find_order(&op.owner, op.orderid)
        .ok_or_else(|| {
            ChainError::missing("limit order", format!("{}/{}", op.owner, op.orderid))
        })?;
    db.cancel_order(order)
}

pub(super) fn transfer_to_savings(
    db: &mut Database,
    op: &TransferToSavingsOperation,
) -> ChainResult<()> {
    db.ledger().get_account(&op.to)?;
    db.adjust_balance(&op.from, op.amount.negate())?;
    db.adjust_savings_balance(&op.to, op.amount)
}

pub(super) fn transfer_from_savings(
    db: &mut Database,
    op: &TransferFromSavingsOperation,
) -> ChainResult<()> {
    let from = db.ledger().get_account(&op.from)?;
    db.ledger().get_account(&op.to)?;
    if from.savings_withdraw_requests >= db.config().savings_withdraw_limit {
        return Err(logic("too many savings withdrawals in flight"));
    }

    let key = (op.from.clone(), op.request_id);
    if db.ledger().find_savings_withdraw(&key).is_some() {
        return Err(ChainError::duplicate(
            "savings withdrawal",
            format!("{}/{}", op.from, op.request_id),
        ));
    }

    db.adjust_savings_balance(&op.from, op.amount.negate())?;

    let complete = db
        .head_block_time()
        .saturating_add(db.config().savings_withdraw_delay_secs);
    db.ledger_mut().create_savings_withdraw(
        key,
        SavingsWithdraw {
            from: op.from.clone(),
            to: op.to.clone(),
            memo: op.memo.clone(),
            request_id: op.request_id,
            amount: op.amount,
            complete,
        },
    )?;
    db.ledger_mut()
        .modify_account(&op.from, |a| a.savings_withdraw_requests += 1)
}

pub(super) fn cancel_transfer_from_savings(
    db: &mut Database,
    op: &CancelTransferFromSavingsOperation,
) -> ChainResult<()> {
    let key = (op.from.clone(), op.request_id);
    let withdraw = db
        .ledger()
        .get_savings_withdraw(&key)?
        .clone();

    db.ledger_mut().remove_savings_withdraw(&key)?;
    db.adjust_savings_balance(&op.from, withdraw.amount)?;
    db.ledger_mut()
        .modify_account(&op.from, |a| a.savings_withdraw_requests -= 1)
}

pub(super) fn escrow_transfer(db: &mut Database, op: &EscrowTransferOperation) -> ChainResult<()> {
    db.ledger().get_account(&op.to)?;
    db.ledger().get_account(&op.agent)?;

    let now = db.head_block_time();
    if op.ratification_deadline <= now {
        return Err(logic("ratification deadline is in the past"));
    }

    let key = (op.from.clone(), op.escrow_id);
    if db.ledger().find_escrow(&key).is_some() {
        return Err(ChainError::duplicate(
            "escrow",
            format!("{}/{}", op.from, op.escrow_id),
        ));
    }

    if op.coin_amount.amount > 0 {
        db.adjust_balance(&op.from, op.coin_amount.negate())?;
    }
    if op.debt_amount.amount > 0 {
        db.adjust_balance(&op.from, op.debt_amount.negate())?;
    }
    if op.fee.amount > 0 {
        db.adjust_balance(&op.from, op.fee.negate())?;
    }

    db.ledger_mut().create_escrow(
        key,
        Escrow {
            escrow_id: op.escrow_id,
            from: op.from.clone(),
            to: op.to.clone(),
            agent: op.agent.clone(),
            ratification_deadline: op.ratification_deadline,
            escrow_expiration: op.escrow_expiration,
            debt_balance: op.debt_amount,
            coin_balance: op.coin_amount,
            pending_fee: op.fee,
            to_approved: false,
            agent_approved: false,
            disputed: false,
        },
    )
}

pub(super) fn escrow_approve(db: &mut Database, op: &EscrowApproveOperation) -> ChainResult<()> {
    let key = (op.from.clone(), op.escrow_id);
    let escrow = db.ledger().get_escrow(&key)?.clone();
    if escrow.to != op.to || escrow.agent != op.agent {
        return Err(logic("escrow parties do not match"));
    }
    if escrow.is_approved() {
        return Err(logic("escrow is already fully approved"));
    }

    if !op.approve {
        // a rejection returns everything to the sender
        db.ledger_mut().remove_escrow(&key)?;
        if escrow.coin_balance.amount > 0 {
            db.adjust_balance(&escrow.from, escrow.coin_balance)?;
        }
        if escrow.debt_balance.amount > 0 {
            db.adjust_balance(&escrow.from, escrow.debt_balance)?;
        }
        if escrow.pending_fee.amount > 0 {
            db.adjust_balance(&escrow.from, escrow.pending_fee)?;
        }
        return Ok(());
    }

    if op.who == escrow.to {
        if escrow.to_approved {
            return Err(logic("recipient already approved"));
        }
        db.ledger_mut().modify_escrow(&key, |e| e.to_approved = true)?;
    } else {
        if escrow.agent_approved {
            return Err(logic("agent already approved"));
        }
        db.ledger_mut()
            .modify_escrow(&key, |e| e.agent_approved = true)?;
    }

    // the agent earns the fee the moment both parties have ratified
    let escrow = db.ledger().get_escrow(&key)?.clone();
    if escrow.is_approved() && escrow.pending_fee.amount > 0 {
        db.adjust_balance(&escrow.agent, escrow.pending_fee)?;
        db.ledger_mut()
            .modify_escrow(&key, |e| e.pending_fee = Asset::zero(e.pending_fee.symbol))?;
    }
    Ok(())
}

pub(super) fn escrow_dispute(db: &mut Database, op: &EscrowDisputeOperation) -> ChainResult<()> {
    let key = (op.from.clone(), op.escrow_id);
    let escrow = db.ledger().get_escrow(&key)?;
    if escrow.to != op.to || escrow.agent != op.agent {
        return Err(logic("escrow parties do not match"));
    }
    if !escrow.is_approved() {
        return Err(logic("cannot dispute an unapproved escrow"));
    }
    if escrow.disputed {
        return Err(logic("escrow is already disputed"));
    }
    db.ledger_mut().modify_escrow(&key, |e| e.disputed = true)
}

pub(super) fn escrow_release(db: &mut Database, op: &EscrowReleaseOperation) -> ChainResult<()> {
    let key = (op.from.clone(), op.escrow_id);
    let escrow = db.ledger().get_escrow(&key)?.clone();
    if escrow.to != op.to || escrow.agent != op.agent {
        return Err(logic("escrow parties do not match"));
    }
    if !escrow.is_approved() {
        return Err(logic("cannot release an unapproved escrow"));
    }

    let now = db.head_block_time();
    if escrow.disputed {
        // only the agent arbitrates a dispute
        if op.who != escrow.agent {
            return Err(logic("only the agent may release a disputed escrow"));
        }
    } else if now < escrow.escrow_expiration {
        // before expiration each party may only release toward the other
        if op.who == escrow.from && op.receiver != escrow.to {
            return Err(logic("sender may only release to the recipient"));
        }
        if op.who == escrow.to && op.receiver != escrow.from {
            return Err(logic("recipient may only release to the sender"));
        }
        if op.who == escrow.agent {
            return Err(logic("agent may only release a disputed escrow"));
        }
    }
    // after expiration either party may claim to itself

    if op.coin_amount.amount > escrow.coin_balance.amount
        || op.debt_amount.amount > escrow.debt_balance.amount
    {
        return Err(logic("release exceeds the escrowed funds"));
    }

    if op.coin_amount.amount > 0 {
        db.adjust_balance(&op.receiver, op.coin_amount)?;
    }
    if op.debt_amount.amount > 0 {
        db.adjust_balance(&op.receiver, op.debt_amount)?;
    }

    let remaining_coin = escrow.coin_balance.amount - op.coin_amount.amount;
    let remaining_debt = escrow.debt_balance.amount - op.debt_amount.amount;
    if remaining_coin == 0 && remaining_debt == 0 {
        db.ledger_mut().remove_escrow(&key)
    } else {
        db.ledger_mut().modify_escrow(&key, |e| {
            e.coin_balance.amount = remaining_coin;
            e.debt_balance.amount = remaining_debt;
        })
    }
}
