// chain-db/src/process/orders.rs

use crate::{ChainError, ChainResult, Database};
use chain_core::{
    AccountName, Asset, LiquidityRewardBalance, Symbol, Timestamp, VirtualOperation,
};

impl Database {
    /// Mature every due debt-to-core conversion at the current median
    pub(crate) fn process_conversions(&mut self) -> ChainResult<()> {
        let now = self.head_block_time();
        let median = match self.ledger.feed_history()?.current_median {
            Some(m) => m,
            None => return Ok(()),
        };

        let mut ready: Vec<(Timestamp, AccountName, u32)> = self
            .ledger
            .convert_requests()
            .filter(|r| r.conversion_date <= now)
            .map(|r| (r.conversion_date, r.owner.clone(), r.requestid))
            .collect();
        ready.sort_unstable();

        let mut net_debt = 0i64;
        let mut net_coin = 0i64;

        for (_, owner, requestid) in ready {
            let key = (owner.clone(), requestid);
            let request = self.ledger.get_convert_request(&key)?.clone();
            let issued = request.amount.convert(&median)?;

            self.adjust_balance(&owner, issued)?;
            net_debt += request.amount.amount;
            net_coin += issued.amount;

            self.ledger.remove_convert_request(&key)?;
            self.push_virtual_operation(VirtualOperation::FillConvertRequest {
                owner,
                requestid,
                amount_in: request.amount,
                amount_out: issued,
            });
        }

        if net_debt > 0 {
            self.ledger.modify_globals(|g| {
                g.current_supply.amount += net_coin;
                g.current_debt_supply.amount -= net_debt;
                if let Ok(debt_in_core) = g.current_debt_supply.convert(&median) {
                    g.virtual_supply.amount = g.current_supply.amount + debt_in_core.amount;
                }
            })?;
        }
        Ok(())
    }

    /// The open order of one account with the given user-scoped id
    pub(crate) fn find_order(&self, owner: &AccountName, orderid: u32) -> Option<u64> {
        self.ledger
            .limit_orders()
            .find(|o| o.seller == *owner && o.orderid == orderid)
            .map(|o| o.id)
    }

    /// Match a fresh order against the book by price-time priority.
    /// Returns true when the order left the book (fully filled).
    pub(crate) fn apply_order(&mut self, order_id: u64) -> ChainResult<bool> {
        loop {
            let order = match self.ledger.find_limit_order(&order_id) {
                Some(o) => o.clone(),
                None => return Ok(true),
            };
            let threshold = order.sell_price.invert();

            // best-priced maker first, oldest on ties
            let counter = self
                .ledger
                .limit_orders()
                .filter(|o| {
                    o.sell_price.base.symbol == threshold.base.symbol
                        && o.sell_price >= threshold
                })
                .min_by(|a, b| {
                    b.sell_price
                        .partial_cmp(&a.sell_price)
                        .expect("book orders share a pair")
                        .then(a.id.cmp(&b.id))
                })
                .map(|o| o.id);

            let counter_id = match counter {
                Some(id) => id,
                None => return Ok(false),
            };

            let finished = self.match_orders(order_id, counter_id)?;
            if finished {
                return Ok(self.ledger.find_limit_order(&order_id).is_none());
            }
        }
    }

    /// Cross two orders at the maker's price. Returns true when the taker
    /// side is finished (fully filled or removed).
    fn match_orders(&mut self, taker_id: u64, maker_id: u64) -> ChainResult<bool> {
        let taker = self.ledger.get_limit_order(&taker_id)?.clone();
        let maker = self.ledger.get_limit_order(&maker_id)?.clone();
        let match_price = maker.sell_price;

        let taker_for_sale = taker.amount_for_sale();
        let maker_for_sale = maker.amount_for_sale();

        let (taker_pays, taker_receives, maker_pays, maker_receives);
        let maker_capacity = maker_for_sale.convert(&match_price)?;
        if taker_for_sale <= maker_capacity {
            // maker absorbs the whole taker order
            maker_receives = taker_for_sale;
            taker_receives = taker_for_sale.convert(&match_price)?;
        } else {
            taker_receives = maker_for_sale;
            maker_receives = maker_for_sale.convert(&match_price)?;
        }
        taker_pays = maker_receives;
        maker_pays = taker_receives;

        // liquidity credit for volume in the reward window
        let age = self.head_block_time().secs_since(maker.created);
        if age >= self.config.min_liquidity_age_secs {
            if maker_receives.symbol == Symbol::Agr {
                self.adjust_liquidity_reward(&maker.seller, maker_receives, false)?;
                self.adjust_liquidity_reward(&taker.seller, maker_receives.negate(), false)?;
            } else {
                self.adjust_liquidity_reward(&maker.seller, taker_receives, true)?;
                self.adjust_liquidity_reward(&taker.seller, taker_receives.negate(), true)?;
            }
        }

        self.push_virtual_operation(VirtualOperation::FillOrder {
            current_owner: taker.seller.clone(),
            current_orderid: taker.orderid,
            current_pays: taker_pays,
            open_owner: maker.seller.clone(),
            open_orderid: maker.orderid,
            open_pays: maker_pays,
        });

        let taker_done = self.fill_order(taker_id, taker_pays, taker_receives)?;
        let maker_done = self.fill_order(maker_id, maker_pays, maker_receives)?;

        if !taker_done && !maker_done {
            return Err(ChainError::Consistency(
                "order match settled neither side".into(),
            ));
        }
        Ok(taker_done)
    }

    /// Settle one side of a match. Returns true when the order is gone.
    fn fill_order(&mut self, order_id: u64, pays: Asset, receives: Asset) -> ChainResult<bool> {
        let order = self.ledger.get_limit_order(&order_id)?.clone();
        if pays.symbol != order.sell_price.base.symbol {
            return Err(ChainError::Consistency(
                "order pays in the wrong asset".into(),
            ));
        }

        self.adjust_balance(&order.seller, receives)?;

        if pays == order.amount_for_sale() {
            self.ledger.remove_limit_order(&order_id)?;
            return Ok(true);
        }

        self.ledger
            .modify_limit_order(&order_id, |o| o.for_sale -= pays.amount)?;

        // a remainder too small to buy anything is refunded rather than
        // left to clutter the book
        let leftover = self.ledger.get_limit_order(&order_id)?;
        if leftover.amount_to_receive()?.amount == 0 {
            self.cancel_order(order_id)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Refund and remove an open order
    pub(crate) fn cancel_order(&mut self, order_id: u64) -> ChainResult<()> {
        let order = self.ledger.get_limit_order(&order_id)?.clone();
        self.ledger.remove_limit_order(&order_id)?;
        self.adjust_balance(&order.seller, order.amount_for_sale())
    }

    /// Roll trade volume into the account's liquidity-reward standing
    fn adjust_liquidity_reward(
        &mut self,
        owner: &AccountName,
        volume: Asset,
        is_debt: bool,
    ) -> ChainResult<()> {
        let now = self.head_block_time();
        let timeout = self.config.liquidity_timeout_secs;

        if self.ledger.find_liquidity_reward(owner).is_none() {
            self.ledger.create_liquidity_reward(
                owner.clone(),
                LiquidityRewardBalance {
                    owner: owner.clone(),
                    coin_volume: 0,
                    debt_volume: 0,
                    weight: 0,
                    last_update: now,
                },
            )?;
        }

        self.ledger.modify_liquidity_reward(owner, |l| {
            if now.secs_since(l.last_update) >= timeout {
                l.coin_volume = 0;
                l.debt_volume = 0;
                l.weight = 0;
            }
            if is_debt {
                l.debt_volume += volume.amount;
            } else {
                l.coin_volume += volume.amount;
            }
            l.update_weight();
            l.last_update = now;
        })
    }
}
