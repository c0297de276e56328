// chain-db/src/process/feed.rs

use crate::{ChainResult, Database};
use chain_core::Price;
use tokenomics::{clamp_to_floor, market_cap_floor, median_price};
use tracing::debug;

impl Database {
    /// Fold the scheduled producers' published prices into the rolling
    /// median window. Runs once per feed interval; requires a quorum of
    /// fresh feeds; the window median is clamped to the market-cap floor.
    pub(crate) fn update_median_feed(&mut self) -> ChainResult<()> {
        if self.head_block_num() % self.config.feed_interval_blocks != 0 {
            return Ok(());
        }

        let now = self.head_block_time();
        let max_age = self.config.max_feed_age_secs;

        let schedule = self.ledger.schedule()?;
        let mut feeds: Vec<Price> = Vec::with_capacity(schedule.num_scheduled_witnesses as usize);
        for name in &schedule.current_shuffled_witnesses {
            let witness = self.ledger.get_witness(name)?;
            if let Some(rate) = witness.exchange_rate {
                if now.secs_since(witness.last_exchange_update) < max_age {
                    feeds.push(rate);
                }
            }
        }

        if feeds.len() < self.config.min_feeds {
            return Ok(());
        }
        let round_median = match median_price(&feeds) {
            Some(m) => m,
            None => return Ok(()),
        };

        let window = self.config.feed_history_window;
        let globals = self.ledger.globals()?;
        let floor = market_cap_floor(globals.current_debt_supply, globals.current_supply);

        let mut forced = false;
        self.ledger.modify_feed_history(|fh| {
            fh.price_history.push_back(round_median);
            while fh.price_history.len() > window {
                fh.price_history.pop_front();
            }

            let history: Vec<Price> = fh.price_history.iter().copied().collect();
            if let Some(window_median) = median_price(&history) {
                let (governing, was_forced) = clamp_to_floor(window_median, floor);
                fh.current_median = Some(governing);
                forced = was_forced;
            }
        })?;

        if forced {
            debug!("median price pinned to the market-cap floor");
        }
        self.ledger
            .modify_globals(|g| g.is_forced_min_price = forced)
    }
}
