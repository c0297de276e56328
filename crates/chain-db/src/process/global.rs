// chain-db/src/process/global.rs

use crate::{ChainError, ChainResult, Database, SkipFlags};
use chain_core::{SignedBlock, Timestamp, VirtualOperation};
use chain_crypto::PublicKey;
use tracing::debug;

impl Database {
    /// Head metadata, missed-slot accounting, participation bitmap and the
    /// adaptive bandwidth reserve ratio
    pub(crate) fn update_global_dynamic_data(
        &mut self,
        block: &SignedBlock,
        skip: SkipFlags,
    ) -> ChainResult<()> {
        let block_size = block.serialized_size() as u32;

        let mut missed_blocks = 0u64;
        if self.head_block_time() != Timestamp::ZERO {
            missed_blocks = self.get_slot_at_time(block.header.timestamp).saturating_sub(1);

            // every skipped slot is a miss for its scheduled producer
            for i in 0..missed_blocks {
                let missed_producer = self.get_scheduled_producer(i + 1)?;
                if missed_producer == block.header.producer {
                    continue;
                }
                let head_num = self.head_block_num();
                let shutdown_after = self.config.producer_shutdown_blocks;
                let mut shut_down = false;
                self.ledger.modify_witness(&missed_producer, |w| {
                    w.total_missed += 1;
                    // a producer silent for a whole day is shut down so the
                    // schedule stops waiting on it
                    if head_num.saturating_sub(w.last_confirmed_block_num) > shutdown_after {
                        w.signing_key = PublicKey::empty();
                        shut_down = true;
                    }
                })?;
                if shut_down {
                    self.push_virtual_operation(VirtualOperation::ShutdownWitness {
                        witness: missed_producer,
                    });
                }
            }
        }

        let max_reserve_ratio = self.config.max_reserve_ratio;
        let bandwidth_precision = self.config.bandwidth_precision;
        let bandwidth_window = self.config.bandwidth_average_window_secs;
        let block_interval = self.config.block_interval_secs;

        self.ledger.modify_globals(|g| {
            // slide the participation window one bit per slot
            for i in 0..missed_blocks + 1 {
                let produced = i == missed_blocks;
                if g.recent_slots_filled & (1u128 << 127) != 0 {
                    g.participation_count -= 1;
                }
                g.recent_slots_filled = (g.recent_slots_filled << 1) | produced as u128;
                if produced {
                    g.participation_count += 1;
                }
            }

            g.head_block_number = block.header.number;
            g.head_block_id = block.id();
            g.time = block.header.timestamp;
            g.current_aslot += missed_blocks + 1;
            g.average_block_size = (99 * g.average_block_size + block_size) / 100;

            // Once per minute the average use adjusts the reserve ratio:
            // above a quarter of capacity the ratio halves, otherwise it
            // creeps back up linearly.
            if g.head_block_number % 20 == 0 {
                if g.average_block_size > g.maximum_block_size / 4 {
                    g.current_reserve_ratio /= 2;
                } else {
                    g.current_reserve_ratio += 1;
                }
                if g.current_reserve_ratio > max_reserve_ratio {
                    g.current_reserve_ratio = max_reserve_ratio;
                }
            }
            if g.current_reserve_ratio < 1 {
                g.current_reserve_ratio = 1;
            }

            g.max_virtual_bandwidth = g.maximum_block_size as u128
                * g.current_reserve_ratio as u128
                * bandwidth_precision as u128
                * bandwidth_window as u128
                / block_interval as u128;
        })?;

        if !skip.contains(SkipFlags::UNDO_HISTORY_CHECK) {
            let globals = self.ledger.globals()?;
            if globals.head_block_number - globals.last_irreversible_block_num
                >= self.config.max_undo_history
            {
                return Err(ChainError::UndoHistoryExhausted {
                    head: globals.head_block_number,
                    irreversible: globals.last_irreversible_block_num,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn update_signing_witness(&mut self, block: &SignedBlock) -> ChainResult<()> {
        let aslot = self.ledger.globals()?.current_aslot;
        let number = block.header.number;
        self.ledger.modify_witness(&block.header.producer, |w| {
            w.last_aslot = aslot;
            w.last_confirmed_block_num = number;
        })
    }

    /// Advance the irreversibility watermark to the height a threshold of
    /// scheduled producers have confirmed, then commit the undo frames
    /// beneath it.
    pub(crate) fn update_last_irreversible_block(&mut self, _skip: SkipFlags) -> ChainResult<()> {
        let schedule = self.ledger.schedule()?;
        let mut confirmed: Vec<u64> = Vec::with_capacity(schedule.num_scheduled_witnesses as usize);
        for name in &schedule.current_shuffled_witnesses {
            confirmed.push(self.ledger.get_witness(name)?.last_confirmed_block_num);
        }
        if confirmed.is_empty() {
            return Ok(());
        }
        confirmed.sort_unstable();

        // the height at the (1 - threshold) quantile: that many producers
        // may lag without stalling irreversibility
        let offset = ((chain_core::PERCENT_100 - self.config.irreversible_threshold_bps)
            as usize
            * confirmed.len())
            / chain_core::PERCENT_100 as usize;
        let new_lib = confirmed[offset];

        let old_lib = self.ledger.globals()?.last_irreversible_block_num;
        if new_lib > old_lib {
            debug!("irreversible block advances to {}", new_lib);
            self.ledger
                .modify_globals(|g| g.last_irreversible_block_num = new_lib)?;
            self.commit_irreversible(new_lib);
        }
        Ok(())
    }

    /// Virtual supply is the core supply plus the debt supply valued at the
    /// median; the debt print rate throttles as debt approaches its share
    /// of market cap.
    pub(crate) fn update_virtual_supply(&mut self) -> ChainResult<()> {
        let median = self.ledger.feed_history()?.current_median;
        let start = self.config.debt_start_percent;
        let stop = self.config.debt_stop_percent;

        self.ledger.modify_globals(|g| {
            let debt_in_core = median
                .and_then(|m| g.current_debt_supply.convert(&m).ok())
                .map(|a| a.amount)
                .unwrap_or(0);
            g.virtual_supply.amount = g.current_supply.amount + debt_in_core;

            if median.is_some() && g.virtual_supply.amount > 0 {
                let percent_debt = ((debt_in_core as i128
                    * chain_core::PERCENT_100 as i128)
                    / g.virtual_supply.amount as i128) as u16;

                g.debt_print_rate = if percent_debt <= start {
                    chain_core::PERCENT_100
                } else if percent_debt >= stop {
                    0
                } else {
                    ((stop - percent_debt) as u32 * chain_core::PERCENT_100 as u32
                        / (stop - start) as u32) as u16
                };
            }
        })
    }
}
