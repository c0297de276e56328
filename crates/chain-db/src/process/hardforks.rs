// chain-db/src/process/hardforks.rs

use crate::config::hardforks;
use crate::{ChainError, ChainResult, Database};
use chain_core::VirtualOperation;
use tracing::info;

impl Database {
    /// Apply every hardfork whose producer-voted version and activation
    /// time have been reached, in strictly increasing order.
    ///
    /// Idempotence comes from the monotonically increasing `last_hardfork`
    /// counter: a migration runs exactly once per chain history.
    pub(crate) fn process_hardforks(&mut self) -> ChainResult<()> {
        loop {
            let state = self.ledger.hardforks()?;
            let last = state.last_hardfork;
            let reached_version = self.hardfork_schedule.version(last)? < state.next_hardfork;
            let reached_time = state.next_hardfork_time <= self.head_block_time();

            if !(reached_version && reached_time) {
                return Ok(());
            }
            if last >= self.hardfork_schedule.num_hardforks() {
                return Err(ChainError::UnknownHardfork(last + 1));
            }
            self.apply_hardfork(last + 1)?;
        }
    }

    fn apply_hardfork(&mut self, n: u32) -> ChainResult<()> {
        info!("applying hardfork {} at block {}", n, self.head_block_num());

        // one-time migration actions, registered per version
        match n {
            hardforks::LINEAR_CURVE => {
                // the rotation restarts from a clean lap under the new rules
                consensus::schedule::reset_virtual_schedule_time(&mut self.ledger)?;
            }
            hardforks::VOTE_RETALLY => {
                self.retally_witness_vote_counts()?;
            }
            _ => {
                // a rules-only transition with no data migration
            }
        }

        let version = self.hardfork_schedule.version(n)?;
        let now = self.head_block_time();
        self.ledger.modify_hardforks(|h| {
            h.processed_hardforks.push(now);
            h.last_hardfork = n;
            h.current_version = version;
        })?;

        self.push_virtual_operation(VirtualOperation::Hardfork { version });
        Ok(())
    }

    /// Recount every account's witness-approval counter from the actual
    /// vote edges
    fn retally_witness_vote_counts(&mut self) -> ChainResult<()> {
        let names: Vec<_> = self.ledger.accounts().map(|a| a.name.clone()).collect();
        for name in names {
            let actual = self.ledger.witness_votes_by(&name).len() as u16;
            if self.ledger.get_account(&name)?.witnesses_voted_for != actual {
                self.ledger
                    .modify_account(&name, |a| a.witnesses_voted_for = actual)?;
            }
        }
        Ok(())
    }
}
