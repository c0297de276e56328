// chain-db/src/bandwidth.rs

use crate::{Database, ChainError, ChainResult};
use chain_core::{AccountBandwidth, AccountName, BandwidthType};

impl Database {
    /// Fold a transaction's size into the account's decaying average for
    /// one traffic class, and enforce the stake-proportional quota.
    ///
    /// The quota check only rejects while speculatively applying pushed
    /// transactions; transactions already sealed into a block were the
    /// producer's responsibility to police.
    pub(crate) fn update_account_bandwidth(
        &mut self,
        name: &AccountName,
        trx_size: u64,
        class: BandwidthType,
    ) -> ChainResult<()> {
        let globals = self.ledger.globals()?;
        if globals.total_vesting_shares.amount <= 0 {
            return Ok(());
        }
        let total_vshares = globals.total_vesting_shares.amount as u128;
        let max_virtual_bandwidth = globals.max_virtual_bandwidth;
        let now = self.head_block_time();
        let window = self.config.bandwidth_average_window_secs;

        let key = (name.clone(), class);
        if self.ledger.find_bandwidth(&key).is_none() {
            self.ledger
                .create_bandwidth(key.clone(), AccountBandwidth::new(name.clone(), class))?;
        }

        let trx_bandwidth = trx_size as u128 * self.config.bandwidth_precision as u128;
        let mut new_average = 0u128;
        {
            let band = self.ledger.get_bandwidth(&key)?;
            let delta = now.secs_since(band.last_bandwidth_update);
            if delta < window {
                new_average =
                    ((window - delta) as u128 * band.average_bandwidth) / window as u128;
            }
        }
        new_average += trx_bandwidth;

        self.ledger.modify_bandwidth(&key, |b| {
            b.average_bandwidth = new_average;
            b.lifetime_bandwidth += trx_bandwidth;
            b.last_bandwidth_update = now;
        })?;

        let account_vshares = self.ledger.get_account(name)?.effective_vesting_shares();
        let account_vshares = account_vshares.max(0) as u128;

        // the account's stake share of network capacity must cover its
        // decayed average
        let has_bandwidth = account_vshares.saturating_mul(max_virtual_bandwidth)
            > new_average.saturating_mul(total_vshares);

        if self.producing && !has_bandwidth {
            return Err(ChainError::BandwidthExceeded);
        }
        Ok(())
    }
}
