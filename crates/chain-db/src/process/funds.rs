// chain-db/src/process/funds.rs

use crate::{ChainResult, Database};
use chain_core::{Asset, ScheduleClass, VirtualOperation};
use tokenomics::emission_split;
use tracing::warn;

impl Database {
    /// Mint the block's emission: the content pool and the stake fund grow,
    /// and the signing producer is paid in stake, weighted by its schedule
    /// class.
    pub(crate) fn process_funds(&mut self) -> ChainResult<()> {
        let globals = self.ledger.globals()?;
        let schedule = self.ledger.schedule()?;
        let producer_name = globals.current_witness.clone();
        let producer = self.ledger.get_witness(&producer_name)?;

        let class_weight = match producer.schedule {
            ScheduleClass::Top => schedule.top_weight,
            ScheduleClass::Timeshare => schedule.timeshare_weight,
            ScheduleClass::Pow => schedule.pow_weight,
            ScheduleClass::None => {
                warn!("producer {} has no schedule class", producer_name);
                schedule.top_weight
            }
        };

        let split = emission_split(
            globals.virtual_supply.amount,
            globals.head_block_number,
            class_weight,
            schedule.witness_pay_normalization_factor,
            &self.config.emission,
        )?;

        self.ledger.modify_globals(|g| {
            g.total_vesting_fund.amount += split.vesting_reward;
            g.total_reward_fund.amount += split.content_reward;
            g.current_supply.amount += split.new_supply;
            g.virtual_supply.amount += split.new_supply;
        })?;

        let producer_reward =
            self.create_vesting(&producer_name, Asset::agr(split.producer_reward))?;
        self.push_virtual_operation(VirtualOperation::ProducerReward {
            producer: producer_name,
            vesting_shares: producer_reward,
        });
        Ok(())
    }

    /// Hourly reward to the best-balanced market maker of the window
    pub(crate) fn pay_liquidity_reward(&mut self) -> ChainResult<()> {
        if self.head_block_num() % self.config.liquidity_reward_interval_blocks != 0 {
            return Ok(());
        }

        let reward = self.config.min_liquidity_reward;
        if reward.amount == 0 {
            return Ok(());
        }

        // best volume weight wins; ties go to the first owner in order
        let best = self
            .ledger
            .liquidity_rewards()
            .filter(|l| l.volume_weight() > 0)
            .max_by(|a, b| {
                a.volume_weight()
                    .cmp(&b.volume_weight())
                    .then_with(|| b.owner.cmp(&a.owner))
            })
            .map(|l| l.owner.clone());

        if let Some(owner) = best {
            let now = self.head_block_time();
            self.adjust_supply(reward)?;
            self.adjust_balance(&owner, reward)?;
            self.ledger.modify_liquidity_reward(&owner, |l| {
                l.coin_volume = 0;
                l.debt_volume = 0;
                l.weight = 0;
                l.last_update = now;
            })?;
            self.push_virtual_operation(VirtualOperation::LiquidityReward {
                owner,
                payout: reward,
            });
        }
        Ok(())
    }
}
