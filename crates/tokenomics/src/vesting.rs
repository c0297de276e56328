// tokenomics/src/vesting.rs

use chain_core::PERCENT_100;

/// Stake due in one withdrawal step.
///
/// The final step pays the remainder `to_withdraw % rate` so the total
/// released never exceeds what was requested; both are capped by the stake
/// actually held.
pub fn withdraw_amount_due(
    vesting_shares: i64,
    withdraw_rate: i64,
    withdrawn: i64,
    to_withdraw: i64,
) -> i64 {
    if withdraw_rate <= 0 {
        return 0;
    }
    let due = if to_withdraw - withdrawn < withdraw_rate {
        vesting_shares.min(to_withdraw % withdraw_rate)
    } else {
        vesting_shares.min(withdraw_rate)
    };
    due.max(0)
}

/// Portion of a withdrawal step owed to one routed destination
pub fn route_share(to_withdraw: i64, percent: u16) -> i64 {
    ((to_withdraw.max(0) as u128 * percent as u128) / PERCENT_100 as u128) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_step() {
        // plenty of stake, mid-schedule
        assert_eq!(withdraw_amount_due(10_000, 100, 200, 1_300), 100);
    }

    #[test]
    fn test_final_partial_step() {
        // 1300 requested at rate 100: the 14th step pays the 0 remainder;
        // a request of 1350 pays 50 on its last step
        assert_eq!(withdraw_amount_due(10_000, 100, 1_300, 1_350), 50);
    }

    #[test]
    fn test_capped_by_held_stake() {
        assert_eq!(withdraw_amount_due(30, 100, 0, 1_000), 30);
    }

    #[test]
    fn test_zero_rate_is_idle() {
        assert_eq!(withdraw_amount_due(10_000, 0, 0, 0), 0);
    }

    #[test]
    fn test_route_share() {
        assert_eq!(route_share(1_000, PERCENT_100 / 4), 250);
        assert_eq!(route_share(1_000, 0), 0);
        assert_eq!(route_share(1_000, PERCENT_100), 1_000);
    }
}
