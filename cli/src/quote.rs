//! Reward quotes without touching any ledger.

use anyhow::{ensure, Result};
use serde::Serialize;
use sttk_staking::accrual::accrued_reward;
use sttk_staking::{FeePolicy, RewardPeriod, StakingConfig};
use sttk_types::{Amount, BasisPoints, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub amount: Amount,
    pub rate: BasisPoints,
    pub window_days: u64,
    pub held_days: u64,
    /// Reward before fees; zero when held for less than the cooldown.
    pub reward: Amount,
    pub payout: Amount,
    pub fee: Amount,
}

/// What a stake of `amount` made when the window opens earns after
/// `held_days`, under `config`.
pub fn quote(
    config: &StakingConfig,
    amount: Amount,
    rate: BasisPoints,
    window_days: u64,
    held_days: u64,
) -> Result<Quote> {
    ensure!(window_days > 0, "window must be at least one day long");
    ensure!(
        !rate.is_zero() && rate <= config.rate_ceiling,
        "rate {rate} outside (0, {}]",
        config.rate_ceiling
    );

    let start = Timestamp::EPOCH;
    let period = RewardPeriod::new(start, start.plus_days(window_days), Amount::MAX, rate);
    let now = start.plus_days(held_days);
    let reward = if start.has_expired(config.cooldown_secs, now) {
        accrued_reward(amount, start, &period, now, config.year_secs)?
    } else {
        0
    };
    let split = config.fee_policy.split(reward, start.elapsed_since(now));

    Ok(Quote {
        amount,
        rate,
        window_days,
        held_days,
        reward,
        payout: split.payout,
        fee: split.fee,
    })
}
