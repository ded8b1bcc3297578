//! Reward accrual as pure functions of (stake, period, time).
//!
//! Reward is linear in the seconds a stake spends inside the reward window:
//!
//! `reward = amount × rate_bps × secs / (10_000 × year_secs)`
//!
//! rounded down. All arithmetic is checked integer math on u128.

use crate::error::StakingError;
use crate::period::RewardPeriod;
use sttk_types::{Amount, Timestamp, BPS_DENOMINATOR};

/// The part of `[staked_at, now]` that falls inside the period window.
///
/// `None` when the two do not overlap: the stake was made at or after the
/// window closed, or `now` is at or before the window opened.
pub fn accrual_window(
    staked_at: Timestamp,
    period: &RewardPeriod,
    now: Timestamp,
) -> Option<(Timestamp, Timestamp)> {
    let effective_start = staked_at.max(period.start);
    let effective_end = now.min(period.finish);
    if effective_end <= effective_start {
        return None;
    }
    Some((effective_start, effective_end))
}

/// Reward for holding `amount` over `secs` seconds at the period's rate.
pub fn reward_for_duration(
    amount: Amount,
    period: &RewardPeriod,
    secs: u64,
    year_secs: u64,
) -> Result<Amount, StakingError> {
    if year_secs == 0 {
        return Err(StakingError::Config("year_secs must be positive".into()));
    }
    let numerator = amount
        .checked_mul(period.annual_rate.raw() as u128)
        .and_then(|v| v.checked_mul(secs as u128))
        .ok_or(StakingError::Overflow)?;
    let denominator = (BPS_DENOMINATOR as u128) * (year_secs as u128);
    Ok(numerator / denominator)
}

/// Reward accrued by a stake of `amount` made at `staked_at`, evaluated at `now`.
pub fn accrued_reward(
    amount: Amount,
    staked_at: Timestamp,
    period: &RewardPeriod,
    now: Timestamp,
    year_secs: u64,
) -> Result<Amount, StakingError> {
    match accrual_window(staked_at, period, now) {
        Some((start, end)) => {
            reward_for_duration(amount, period, start.elapsed_since(end), year_secs)
        }
        None => Ok(0),
    }
}

/// The most a stake made at `from` can ever earn: accrual until `finish`.
///
/// Monotone in the accrual window, so any `accrued_reward` for the same
/// stake is bounded by it.
pub fn max_reward(
    amount: Amount,
    from: Timestamp,
    period: &RewardPeriod,
    year_secs: u64,
) -> Result<Amount, StakingError> {
    accrued_reward(amount, from, period, period.finish, year_secs)
}
