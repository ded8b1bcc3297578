//! Reward periods and the registry holding the live one.

use crate::error::PeriodParamError;
use serde::{Deserialize, Serialize};
use sttk_types::{Amount, BasisPoints, Timestamp};

/// A funded reward window.
///
/// Pool accounting: `consumed` (paid to stakers), `retained` (kept as fees)
/// and `released` (returned to the operator) only ever grow, and their sum
/// never exceeds `total_rewards`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPeriod {
    pub start: Timestamp,
    pub finish: Timestamp,
    pub total_rewards: Amount,
    pub annual_rate: BasisPoints,
    pub consumed: Amount,
    #[serde(default)]
    pub retained: Amount,
    #[serde(default)]
    pub released: Amount,
}

impl RewardPeriod {
    pub fn new(
        start: Timestamp,
        finish: Timestamp,
        total_rewards: Amount,
        annual_rate: BasisPoints,
    ) -> Self {
        Self {
            start,
            finish,
            total_rewards,
            annual_rate,
            consumed: 0,
            retained: 0,
            released: 0,
        }
    }

    /// Whether `now` lies inside `[start, finish]` (both ends inclusive).
    pub fn contains(&self, now: Timestamp) -> bool {
        self.start <= now && now <= self.finish
    }

    /// Whether the window has fully elapsed at `now`.
    pub fn has_elapsed(&self, now: Timestamp) -> bool {
        now >= self.finish
    }

    /// Window length in seconds.
    pub fn duration_secs(&self) -> u64 {
        self.start.elapsed_since(self.finish)
    }

    /// Pool not yet paid out, retained or released.
    pub fn remaining(&self) -> Amount {
        self.total_rewards
            .saturating_sub(self.consumed)
            .saturating_sub(self.retained)
            .saturating_sub(self.released)
    }
}

/// Check the caller-supplied parameters of a new period in isolation.
pub fn validate_period_params(
    start: Timestamp,
    finish: Timestamp,
    total_rewards: Amount,
    rate: BasisPoints,
    ceiling: BasisPoints,
) -> Result<(), PeriodParamError> {
    if total_rewards == 0 {
        return Err(PeriodParamError::ZeroRewards);
    }
    if rate.is_zero() || rate > ceiling {
        return Err(PeriodParamError::RateOutOfRange { rate, ceiling });
    }
    if start >= finish {
        return Err(PeriodParamError::InvertedWindow { start, finish });
    }
    Ok(())
}

/// Holds the single live reward period.
///
/// Replaced periods are archived in installation order for auditing; they
/// take no further part in accounting.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RewardPeriodRegistry {
    current: Option<RewardPeriod>,
    archive: Vec<RewardPeriod>,
}

impl RewardPeriodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&RewardPeriod> {
        self.current.as_ref()
    }

    pub(crate) fn current_mut(&mut self) -> Option<&mut RewardPeriod> {
        self.current.as_mut()
    }

    pub fn archive(&self) -> &[RewardPeriod] {
        &self.archive
    }

    /// Make `period` the live one, archiving its predecessor.
    pub(crate) fn install(&mut self, period: RewardPeriod) {
        if let Some(previous) = self.current.replace(period) {
            self.archive.push(previous);
        }
    }
}
