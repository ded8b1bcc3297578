//! Fee retention on unstake.
//!
//! A fee policy decides how much of an earned reward reaches the staker and
//! how much stays in custody for the operator, based on how long the stake
//! was held.

use serde::{Deserialize, Serialize};
use sttk_types::{Amount, BasisPoints, SECS_PER_DAY};

/// A reward divided into the part paid out and the part retained.
///
/// `payout + fee` always equals the reward that was split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub payout: Amount,
    pub fee: Amount,
}

impl FeeSplit {
    pub fn all_paid(reward: Amount) -> Self {
        Self {
            payout: reward,
            fee: 0,
        }
    }
}

/// `(reward, holding duration) -> (payout, fee)`.
pub trait FeePolicy {
    fn split(&self, reward: Amount, held_secs: u64) -> FeeSplit;
}

/// Fee policies selectable from configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeePolicyConfig {
    /// Stakes held for less than `window_secs` give up `fee_bps` of their reward.
    EarlyExit {
        window_secs: u64,
        fee_bps: BasisPoints,
    },
    /// The whole reward is always paid.
    None,
}

impl FeePolicyConfig {
    pub const DEFAULT_WINDOW_SECS: u64 = 60 * SECS_PER_DAY;
    pub const DEFAULT_FEE_BPS: BasisPoints = BasisPoints::new(4000);
}

impl Default for FeePolicyConfig {
    fn default() -> Self {
        Self::EarlyExit {
            window_secs: Self::DEFAULT_WINDOW_SECS,
            fee_bps: Self::DEFAULT_FEE_BPS,
        }
    }
}

impl FeePolicy for FeePolicyConfig {
    fn split(&self, reward: Amount, held_secs: u64) -> FeeSplit {
        match self {
            Self::EarlyExit {
                window_secs,
                fee_bps,
            } if held_secs < *window_secs => {
                // fee_bps is validated to be <= 100%, so the share never exceeds the reward
                let fee = fee_bps.apply(reward).unwrap_or(reward).min(reward);
                FeeSplit {
                    payout: reward - fee,
                    fee,
                }
            }
            _ => FeeSplit::all_paid(reward),
        }
    }
}
