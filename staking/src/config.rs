//! Engine configuration with TOML file support.

use serde::{Deserialize, Serialize};
use sttk_types::{BasisPoints, BPS_DENOMINATOR, SECS_PER_DAY, SECS_PER_YEAR};

use crate::error::StakingError;
use crate::fee::FeePolicyConfig;

/// Longest cooldown a configuration may ask for.
pub const MAX_COOLDOWN_SECS: u64 = 25 * SECS_PER_DAY;

/// What happens when an account with an active stake stakes again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestakePolicy {
    /// Top-ups are allowed once the cooldown since the last stake action has
    /// elapsed. The accrual clock restarts for the whole balance.
    #[default]
    TopUpAfterCooldown,
    /// One stake per account until it unstakes.
    Reject,
}

/// Configuration for a [`StakingEngine`](crate::StakingEngine).
///
/// Can be loaded from a TOML file via [`StakingConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingConfig {
    /// Highest annual rate a reward period may carry (basis points).
    #[serde(default = "default_rate_ceiling")]
    pub rate_ceiling: BasisPoints,

    /// Minimum holding time before a stake earns reward or may be topped up.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Behaviour of a second `stake` call on an active record.
    #[serde(default)]
    pub restake_policy: RestakePolicy,

    /// Length of the year that annual rates refer to.
    #[serde(default = "default_year_secs")]
    pub year_secs: u64,

    /// Fee retained from rewards on unstake.
    #[serde(default)]
    pub fee_policy: FeePolicyConfig,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_rate_ceiling() -> BasisPoints {
    BasisPoints::new(1000)
}

fn default_cooldown_secs() -> u64 {
    7 * SECS_PER_DAY
}

fn default_year_secs() -> u64 {
    SECS_PER_YEAR
}

// ── Impl ───────────────────────────────────────────────────────────────

impl StakingConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, StakingError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| StakingError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, StakingError> {
        let config: Self = toml::from_str(s).map_err(|e| StakingError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, StakingError> {
        toml::to_string_pretty(self).map_err(|e| StakingError::Config(e.to_string()))
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), StakingError> {
        if self.rate_ceiling.is_zero() {
            return Err(StakingError::Config("rate_ceiling must be positive".into()));
        }
        if self.year_secs == 0 {
            return Err(StakingError::Config("year_secs must be positive".into()));
        }
        if self.cooldown_secs > MAX_COOLDOWN_SECS {
            return Err(StakingError::Config(format!(
                "cooldown_secs {} exceeds {MAX_COOLDOWN_SECS}",
                self.cooldown_secs
            )));
        }
        if let FeePolicyConfig::EarlyExit { fee_bps, .. } = &self.fee_policy {
            if fee_bps.raw() > BPS_DENOMINATOR {
                return Err(StakingError::Config(format!(
                    "fee_bps {} exceeds {BPS_DENOMINATOR}",
                    fee_bps.raw()
                )));
            }
        }
        Ok(())
    }
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            rate_ceiling: default_rate_ceiling(),
            cooldown_secs: default_cooldown_secs(),
            restake_policy: RestakePolicy::default(),
            year_secs: default_year_secs(),
            fee_policy: FeePolicyConfig::default(),
        }
    }
}
