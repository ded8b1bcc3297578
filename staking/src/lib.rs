//! Staking rewards engine for the STTK token.
//!
//! An operator funds a single reward period `[start, finish]` with a fixed
//! pool and an annual rate in basis points. Accounts stake while the window
//! is open and later unstake, receiving principal plus a reward that is
//! linear in the time spent inside the window:
//!
//! `reward = amount × rate_bps × secs / (10_000 × year_secs)`
//!
//! The worst-case reward of every stake is reserved from the pool when the
//! stake is made, so payouts can never exceed the funded pool.
//!
//! This crate handles:
//! - Reward period validation and replacement (`period`)
//! - Per-account stake records (`stake`)
//! - Pure reward computation (`accrual`) and fee splitting (`fee`)
//! - The serialized state machine tying them together (`engine`, `shared`)

pub mod accrual;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod fee;
pub mod period;
pub mod shared;
pub mod stake;

pub use config::{RestakePolicy, StakingConfig, MAX_COOLDOWN_SECS};
pub use engine::{StakingEngine, UnstakeReceipt, WithdrawalReceipt};
pub use error::{PeriodGate, PeriodParamError, StakingError, WindowViolation};
pub use events::{EventBus, StakingEvent};
pub use fee::{FeePolicy, FeePolicyConfig, FeeSplit};
pub use period::{RewardPeriod, RewardPeriodRegistry};
pub use shared::SharedStaking;
pub use stake::{StakeLedger, StakeRecord};
