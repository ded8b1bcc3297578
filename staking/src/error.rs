//! Staking-specific errors.
//!
//! Every error is a rejected call: the engine state and the ledger are left
//! exactly as they were before the call.

use sttk_token::TokenError;
use sttk_types::{AccountId, Amount, BasisPoints, Timestamp};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakingError {
    #[error("caller {caller} is not the operator")]
    Unauthorized { caller: AccountId },

    #[error("account {account} is the engine custody account")]
    CustodyAccount { account: AccountId },

    #[error("invalid reward period: {0}")]
    InvalidPeriodParameters(PeriodParamError),

    #[error("cannot open a new reward period: {0}")]
    PeriodNotElapsed(PeriodGate),

    #[error("stake outside the reward window: {0}")]
    OutOfWindow(WindowViolation),

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("cannot stake more than owned: need {needed}, available {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    #[error("account already has an active stake")]
    AlreadyStaked,

    #[error("cooldown period is not finished, next action allowed at {ready_at}")]
    CooldownNotElapsed { ready_at: Timestamp },

    #[error("available rewards are exhausted: need {needed}, available {available}")]
    PoolExhausted { needed: Amount, available: Amount },

    #[error("account has no active stake")]
    NotAStaker,

    #[error("engine has no tokens to withdraw")]
    NothingToWithdraw,

    #[error("arithmetic overflow in staking computation")]
    Overflow,

    #[error("invalid staking configuration: {0}")]
    Config(String),

    #[error("ledger rejected transfer: {0}")]
    Ledger(#[from] TokenError),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// Why a reward period's parameters were rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodParamError {
    #[error("rewards amount should be more than zero")]
    ZeroRewards,

    #[error("rate {rate} must be within (0, {ceiling}]")]
    RateOutOfRange {
        rate: BasisPoints,
        ceiling: BasisPoints,
    },

    #[error("not a correct time interval: start {start} must precede finish {finish}")]
    InvertedWindow { start: Timestamp, finish: Timestamp },

    #[error("window start {start} is before the current time {now}")]
    WindowInPast { start: Timestamp, now: Timestamp },
}

/// Why the registered period cannot be replaced yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodGate {
    #[error("previous period is not finished until {finish}")]
    StillOpen { finish: Timestamp },

    #[error("{count} stake(s) from the previous period are still active")]
    OutstandingStakers { count: usize },
}

/// Which side of the reward window a stake fell on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowViolation {
    #[error("too early, window opens at {start}")]
    TooEarly { start: Timestamp },

    #[error("too late, window closed at {finish}")]
    TooLate { finish: Timestamp },
}
