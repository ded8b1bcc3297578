//! Thread-safe handle serializing all engine calls.
//!
//! The engine and the ledger it moves tokens on sit behind one lock, so a
//! stake's balance check and its transfer can never interleave with another
//! caller's operation.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::engine::{StakingEngine, UnstakeReceipt, WithdrawalReceipt};
use crate::error::StakingError;
use crate::period::RewardPeriod;
use crate::stake::StakeRecord;
use sttk_token::BalanceLedger;
use sttk_types::{AccountId, Amount, BasisPoints, Timestamp};

struct Inner<L> {
    engine: StakingEngine,
    ledger: L,
}

/// Cloneable handle to a staking engine and its balance ledger.
pub struct SharedStaking<L> {
    inner: Arc<Mutex<Inner<L>>>,
}

impl<L> Clone for SharedStaking<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: BalanceLedger> SharedStaking<L> {
    pub fn new(engine: StakingEngine, ledger: L) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { engine, ledger })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<L>> {
        // Every operation commits only after its checks pass, so state
        // behind a poisoned lock is still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` with exclusive access to the engine and the ledger.
    pub fn with<R>(&self, f: impl FnOnce(&mut StakingEngine, &mut L) -> R) -> R {
        let mut guard = self.lock();
        let Inner { engine, ledger } = &mut *guard;
        f(engine, ledger)
    }

    pub fn set_reward_period(
        &self,
        caller: &AccountId,
        start: Timestamp,
        finish: Timestamp,
        total_rewards: Amount,
        rate: BasisPoints,
        now: Timestamp,
    ) -> Result<RewardPeriod, StakingError> {
        self.with(|engine, ledger| {
            engine.set_reward_period(caller, ledger, start, finish, total_rewards, rate, now)
        })
    }

    pub fn stake(
        &self,
        account: &AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<StakeRecord, StakingError> {
        self.with(|engine, ledger| engine.stake(account, ledger, amount, now))
    }

    pub fn unstake(&self, account: &AccountId, now: Timestamp) -> Result<UnstakeReceipt, StakingError> {
        self.with(|engine, ledger| engine.unstake(account, ledger, now))
    }

    pub fn withdraw_amounts(&self, caller: &AccountId) -> Result<WithdrawalReceipt, StakingError> {
        self.with(|engine, ledger| engine.withdraw_amounts(caller, ledger))
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.with(|_, ledger| ledger.balance_of(account))
    }

    pub fn stake_of(&self, account: &AccountId) -> Option<StakeRecord> {
        self.with(|engine, _| engine.stake_of(account).cloned())
    }

    pub fn reward_period(&self) -> Option<RewardPeriod> {
        self.with(|engine, _| engine.reward_period().cloned())
    }
}
