//! Core staking engine: reward period registry, stake state machine and
//! pool/fee reconciliation.
//!
//! Every operation validates first, then performs its single ledger
//! movement, then commits state. A rejected call leaves both the engine and
//! the ledger untouched.

use crate::accrual::{accrued_reward, max_reward};
use crate::config::{RestakePolicy, StakingConfig};
use crate::error::{PeriodGate, PeriodParamError, StakingError, WindowViolation};
use crate::events::{EventBus, StakingEvent};
use crate::fee::{FeePolicy, FeeSplit};
use crate::period::{validate_period_params, RewardPeriod, RewardPeriodRegistry};
use crate::stake::{StakeLedger, StakeRecord};
use serde::{Deserialize, Serialize};
use sttk_token::BalanceLedger;
use sttk_types::{AccountId, Amount, BasisPoints, Timestamp};
use sttk_utils::format_duration;
use tracing::{debug, info};

/// Version tag prepended to every snapshot.
const SNAPSHOT_VERSION: u8 = 1;

/// Outcome of a successful unstake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnstakeReceipt {
    pub principal: Amount,
    /// Reward actually paid to the account.
    pub reward: Amount,
    /// Reward retained in custody as fee.
    pub fee: Amount,
    /// `principal + reward`, the amount transferred back.
    pub total: Amount,
    pub held_secs: u64,
}

/// Outcome of a successful operator withdrawal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub amount: Amount,
    /// Part of `amount` that came from retained fees.
    pub fees: Amount,
}

/// Persistent state of the engine, everything except configuration and listeners.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct EngineState {
    operator: AccountId,
    custody: AccountId,
    registry: RewardPeriodRegistry,
    stakes: StakeLedger,
    retained_fees: Amount,
}

/// The staking engine.
///
/// Owns the reward period registry and the stake ledger. Token balances live
/// in a [`BalanceLedger`] passed into each mutating call; the engine holds
/// staked principal and reward pool under its `custody` account there.
pub struct StakingEngine {
    config: StakingConfig,
    state: EngineState,
    fee_policy: Box<dyn FeePolicy + Send + Sync>,
    events: EventBus,
}

impl StakingEngine {
    /// Create an engine with the default configuration.
    pub fn new(operator: AccountId, custody: AccountId) -> Result<Self, StakingError> {
        Self::with_config(StakingConfig::default(), operator, custody)
    }

    /// Create an engine with an explicit, validated configuration.
    ///
    /// The operator must not be the custody account: funding and
    /// withdrawals would become self-transfers.
    pub fn with_config(
        config: StakingConfig,
        operator: AccountId,
        custody: AccountId,
    ) -> Result<Self, StakingError> {
        config.validate()?;
        if operator == custody {
            return Err(StakingError::CustodyAccount { account: custody });
        }
        Ok(Self::build(config, operator, custody))
    }

    fn build(config: StakingConfig, operator: AccountId, custody: AccountId) -> Self {
        let fee_policy = Box::new(config.fee_policy.clone());
        Self {
            config,
            state: EngineState {
                operator,
                custody,
                registry: RewardPeriodRegistry::new(),
                stakes: StakeLedger::new(),
                retained_fees: 0,
            },
            fee_policy,
            events: EventBus::new(),
        }
    }

    /// Replace the configured fee policy with a custom one.
    #[cfg(test)]
    fn with_fee_policy(mut self, policy: impl FeePolicy + Send + Sync + 'static) -> Self {
        self.fee_policy = Box::new(policy);
        self
    }

    /// Register a listener for engine events.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&StakingEvent) + Send + Sync>) {
        self.events.subscribe(listener);
        debug!(listeners = self.events.listener_count(), "engine listener registered");
    }

    // ── Reward period registry ──────────────────────────────────────────

    /// Fund and install a new reward period. Operator only.
    ///
    /// Pulls `total_rewards` from the operator into custody; the operator
    /// must have approved the custody account beforehand.
    pub fn set_reward_period<L: BalanceLedger>(
        &mut self,
        caller: &AccountId,
        ledger: &mut L,
        start: Timestamp,
        finish: Timestamp,
        total_rewards: Amount,
        rate: BasisPoints,
        now: Timestamp,
    ) -> Result<RewardPeriod, StakingError> {
        self.ensure_operator(caller)?;
        validate_period_params(start, finish, total_rewards, rate, self.config.rate_ceiling)
            .map_err(StakingError::InvalidPeriodParameters)?;
        if let Some(current) = self.state.registry.current() {
            if !current.has_elapsed(now) {
                debug!(finish = %current.finish, %now, "reward period still open");
                return Err(StakingError::PeriodNotElapsed(PeriodGate::StillOpen {
                    finish: current.finish,
                }));
            }
        }
        let outstanding = self.state.stakes.active_count();
        if outstanding > 0 {
            debug!(outstanding, "stakes still active, refusing new period");
            return Err(StakingError::PeriodNotElapsed(
                PeriodGate::OutstandingStakers { count: outstanding },
            ));
        }
        if start < now {
            return Err(StakingError::InvalidPeriodParameters(
                PeriodParamError::WindowInPast { start, now },
            ));
        }

        let custody = self.state.custody.clone();
        ledger.transfer_from(&custody, caller, &custody, total_rewards)?;

        let period = RewardPeriod::new(start, finish, total_rewards, rate);
        self.state.registry.install(period.clone());
        info!(
            %start,
            %finish,
            total_rewards,
            rate = %rate,
            length = %format_duration(period.duration_secs()),
            "reward period created"
        );
        self.events.emit(&StakingEvent::RewardPeriodCreated {
            start,
            finish,
            total_rewards,
            annual_rate: rate,
        });
        Ok(period)
    }

    // ── Stake state machine ─────────────────────────────────────────────

    /// Stake `amount` from `account`, or top up an active stake.
    ///
    /// The tokens are pulled with `transfer_from`, so the account must have
    /// approved the custody account for at least `amount`.
    pub fn stake<L: BalanceLedger>(
        &mut self,
        account: &AccountId,
        ledger: &mut L,
        amount: Amount,
        now: Timestamp,
    ) -> Result<StakeRecord, StakingError> {
        if amount == 0 {
            return Err(StakingError::ZeroAmount);
        }
        if *account == self.state.custody {
            return Err(StakingError::CustodyAccount {
                account: account.clone(),
            });
        }
        let available = ledger.balance_of(account);
        if amount > available {
            return Err(StakingError::InsufficientBalance {
                needed: amount,
                available,
            });
        }

        let period = self.state.registry.current();
        if let Some(p) = period {
            if now < p.start {
                return Err(StakingError::OutOfWindow(WindowViolation::TooEarly {
                    start: p.start,
                }));
            }
            if now > p.finish {
                return Err(StakingError::OutOfWindow(WindowViolation::TooLate {
                    finish: p.finish,
                }));
            }
        }

        let existing = self.state.stakes.active(account);
        let top_up = existing.is_some();
        let (new_amount, previously_reserved) = match existing {
            Some(record) => {
                if self.config.restake_policy == RestakePolicy::Reject {
                    return Err(StakingError::AlreadyStaked);
                }
                let ready_at = record.cooldown_ready_at(self.config.cooldown_secs);
                if now < ready_at {
                    debug!(%account, %ready_at, "top-up before cooldown");
                    return Err(StakingError::CooldownNotElapsed { ready_at });
                }
                let combined = record
                    .amount
                    .checked_add(amount)
                    .ok_or(StakingError::Overflow)?;
                (combined, record.reserved)
            }
            None => (amount, 0),
        };

        // Reserve the worst case up front so that payouts can never
        // outrun the pool.
        let reservation = match period {
            Some(p) => {
                let needed = max_reward(new_amount, now, p, self.config.year_secs)?;
                let committed = self
                    .state
                    .stakes
                    .total_reserved()
                    .saturating_sub(previously_reserved);
                let available = p.remaining().saturating_sub(committed);
                if needed > available {
                    debug!(%account, needed, available, "reward pool exhausted");
                    return Err(StakingError::PoolExhausted { needed, available });
                }
                needed
            }
            None => 0,
        };

        let custody = self.state.custody.clone();
        ledger.transfer_from(&custody, account, &custody, amount)?;

        let record = StakeRecord::open(new_amount, now, reservation);
        self.state.stakes.upsert(account.clone(), record.clone());
        info!(
            %account,
            amount,
            balance = new_amount,
            reserved = reservation,
            top_up,
            "staked"
        );
        self.events.emit(&StakingEvent::Staked {
            account: account.clone(),
            amount,
        });
        Ok(record)
    }

    /// Close `account`'s stake, returning principal plus accrued reward.
    ///
    /// Unstaking before the cooldown is allowed but earns nothing.
    pub fn unstake<L: BalanceLedger>(
        &mut self,
        account: &AccountId,
        ledger: &mut L,
        now: Timestamp,
    ) -> Result<UnstakeReceipt, StakingError> {
        let record = self
            .state
            .stakes
            .active(account)
            .cloned()
            .ok_or(StakingError::NotAStaker)?;
        let held_secs = record.held_secs(now);

        let reward = self.reward_due(&record, now)?;
        let split = self.split_reward(reward, held_secs);
        let total = record
            .amount
            .checked_add(split.payout)
            .ok_or(StakingError::Overflow)?;

        let custody = self.state.custody.clone();
        ledger.transfer(&custody, account, total)?;

        if let Some(period) = self.state.registry.current_mut() {
            period.consumed = period.consumed.saturating_add(split.payout);
            period.retained = period.retained.saturating_add(split.fee);
        }
        self.state.retained_fees = self.state.retained_fees.saturating_add(split.fee);
        self.state.stakes.clear(account);

        info!(
            %account,
            principal = record.amount,
            reward = split.payout,
            fee = split.fee,
            held = %format_duration(held_secs),
            "unstaked"
        );
        self.events.emit(&StakingEvent::Unstaked {
            account: account.clone(),
            total,
            reward: split.payout,
            fee: split.fee,
        });
        Ok(UnstakeReceipt {
            principal: record.amount,
            reward: split.payout,
            fee: split.fee,
            total,
            held_secs,
        })
    }

    /// Reward `record` would earn if closed at `now`, before fees.
    ///
    /// Zero before the cooldown and zero without a registered period.
    /// Capped by the record's reservation and the pool remainder.
    pub fn reward_due(&self, record: &StakeRecord, now: Timestamp) -> Result<Amount, StakingError> {
        let Some(period) = self.state.registry.current() else {
            return Ok(0);
        };
        if !record
            .staked_at
            .has_expired(self.config.cooldown_secs, now)
        {
            return Ok(0);
        }
        let accrued = accrued_reward(
            record.amount,
            record.staked_at,
            period,
            now,
            self.config.year_secs,
        )?;
        Ok(accrued.min(record.reserved).min(period.remaining()))
    }

    fn split_reward(&self, reward: Amount, held_secs: u64) -> FeeSplit {
        let split = self.fee_policy.split(reward, held_secs);
        // a policy may not create value: clamp to the reward being split
        let fee = split.fee.min(reward);
        FeeSplit {
            payout: reward - fee,
            fee,
        }
    }

    // ── Fee / pool reconciliation ───────────────────────────────────────

    /// Custody balance not owed to anyone: pool remainder outside
    /// reservations, retained fees and stray deposits.
    pub fn withdrawable<L: BalanceLedger>(&self, ledger: &L) -> Amount {
        let liabilities = self
            .state
            .stakes
            .total_staked()
            .saturating_add(self.state.stakes.total_reserved());
        ledger
            .balance_of(&self.state.custody)
            .saturating_sub(liabilities)
    }

    /// Transfer everything withdrawable to the operator. Operator only.
    pub fn withdraw_amounts<L: BalanceLedger>(
        &mut self,
        caller: &AccountId,
        ledger: &mut L,
    ) -> Result<WithdrawalReceipt, StakingError> {
        self.ensure_operator(caller)?;
        let amount = self.withdrawable(ledger);
        if amount == 0 {
            return Err(StakingError::NothingToWithdraw);
        }

        let custody = self.state.custody.clone();
        ledger.transfer(&custody, caller, amount)?;

        let reserved = self.state.stakes.total_reserved();
        if let Some(period) = self.state.registry.current_mut() {
            let unreserved = period.remaining().saturating_sub(reserved);
            period.released = period.released.saturating_add(unreserved);
        }
        let fees = std::mem::take(&mut self.state.retained_fees);

        info!(operator = %caller, amount, fees, "custody surplus withdrawn");
        self.events.emit(&StakingEvent::Withdrawn {
            operator: caller.clone(),
            amount,
            fees,
        });
        Ok(WithdrawalReceipt { amount, fees })
    }

    fn ensure_operator(&self, caller: &AccountId) -> Result<(), StakingError> {
        if *caller != self.state.operator {
            debug!(%caller, "operator-only call rejected");
            return Err(StakingError::Unauthorized {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    // ── Read accessors ──────────────────────────────────────────────────

    pub fn reward_period(&self) -> Option<&RewardPeriod> {
        self.state.registry.current()
    }

    pub fn archived_periods(&self) -> &[RewardPeriod] {
        self.state.registry.archive()
    }

    pub fn stake_of(&self, account: &AccountId) -> Option<&StakeRecord> {
        self.state.stakes.get(account)
    }

    pub fn active_stakers(&self) -> usize {
        self.state.stakes.active_count()
    }

    pub fn total_staked(&self) -> Amount {
        self.state.stakes.total_staked()
    }

    pub fn reserved_rewards(&self) -> Amount {
        self.state.stakes.total_reserved()
    }

    /// Pool capacity still open to new reservations.
    pub fn available_rewards(&self) -> Amount {
        self.reward_period()
            .map(|p| p.remaining().saturating_sub(self.reserved_rewards()))
            .unwrap_or(0)
    }

    pub fn retained_fees(&self) -> Amount {
        self.state.retained_fees
    }

    pub fn operator(&self) -> &AccountId {
        &self.state.operator
    }

    pub fn custody(&self) -> &AccountId {
        &self.state.custody
    }

    pub fn config(&self) -> &StakingConfig {
        &self.config
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Serialize the engine state (not config or listeners) with bincode.
    pub fn snapshot(&self) -> Result<Vec<u8>, StakingError> {
        let body =
            bincode::serialize(&self.state).map_err(|e| StakingError::Snapshot(e.to_string()))?;
        let mut bytes = Vec::with_capacity(body.len() + 1);
        bytes.push(SNAPSHOT_VERSION);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Rebuild an engine from [`snapshot`](Self::snapshot) bytes.
    pub fn restore(config: StakingConfig, bytes: &[u8]) -> Result<Self, StakingError> {
        let (version, body) = bytes
            .split_first()
            .ok_or_else(|| StakingError::Snapshot("empty snapshot".into()))?;
        if *version != SNAPSHOT_VERSION {
            return Err(StakingError::Snapshot(format!(
                "unsupported snapshot version {version}"
            )));
        }
        let state: EngineState =
            bincode::deserialize(body).map_err(|e| StakingError::Snapshot(e.to_string()))?;
        let mut engine = Self::with_config(config, state.operator.clone(), state.custody.clone())?;
        engine.state = state;
        Ok(engine)
    }
}
