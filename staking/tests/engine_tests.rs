//! End-to-end staking scenarios against the in-memory token.

use std::sync::{Arc, Mutex};

use sttk_nullables::{Clock, NullClock};
use sttk_staking::{
    FeePolicyConfig, PeriodGate, PeriodParamError, RestakePolicy, StakingConfig, StakingEngine,
    StakingError, StakingEvent, WindowViolation,
};
use sttk_token::{BalanceLedger, Token, TokenError};
use sttk_types::{AccountId, Amount, BasisPoints, Timestamp, SECS_PER_DAY};

const T: u64 = 1_700_000_000;

fn acct(name: &str) -> AccountId {
    AccountId::new(name).unwrap()
}

fn day(n: u64) -> Timestamp {
    Timestamp::new(T + n * SECS_PER_DAY)
}

struct Harness {
    engine: StakingEngine,
    token: Token,
    clock: NullClock,
    owner: AccountId,
    custody: AccountId,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(StakingConfig::default())
    }

    fn with_config(config: StakingConfig) -> Self {
        let owner = acct("owner");
        let custody = acct("staking");
        let mut token = Token::new("Staking Token", "STTK", 1_000_000, &owner);
        token.approve(&owner, &custody, 1_000_000);
        for name in ["alice", "bob", "carol"] {
            token.transfer(&owner, &acct(name), 1000).unwrap();
            token.approve(&acct(name), &custody, 1000);
        }
        let engine = StakingEngine::with_config(config, owner.clone(), custody.clone()).unwrap();
        Self {
            engine,
            token,
            clock: NullClock::new(T),
            owner,
            custody,
        }
    }

    fn at(&self, d: u64) {
        self.clock.set(T + d * SECS_PER_DAY);
    }

    fn open(&mut self, start: u64, finish: u64, pool: Amount, rate: u32) -> Result<(), StakingError> {
        let owner = self.owner.clone();
        self.engine
            .set_reward_period(
                &owner,
                &mut self.token,
                day(start),
                day(finish),
                pool,
                BasisPoints::new(rate),
                self.clock.now(),
            )
            .map(|_| ())
    }

    fn stake(&mut self, who: &str, amount: Amount) -> Result<(), StakingError> {
        self.engine
            .stake(&acct(who), &mut self.token, amount, self.clock.now())
            .map(|_| ())
    }

    fn unstake(&mut self, who: &str) -> Result<sttk_staking::UnstakeReceipt, StakingError> {
        self.engine.unstake(&acct(who), &mut self.token, self.clock.now())
    }

    fn balance(&self, who: &str) -> Amount {
        self.token.balance_of(&acct(who))
    }

    fn consumed(&self) -> Amount {
        self.engine.reward_period().map(|p| p.consumed).unwrap_or(0)
    }
}

// ── Reward period registry ─────────────────────────────────────────────

#[test]
fn operator_funds_and_installs_period() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 800).unwrap();

    let period = h.engine.reward_period().unwrap();
    assert_eq!(period.start, day(2));
    assert_eq!(period.finish, day(32));
    assert_eq!(period.total_rewards, 10_000);
    assert_eq!(period.consumed, 0);
    assert_eq!(h.token.balance_of(&h.custody), 10_000);
    assert_eq!(h.token.allowance(&h.owner, &h.custody), 990_000);
}

#[test]
fn non_operator_cannot_set_period() {
    let mut h = Harness::new();
    let err = h
        .engine
        .set_reward_period(
            &acct("alice"),
            &mut h.token,
            day(2),
            day(32),
            100,
            BasisPoints::new(800),
            day(0),
        )
        .unwrap_err();
    assert_eq!(err, StakingError::Unauthorized { caller: acct("alice") });
    assert!(h.engine.reward_period().is_none());
}

#[test]
fn period_parameters_are_checked_in_order() {
    let mut h = Harness::new();
    assert_eq!(
        h.open(2, 32, 0, 800),
        Err(StakingError::InvalidPeriodParameters(PeriodParamError::ZeroRewards))
    );
    assert_eq!(
        h.open(2, 32, 100, 1500),
        Err(StakingError::InvalidPeriodParameters(PeriodParamError::RateOutOfRange {
            rate: BasisPoints::new(1500),
            ceiling: BasisPoints::new(1000),
        }))
    );
    assert!(matches!(
        h.open(2, 32, 100, 0),
        Err(StakingError::InvalidPeriodParameters(PeriodParamError::RateOutOfRange { .. }))
    ));
    assert!(matches!(
        h.open(32, 2, 100, 800),
        Err(StakingError::InvalidPeriodParameters(PeriodParamError::InvertedWindow { .. }))
    ));
    assert!(matches!(
        h.open(5, 5, 100, 800),
        Err(StakingError::InvalidPeriodParameters(PeriodParamError::InvertedWindow { .. }))
    ));
    h.at(3);
    assert_eq!(
        h.open(2, 32, 100, 800),
        Err(StakingError::InvalidPeriodParameters(PeriodParamError::WindowInPast {
            start: day(2),
            now: day(3),
        }))
    );
    assert!(h.engine.reward_period().is_none());
    assert_eq!(h.token.balance_of(&h.custody), 0);
}

#[test]
fn rate_at_ceiling_is_accepted() {
    let mut h = Harness::new();
    h.open(2, 32, 100, 1000).unwrap();
}

#[test]
fn period_cannot_be_replaced_while_open() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 800).unwrap();
    h.at(10);
    assert_eq!(
        h.open(40, 70, 10_000, 800),
        Err(StakingError::PeriodNotElapsed(PeriodGate::StillOpen { finish: day(32) }))
    );
}

#[test]
fn period_cannot_be_replaced_with_outstanding_stakers() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 800).unwrap();
    h.at(2);
    h.stake("alice", 500).unwrap();
    h.at(40);
    assert_eq!(
        h.open(40, 70, 10_000, 800),
        Err(StakingError::PeriodNotElapsed(PeriodGate::OutstandingStakers { count: 1 }))
    );

    h.unstake("alice").unwrap();
    h.open(40, 70, 5_000, 900).unwrap();
    assert_eq!(h.engine.archived_periods().len(), 1);
    assert_eq!(h.engine.archived_periods()[0].finish, day(32));
    assert_eq!(h.engine.reward_period().unwrap().total_rewards, 5_000);
}

#[test]
fn funding_requires_allowance() {
    let mut h = Harness::new();
    h.token.approve(&h.owner, &h.custody, 50);
    let err = h.open(2, 32, 100, 800).unwrap_err();
    assert!(matches!(
        err,
        StakingError::Ledger(TokenError::InsufficientAllowance { needed: 100, approved: 50, .. })
    ));
    assert!(h.engine.reward_period().is_none());
}

// ── Stake ──────────────────────────────────────────────────────────────

#[test]
fn stake_rejects_zero_and_excess() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 800).unwrap();
    h.at(5);
    assert_eq!(h.stake("alice", 0), Err(StakingError::ZeroAmount));
    assert_eq!(
        h.stake("alice", 1001),
        Err(StakingError::InsufficientBalance {
            needed: 1001,
            available: 1000,
        })
    );
    assert!(h.engine.stake_of(&acct("alice")).is_none());
}

#[test]
fn stake_window_is_inclusive() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 800).unwrap();

    h.clock.set(day(2).as_secs() - 1);
    assert_eq!(
        h.stake("alice", 100),
        Err(StakingError::OutOfWindow(WindowViolation::TooEarly { start: day(2) }))
    );
    h.at(2);
    h.stake("alice", 100).unwrap();
    h.at(32);
    h.stake("bob", 100).unwrap();
    h.clock.advance(1);
    assert_eq!(
        h.stake("carol", 100),
        Err(StakingError::OutOfWindow(WindowViolation::TooLate { finish: day(32) }))
    );
}

#[test]
fn stake_moves_tokens_into_custody() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 800).unwrap();
    h.at(7);
    h.stake("alice", 500).unwrap();

    assert_eq!(h.balance("alice"), 500);
    assert_eq!(h.token.balance_of(&h.custody), 10_500);
    let record = h.engine.stake_of(&acct("alice")).unwrap();
    assert!(record.active);
    assert_eq!(record.amount, 500);
    assert_eq!(record.staked_at, day(7));
    assert_eq!(h.engine.total_staked(), 500);
    assert_eq!(h.engine.active_stakers(), 1);
}

#[test]
fn stake_without_allowance_fails_cleanly() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 800).unwrap();
    h.token.approve(&acct("alice"), &h.custody, 0);
    h.at(5);
    assert!(matches!(
        h.stake("alice", 100),
        Err(StakingError::Ledger(TokenError::InsufficientAllowance { .. }))
    ));
    assert!(h.engine.stake_of(&acct("alice")).is_none());
    assert_eq!(h.engine.reserved_rewards(), 0);
}

#[test]
fn top_up_waits_for_cooldown() {
    let mut h = Harness::new();
    h.open(2, 92, 10_000, 800).unwrap();
    h.at(2);
    h.stake("alice", 250).unwrap();
    h.at(5);
    assert_eq!(
        h.stake("alice", 250),
        Err(StakingError::CooldownNotElapsed { ready_at: day(9) })
    );
    h.at(9);
    h.stake("alice", 250).unwrap();
    let record = h.engine.stake_of(&acct("alice")).unwrap();
    assert_eq!(record.amount, 500);
    assert_eq!(record.staked_at, day(9));
    assert_eq!(h.engine.active_stakers(), 1);
}

#[test]
fn reject_policy_refuses_second_stake() {
    let config = StakingConfig {
        restake_policy: RestakePolicy::Reject,
        ..StakingConfig::default()
    };
    let mut h = Harness::with_config(config);
    h.open(2, 32, 10_000, 800).unwrap();
    h.at(2);
    h.stake("alice", 250).unwrap();
    h.at(20);
    assert_eq!(h.stake("alice", 250), Err(StakingError::AlreadyStaked));
}

#[test]
fn stake_beyond_pool_capacity_is_refused() {
    let mut h = Harness::new();
    // 1000 at 10% for a full year is worth 100
    h.open(0, 365, 150, 1000).unwrap();
    h.stake("alice", 1000).unwrap();
    assert_eq!(
        h.stake("bob", 1000),
        Err(StakingError::PoolExhausted {
            needed: 100,
            available: 50,
        })
    );
    h.stake("bob", 500).unwrap();
    assert_eq!(h.engine.reserved_rewards(), 150);
    assert_eq!(h.balance("bob"), 500);
}

// ── Unstake ────────────────────────────────────────────────────────────

#[test]
fn unstake_pays_principal_plus_reward() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 800).unwrap();
    h.at(7);
    h.stake("alice", 500).unwrap();
    h.at(37);
    let receipt = h.unstake("alice").unwrap();

    assert_eq!(receipt.principal, 500);
    assert!(receipt.reward > 0 && receipt.reward < 10_000);
    assert_eq!(receipt.total, 500 + receipt.reward);
    assert_eq!(h.balance("alice"), 1000 + receipt.reward);
    assert_eq!(h.consumed(), receipt.reward);
    assert_eq!(h.engine.active_stakers(), 0);
}

#[test]
fn thirty_day_window_pays_two_after_fee() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 800).unwrap();
    h.at(2);
    h.stake("alice", 500).unwrap();
    h.at(32);
    let receipt = h.unstake("alice").unwrap();
    assert_eq!((receipt.reward, receipt.fee), (2, 1));
    assert_eq!(h.balance("alice"), 1002);
}

#[test]
fn long_hold_pays_full_reward() {
    let mut h = Harness::new();
    h.open(2, 67, 10_000, 800).unwrap();
    h.at(2);
    h.stake("alice", 500).unwrap();
    h.at(69);
    let receipt = h.unstake("alice").unwrap();
    assert_eq!((receipt.reward, receipt.fee), (7, 0));
    assert_eq!(receipt.held_secs, 67 * SECS_PER_DAY);
}

#[test]
fn top_up_restarts_accrual_clock() {
    let mut h = Harness::new();
    h.open(2, 92, 10_000, 800).unwrap();
    h.at(2);
    h.stake("alice", 250).unwrap();
    h.at(40);
    h.stake("alice", 250).unwrap();
    h.at(120);
    let receipt = h.unstake("alice").unwrap();
    assert_eq!(receipt.principal, 500);
    assert_eq!((receipt.reward, receipt.fee), (5, 0));
}

#[test]
fn early_exit_retains_fee_for_operator() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 1000).unwrap();
    h.at(2);
    h.stake("alice", 1000).unwrap();
    h.at(42);
    let receipt = h.unstake("alice").unwrap();
    assert_eq!((receipt.reward, receipt.fee), (5, 3));
    assert_eq!(h.balance("alice"), 1005);
    assert_eq!(h.engine.retained_fees(), 3);
    let period = h.engine.reward_period().unwrap();
    assert_eq!((period.consumed, period.retained), (5, 3));
}

#[test]
fn fee_free_policy_pays_everything() {
    let config = StakingConfig {
        fee_policy: FeePolicyConfig::None,
        ..StakingConfig::default()
    };
    let mut h = Harness::with_config(config);
    h.open(2, 32, 10_000, 1000).unwrap();
    h.at(2);
    h.stake("alice", 1000).unwrap();
    h.at(42);
    let receipt = h.unstake("alice").unwrap();
    assert_eq!((receipt.reward, receipt.fee), (8, 0));
}

#[test]
fn unstake_before_cooldown_returns_principal_only() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 1000).unwrap();
    h.at(2);
    h.stake("alice", 1000).unwrap();
    h.at(8);
    let receipt = h.unstake("alice").unwrap();
    assert_eq!(receipt.reward, 0);
    assert_eq!(receipt.total, 1000);
    assert_eq!(h.balance("alice"), 1000);
}

#[test]
fn stake_without_period_is_reward_free() {
    let mut h = Harness::new();
    h.stake("alice", 500).unwrap();
    assert_eq!(h.engine.stake_of(&acct("alice")).unwrap().reserved, 0);
    h.at(1);
    let receipt = h.unstake("alice").unwrap();
    assert_eq!(receipt.reward, 0);
    assert_eq!(receipt.total, 500);
    assert_eq!(h.balance("alice"), 1000);
}

#[test]
fn second_unstake_is_rejected() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 800).unwrap();
    h.at(2);
    h.stake("alice", 500).unwrap();
    h.at(40);
    h.unstake("alice").unwrap();
    let balance = h.balance("alice");
    assert_eq!(h.unstake("alice").unwrap_err(), StakingError::NotAStaker);
    assert_eq!(h.balance("alice"), balance);
    assert!(!h.engine.stake_of(&acct("alice")).unwrap().active);
}

#[test]
fn unknown_account_is_not_a_staker() {
    let mut h = Harness::new();
    assert_eq!(h.unstake("ghost").unwrap_err(), StakingError::NotAStaker);
}

#[test]
fn custody_account_cannot_stake() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 1000).unwrap();
    h.at(2);
    let custody = h.custody.clone();
    h.token.approve(&custody, &custody, 10_000);

    let err = h.stake("staking", 500).unwrap_err();
    assert_eq!(err, StakingError::CustodyAccount { account: custody });
    assert_eq!(h.balance("staking"), 10_000);
    assert_eq!(h.engine.active_stakers(), 0);
    assert_eq!(h.engine.reserved_rewards(), 0);
    assert_eq!(h.engine.available_rewards(), 10_000);
}

#[test]
fn operator_and_custody_must_differ() {
    let owner = acct("owner");
    let result = StakingEngine::with_config(StakingConfig::default(), owner.clone(), owner.clone());
    assert_eq!(
        result.err(),
        Some(StakingError::CustodyAccount { account: owner })
    );
}

#[test]
fn stake_at_finish_earns_nothing() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 1000).unwrap();
    h.at(32);
    h.stake("alice", 1000).unwrap();
    assert_eq!(h.engine.stake_of(&acct("alice")).unwrap().reserved, 0);
    h.at(100);
    assert_eq!(h.unstake("alice").unwrap().reward, 0);
}

// ── Withdrawal ─────────────────────────────────────────────────────────

#[test]
fn withdraw_returns_surplus_but_not_liabilities() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 1000).unwrap();
    h.at(2);
    h.stake("alice", 1000).unwrap();
    let reserved = h.engine.reserved_rewards();
    assert_eq!(h.engine.withdrawable(&h.token), 10_000 - reserved);

    let owner = h.owner.clone();
    let owner_before = h.token.balance_of(&owner);
    let receipt = h.engine.withdraw_amounts(&owner, &mut h.token).unwrap();
    assert_eq!(receipt.amount, 10_000 - reserved);
    assert_eq!(h.token.balance_of(&owner), owner_before + receipt.amount);
    assert_eq!(h.token.balance_of(&h.custody), 1000 + reserved);

    // the staker can still be paid in full
    h.at(70);
    let paid = h.unstake("alice").unwrap();
    assert_eq!(paid.total, 1000 + reserved);
    assert_eq!(h.token.balance_of(&h.custody), 0);
}

#[test]
fn withdraw_collects_retained_fees() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 1000).unwrap();
    h.at(2);
    h.stake("alice", 1000).unwrap();
    h.at(42);
    h.unstake("alice").unwrap();

    let owner = h.owner.clone();
    let receipt = h.engine.withdraw_amounts(&owner, &mut h.token).unwrap();
    assert_eq!(receipt.amount, 10_000 - 5);
    assert_eq!(receipt.fees, 3);
    assert_eq!(h.engine.retained_fees(), 0);
    assert_eq!(h.engine.reward_period().unwrap().remaining(), 0);
}

#[test]
fn second_withdraw_has_nothing_left() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 800).unwrap();
    let owner = h.owner.clone();
    h.engine.withdraw_amounts(&owner, &mut h.token).unwrap();
    assert_eq!(
        h.engine.withdraw_amounts(&owner, &mut h.token),
        Err(StakingError::NothingToWithdraw)
    );
}

#[test]
fn only_operator_withdraws() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 800).unwrap();
    assert_eq!(
        h.engine.withdraw_amounts(&acct("alice"), &mut h.token),
        Err(StakingError::Unauthorized { caller: acct("alice") })
    );
    assert_eq!(h.token.balance_of(&h.custody), 10_000);
}

#[test]
fn withdraw_on_empty_custody_fails() {
    let mut h = Harness::new();
    let owner = h.owner.clone();
    assert_eq!(
        h.engine.withdraw_amounts(&owner, &mut h.token),
        Err(StakingError::NothingToWithdraw)
    );
}

// ── Events ─────────────────────────────────────────────────────────────

#[test]
fn events_follow_committed_operations() {
    let mut h = Harness::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    h.engine
        .subscribe(Box::new(move |e: &StakingEvent| sink.lock().unwrap().push(e.clone())));

    h.open(2, 32, 10_000, 1000).unwrap();
    h.at(2);
    h.stake("alice", 1000).unwrap();
    assert!(h.stake("bob", 0).is_err());
    h.at(42);
    h.unstake("alice").unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            StakingEvent::RewardPeriodCreated {
                start: day(2),
                finish: day(32),
                total_rewards: 10_000,
                annual_rate: BasisPoints::new(1000),
            },
            StakingEvent::Staked {
                account: acct("alice"),
                amount: 1000,
            },
            StakingEvent::Unstaked {
                account: acct("alice"),
                total: 1005,
                reward: 5,
                fee: 3,
            },
        ]
    );
}

// ── Persistence ────────────────────────────────────────────────────────

#[test]
fn restored_engine_continues_where_it_left_off() {
    let mut h = Harness::new();
    h.open(2, 32, 10_000, 1000).unwrap();
    h.at(2);
    h.stake("alice", 1000).unwrap();

    let bytes = h.engine.snapshot().unwrap();
    let mut restored = StakingEngine::restore(StakingConfig::default(), &bytes).unwrap();
    let receipt = restored
        .unstake(&acct("alice"), &mut h.token, day(42))
        .unwrap();
    assert_eq!((receipt.reward, receipt.fee), (5, 3));
}
