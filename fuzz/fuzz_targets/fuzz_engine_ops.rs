#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use sttk_staking::StakingEngine;
use sttk_token::{BalanceLedger, Token};
use sttk_types::{AccountId, BasisPoints, Timestamp};

#[derive(Arbitrary, Debug)]
enum Op {
    Period { start: u16, len: u16, pool: u32, rate: u16 },
    Stake { who: u8, amount: u32 },
    Unstake { who: u8 },
    Withdraw,
    Advance { secs: u32 },
}

// Arbitrary operation sequences must keep custody covering every
// liability and the pool accounting within its funding.
fuzz_target!(|ops: Vec<Op>| {
    let owner = AccountId::new("owner").unwrap();
    let custody = AccountId::new("staking").unwrap();
    let stakers: Vec<AccountId> = (0..4)
        .map(|i| AccountId::new(format!("staker-{i}")).unwrap())
        .collect();

    let mut token = Token::new("Staking Token", "STTK", u64::MAX as u128, &owner);
    token.approve(&owner, &custody, u64::MAX as u128);
    for s in &stakers {
        token.transfer(&owner, s, u32::MAX as u128 * 8).unwrap();
        token.approve(s, &custody, u128::MAX);
    }
    let mut engine = StakingEngine::new(owner.clone(), custody.clone()).unwrap();
    let mut now = Timestamp::new(1_700_000_000);

    for op in ops {
        match op {
            Op::Period { start, len, pool, rate } => {
                let start = now.saturating_add(start as u64 * 3600);
                let _ = engine.set_reward_period(
                    &owner,
                    &mut token,
                    start,
                    start.saturating_add(len as u64 * 3600),
                    pool as u128,
                    BasisPoints::new(rate as u32),
                    now,
                );
            }
            Op::Stake { who, amount } => {
                let s = &stakers[who as usize % stakers.len()];
                let _ = engine.stake(s, &mut token, amount as u128, now);
            }
            Op::Unstake { who } => {
                let s = &stakers[who as usize % stakers.len()];
                let _ = engine.unstake(s, &mut token, now);
            }
            Op::Withdraw => {
                let _ = engine.withdraw_amounts(&owner, &mut token);
            }
            Op::Advance { secs } => now = now.saturating_add(secs as u64),
        }

        if let Some(period) = engine.reward_period() {
            assert!(period.consumed + period.retained + period.released <= period.total_rewards);
            assert!(engine.reserved_rewards() <= period.remaining());
        }
        assert!(token.balance_of(&custody) >= engine.total_staked() + engine.reserved_rewards());
    }
});
