#![no_main]

use libfuzzer_sys::fuzz_target;

use sttk_staking::accrual::{accrued_reward, max_reward};
use sttk_staking::RewardPeriod;
use sttk_types::{BasisPoints, Timestamp};

// Accrual over arbitrary amounts, rates and timestamps must never panic,
// and a successful evaluation never exceeds the stake's maximum.
fuzz_target!(|input: (u128, u32, u64, u64, u64, u64, u64)| {
    let (amount, rate, start, len, staked_at, now, year_secs) = input;
    let start = Timestamp::new(start);
    let period = RewardPeriod::new(
        start,
        start.saturating_add(len),
        amount,
        BasisPoints::new(rate),
    );
    let staked_at = Timestamp::new(staked_at);

    let accrued = accrued_reward(amount, staked_at, &period, Timestamp::new(now), year_secs);
    let cap = max_reward(amount, staked_at, &period, year_secs);
    if let (Ok(accrued), Ok(cap)) = (accrued, cap) {
        assert!(accrued <= cap);
    }
});
