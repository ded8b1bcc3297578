#![no_main]

use libfuzzer_sys::fuzz_target;

use sttk_staking::{StakingConfig, StakingEngine};

// Restoring from arbitrary bytes must fail cleanly rather than panic.
fuzz_target!(|data: &[u8]| {
    if let Ok(engine) = StakingEngine::restore(StakingConfig::default(), data) {
        let _ = engine.snapshot();
    }
});
