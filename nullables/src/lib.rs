//! Nullable infrastructure for deterministic testing.
//!
//! The staking engine takes `now` as a parameter on every time-sensitive
//! call. Callers obtain it from a [`Clock`]: [`SystemClock`] in production,
//! [`NullClock`] in tests and scenario replays, where time only moves when
//! told to.

pub mod clock;

pub use clock::{Clock, NullClock, SystemClock};
