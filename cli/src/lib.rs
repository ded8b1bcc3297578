//! Library side of the `sttk` command: scenario replay and reward quotes.

pub mod quote;
pub mod scenario;

pub use quote::{quote, Quote};
pub use scenario::{run, Outcome, Record, Scenario, Step, Summary};
