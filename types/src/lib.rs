//! Fundamental types for the STTK workspace.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! account identifiers, token amounts, basis-point rates and timestamps.

pub mod account;
pub mod amount;
pub mod error;
pub mod time;

pub use account::AccountId;
pub use amount::{Amount, BasisPoints, BPS_DENOMINATOR};
pub use error::TypesError;
pub use time::{Timestamp, SECS_PER_DAY, SECS_PER_YEAR};
