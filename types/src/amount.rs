//! Token amounts and basis-point rates.
//!
//! Amounts are raw integer units (u128), never floating point. Rates and fee
//! shares are basis points: 10_000 bps = 100%.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw token amount.
pub type Amount = u128;

/// Basis points in one whole (100%).
pub const BPS_DENOMINATOR: u32 = 10_000;

/// A rate or share expressed in basis points (800 = 8%).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasisPoints(u32);

impl BasisPoints {
    pub const ZERO: Self = Self(0);
    pub const FULL: Self = Self(BPS_DENOMINATOR);

    pub const fn new(bps: u32) -> Self {
        Self(bps)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `amount × bps / 10_000`, rounded down. `None` on overflow.
    pub fn apply(&self, amount: Amount) -> Option<Amount> {
        amount
            .checked_mul(self.0 as u128)
            .map(|v| v / BPS_DENOMINATOR as u128)
    }
}

impl fmt::Display for BasisPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bps", self.0)
    }
}

impl From<u32> for BasisPoints {
    fn from(bps: u32) -> Self {
        Self(bps)
    }
}
