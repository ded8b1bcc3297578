//! Fungible token ledger for the STTK workspace.
//!
//! [`BalanceLedger`] is the collaborator interface the staking engine and the
//! vendor consume: balances, allowances and transfers. [`Token`] is the
//! in-memory implementation with a fixed supply minted to an issuer.

pub mod error;
pub mod ledger;
pub mod token;

pub use error::TokenError;
pub use ledger::BalanceLedger;
pub use token::{Token, TokenInfo};
