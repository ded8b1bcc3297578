//! The balance ledger interface.

use crate::error::TokenError;
use sttk_types::{AccountId, Amount};

/// A transferable-balance ledger.
///
/// Every mutating call is all-or-nothing: on `Err` no balance or allowance
/// has changed.
pub trait BalanceLedger {
    /// Current balance of `account` (zero for unknown accounts).
    fn balance_of(&self, account: &AccountId) -> Amount;

    /// Amount `spender` may still move out of `owner`'s balance.
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount;

    /// Set `spender`'s allowance over `owner`'s balance, replacing any previous value.
    fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount);

    /// Move `amount` from `from` to `to`.
    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<(), TokenError>;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming allowance.
    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError>;
}
