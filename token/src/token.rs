//! In-memory fungible token.

use std::collections::HashMap;

use crate::error::TokenError;
use crate::ledger::BalanceLedger;
use serde::{Deserialize, Serialize};
use sttk_types::{AccountId, Amount};

/// Static description of a token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub total_supply: Amount,
}

/// A fixed-supply token held entirely in memory.
///
/// The whole supply is credited to the issuer at creation; balances only
/// move afterwards, so the sum of all balances always equals `total_supply`.
#[derive(Clone, Debug)]
pub struct Token {
    info: TokenInfo,
    balances: HashMap<AccountId, Amount>,
    allowances: HashMap<(AccountId, AccountId), Amount>,
}

impl Token {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        total_supply: Amount,
        issuer: &AccountId,
    ) -> Self {
        let mut balances = HashMap::new();
        if total_supply > 0 {
            balances.insert(issuer.clone(), total_supply);
        }
        Self {
            info: TokenInfo {
                name: name.into(),
                symbol: symbol.into(),
                total_supply,
            },
            balances,
            allowances: HashMap::new(),
        }
    }

    pub fn info(&self) -> &TokenInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn symbol(&self) -> &str {
        &self.info.symbol
    }

    pub fn total_supply(&self) -> Amount {
        self.info.total_supply
    }

    /// All accounts with a non-zero balance, sorted by account.
    pub fn holders(&self) -> Vec<(AccountId, Amount)> {
        let mut holders: Vec<_> = self
            .balances
            .iter()
            .filter(|(_, &b)| b > 0)
            .map(|(a, &b)| (a.clone(), b))
            .collect();
        holders.sort();
        holders
    }

    /// Compute both post-transfer balances without touching state.
    fn plan_move(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(Amount, Amount), TokenError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                account: from.clone(),
                needed: amount,
                available,
            });
        }
        let from_after = available - amount;
        let to_after = if from == to {
            available
        } else {
            self.balance_of(to)
                .checked_add(amount)
                .ok_or(TokenError::Overflow)?
        };
        Ok((from_after, to_after))
    }

    fn commit_move(&mut self, from: &AccountId, to: &AccountId, from_after: Amount, to_after: Amount) {
        if from == to {
            return;
        }
        self.balances.insert(from.clone(), from_after);
        self.balances.insert(to.clone(), to_after);
    }
}

impl BalanceLedger for Token {
    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        self.allowances
            .insert((owner.clone(), spender.clone()), amount);
    }

    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<(), TokenError> {
        let (from_after, to_after) = self.plan_move(from, to, amount)?;
        self.commit_move(from, to, from_after, to_after);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let approved = self.allowance(from, spender);
        if approved < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: from.clone(),
                spender: spender.clone(),
                needed: amount,
                approved,
            });
        }
        let (from_after, to_after) = self.plan_move(from, to, amount)?;
        self.commit_move(from, to, from_after, to_after);
        self.allowances
            .insert((from.clone(), spender.clone()), approved - amount);
        Ok(())
    }
}
