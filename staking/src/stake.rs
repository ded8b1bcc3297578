//! Per-account stake records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sttk_types::{AccountId, Amount, Timestamp};

/// One account's stake.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    pub active: bool,
    pub amount: Amount,
    /// Start of the accrual clock; reset by top-ups.
    pub staked_at: Timestamp,
    /// Last stake action, for cooldown tracking.
    pub last_action_at: Timestamp,
    /// Worst-case reward set aside from the pool for this record.
    pub reserved: Amount,
}

impl StakeRecord {
    pub fn open(amount: Amount, now: Timestamp, reserved: Amount) -> Self {
        Self {
            active: true,
            amount,
            staked_at: now,
            last_action_at: now,
            reserved,
        }
    }

    /// Seconds the current balance has been held at `now`.
    pub fn held_secs(&self, now: Timestamp) -> u64 {
        self.staked_at.elapsed_since(now)
    }

    /// When the next top-up becomes allowed.
    pub fn cooldown_ready_at(&self, cooldown_secs: u64) -> Timestamp {
        self.last_action_at.saturating_add(cooldown_secs)
    }
}

/// All stake records, keyed by account.
///
/// Cleared records stay in the map (inactive, zero amount) so that reads of
/// a former staker return a record rather than nothing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StakeLedger {
    records: HashMap<AccountId, StakeRecord>,
}

impl StakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, account: &AccountId) -> Option<&StakeRecord> {
        self.records.get(account)
    }

    /// The account's record, only if active.
    pub fn active(&self, account: &AccountId) -> Option<&StakeRecord> {
        self.records.get(account).filter(|r| r.active)
    }

    pub(crate) fn upsert(&mut self, account: AccountId, record: StakeRecord) {
        self.records.insert(account, record);
    }

    /// Deactivate the account's record, returning it as it was.
    pub(crate) fn clear(&mut self, account: &AccountId) -> Option<StakeRecord> {
        let record = self.records.get_mut(account)?;
        let previous = record.clone();
        record.active = false;
        record.amount = 0;
        record.reserved = 0;
        Some(previous)
    }

    pub fn iter_active(&self) -> impl Iterator<Item = (&AccountId, &StakeRecord)> {
        self.records.iter().filter(|(_, r)| r.active)
    }

    pub fn active_count(&self) -> usize {
        self.iter_active().count()
    }

    /// Principal currently held in custody for active records.
    pub fn total_staked(&self) -> Amount {
        self.iter_active()
            .fold(0u128, |acc, (_, r)| acc.saturating_add(r.amount))
    }

    /// Sum of all outstanding reservations.
    pub fn total_reserved(&self) -> Amount {
        self.iter_active()
            .fold(0u128, |acc, (_, r)| acc.saturating_add(r.reserved))
    }
}
