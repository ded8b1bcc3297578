//! Events emitted on every successful mutating call.

use serde::{Deserialize, Serialize};
use sttk_types::{AccountId, Amount, BasisPoints, Timestamp};

/// Engine-level events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StakingEvent {
    /// A reward period was funded and installed.
    RewardPeriodCreated {
        start: Timestamp,
        finish: Timestamp,
        total_rewards: Amount,
        annual_rate: BasisPoints,
    },
    /// Tokens moved into custody as a new stake or a top-up.
    Staked { account: AccountId, amount: Amount },
    /// A stake was closed. `total` = principal + `reward`; `fee` stayed in custody.
    Unstaked {
        account: AccountId,
        total: Amount,
        reward: Amount,
        fee: Amount,
    },
    /// The operator withdrew surplus custody funds, `fees` of which were retained fees.
    Withdrawn {
        operator: AccountId,
        amount: Amount,
        fees: Amount,
    },
}

/// Synchronous fan-out event bus.
///
/// Listeners are invoked inline on the emitting thread, after the state
/// change has committed.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&StakingEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&StakingEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &StakingEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
