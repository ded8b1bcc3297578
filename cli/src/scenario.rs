//! Scripted scenarios replayed against a fresh engine, token and vendor.
//!
//! A scenario is a TOML file: token setup, funded accounts and a list of
//! timed steps. Time starts at `start` and only moves on `advance` steps.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use sttk_nullables::{Clock, NullClock};
use sttk_staking::{RewardPeriod, StakingConfig, StakingEngine, StakingEvent};
use sttk_token::{BalanceLedger, Token};
use sttk_types::{AccountId, Amount, BasisPoints, Timestamp};
use sttk_vendor::{Vendor, VendorEvent};
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Unix seconds at which the replay clock starts.
    #[serde(default = "default_start")]
    pub start: u64,
    #[serde(default)]
    pub token: TokenSetup,
    #[serde(default)]
    pub accounts: Vec<AccountSetup>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenSetup {
    #[serde(default = "default_token_name")]
    pub name: String,
    #[serde(default = "default_token_symbol")]
    pub symbol: String,
    #[serde(default = "default_supply", deserialize_with = "amount::deserialize")]
    pub supply: Amount,
    #[serde(default = "default_operator")]
    pub operator: String,
    /// Account holding staked principal and the reward pool.
    #[serde(default = "default_custody")]
    pub custody: String,
    /// Account holding the vendor's inventory and proceeds.
    #[serde(default = "default_vendor")]
    pub vendor: String,
    /// Tokens moved from the operator to the vendor before the first step.
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub vendor_inventory: Amount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountSetup {
    pub name: AccountId,
    /// Initial token balance, taken from the operator.
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub balance: Amount,
    /// Initial payment-asset balance.
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub payment: Amount,
    /// Staking allowance; defaults to the whole balance.
    #[serde(default, deserialize_with = "amount::deserialize_opt")]
    pub approve: Option<Amount>,
}

/// One scripted action. Period bounds are days relative to `start`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Advance {
        #[serde(default)]
        days: u64,
        #[serde(default)]
        secs: u64,
    },
    SetRewardPeriod {
        start_day: u64,
        finish_day: u64,
        #[serde(deserialize_with = "amount::deserialize")]
        total_rewards: Amount,
        rate_bps: u32,
        #[serde(default)]
        caller: Option<AccountId>,
    },
    Stake {
        account: AccountId,
        #[serde(deserialize_with = "amount::deserialize")]
        amount: Amount,
    },
    Unstake {
        account: AccountId,
    },
    Withdraw {
        #[serde(default)]
        caller: Option<AccountId>,
    },
    Approve {
        owner: AccountId,
        spender: AccountId,
        #[serde(deserialize_with = "amount::deserialize")]
        amount: Amount,
    },
    SetPrice {
        #[serde(deserialize_with = "amount::deserialize")]
        price: Amount,
        #[serde(default)]
        caller: Option<AccountId>,
    },
    Buy {
        account: AccountId,
        #[serde(deserialize_with = "amount::deserialize")]
        payment: Amount,
    },
    Sell {
        account: AccountId,
        #[serde(deserialize_with = "amount::deserialize")]
        amount: Amount,
    },
    VendorWithdraw {
        #[serde(default)]
        caller: Option<AccountId>,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Advance { .. } => "advance",
            Self::SetRewardPeriod { .. } => "set_reward_period",
            Self::Stake { .. } => "stake",
            Self::Unstake { .. } => "unstake",
            Self::Withdraw { .. } => "withdraw",
            Self::Approve { .. } => "approve",
            Self::SetPrice { .. } => "set_price",
            Self::Buy { .. } => "buy",
            Self::Sell { .. } => "sell",
            Self::VendorWithdraw { .. } => "vendor_withdraw",
        }
    }
}

/// Amounts are TOML integers, or decimal strings for values past `i64::MAX`.
mod amount {
    use std::fmt;

    use serde::de::{self, Deserializer, Unexpected, Visitor};
    use serde::Deserialize;
    use sttk_types::Amount;

    struct AmountVisitor;

    impl Visitor<'_> for AmountVisitor {
        type Value = Amount;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer or a decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
            Ok(Amount::from(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
            u64::try_from(v)
                .map(Amount::from)
                .map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
            v.trim()
                .parse()
                .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Amount, D::Error> {
        d.deserialize_any(AmountVisitor)
    }

    pub fn deserialize_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Amount>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapped(#[serde(deserialize_with = "deserialize")] Amount);
        Ok(Option::<Wrapped>::deserialize(d)?.map(|Wrapped(a)| a))
    }
}

fn default_start() -> u64 {
    1_700_000_000
}

fn default_token_name() -> String {
    "Staking Token".into()
}

fn default_token_symbol() -> String {
    "STTK".into()
}

fn default_supply() -> Amount {
    1_000_000
}

fn default_operator() -> String {
    "operator".into()
}

fn default_custody() -> String {
    "staking".into()
}

fn default_vendor() -> String {
    "vendor".into()
}

impl Default for TokenSetup {
    fn default() -> Self {
        Self {
            name: default_token_name(),
            symbol: default_token_symbol(),
            supply: default_supply(),
            operator: default_operator(),
            custody: default_custody(),
            vendor: default_vendor(),
            vendor_inventory: 0,
        }
    }
}

impl Scenario {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("invalid scenario")
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }
}

/// One line of replay output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Staking {
        step: usize,
        at: Timestamp,
        event: StakingEvent,
    },
    Vendor {
        step: usize,
        at: Timestamp,
        event: VendorEvent,
    },
    Rejected {
        step: usize,
        at: Timestamp,
        action: String,
        error: String,
    },
}

/// State at the end of a replay.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub finished_at: Timestamp,
    pub reward_period: Option<RewardPeriod>,
    pub archived_periods: usize,
    pub active_stakers: usize,
    pub total_staked: Amount,
    pub reserved_rewards: Amount,
    pub retained_fees: Amount,
    pub token_balances: Vec<(AccountId, Amount)>,
    pub payment_balances: Vec<(AccountId, Amount)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub records: Vec<Record>,
    pub summary: Summary,
}

impl Outcome {
    pub fn rejected(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r, Record::Rejected { .. }))
            .count()
    }
}

struct Replay {
    clock: NullClock,
    engine: StakingEngine,
    vendor: Vendor,
    tokens: Token,
    payments: Token,
    operator: AccountId,
    start: Timestamp,
    staking_events: Arc<Mutex<Vec<StakingEvent>>>,
    vendor_events: Arc<Mutex<Vec<VendorEvent>>>,
}

impl Replay {
    fn new(scenario: &Scenario, config: StakingConfig) -> Result<Self> {
        let setup = &scenario.token;
        let operator = AccountId::new(&setup.operator).context("operator account")?;
        let custody = AccountId::new(&setup.custody).context("custody account")?;
        let vendor_custody = AccountId::new(&setup.vendor).context("vendor account")?;

        let mut tokens = Token::new(&setup.name, &setup.symbol, setup.supply, &operator);
        tokens.approve(&operator, &custody, setup.supply);
        if setup.vendor_inventory > 0 {
            tokens
                .transfer(&operator, &vendor_custody, setup.vendor_inventory)
                .context("stocking vendor inventory")?;
        }

        let payment_supply = scenario
            .accounts
            .iter()
            .try_fold(0u128, |acc, a| acc.checked_add(a.payment))
            .ok_or_else(|| anyhow!("payment balances overflow"))?;
        let mut payments = Token::new("Payment", "PAY", payment_supply, &operator);

        for a in &scenario.accounts {
            if a.balance > 0 {
                tokens
                    .transfer(&operator, &a.name, a.balance)
                    .with_context(|| format!("funding {}", a.name))?;
            }
            if a.payment > 0 {
                payments
                    .transfer(&operator, &a.name, a.payment)
                    .with_context(|| format!("funding {} with payment asset", a.name))?;
            }
            tokens.approve(&a.name, &custody, a.approve.unwrap_or(a.balance));
        }

        let mut engine = StakingEngine::with_config(config, operator.clone(), custody)
            .context("invalid staking configuration")?;
        let staking_events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&staking_events);
        engine.subscribe(Box::new(move |e: &StakingEvent| {
            if let Ok(mut events) = sink.lock() {
                events.push(e.clone());
            }
        }));

        let mut vendor = Vendor::new(operator.clone(), vendor_custody);
        let vendor_events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&vendor_events);
        vendor.subscribe(Box::new(move |e: &VendorEvent| {
            if let Ok(mut events) = sink.lock() {
                events.push(e.clone());
            }
        }));

        Ok(Self {
            clock: NullClock::new(scenario.start),
            engine,
            vendor,
            tokens,
            payments,
            operator,
            start: Timestamp::new(scenario.start),
            staking_events,
            vendor_events,
        })
    }

    fn caller(&self, caller: &Option<AccountId>) -> AccountId {
        caller.clone().unwrap_or_else(|| self.operator.clone())
    }

    /// Apply one step. `Err` carries the rejection message.
    fn apply(&mut self, step: &Step) -> std::result::Result<(), String> {
        let now = self.clock.now();
        match step {
            Step::Advance { days, secs } => {
                self.clock.advance_days(*days);
                self.clock.advance(*secs);
                Ok(())
            }
            Step::SetRewardPeriod {
                start_day,
                finish_day,
                total_rewards,
                rate_bps,
                caller,
            } => {
                let caller = self.caller(caller);
                self.engine
                    .set_reward_period(
                        &caller,
                        &mut self.tokens,
                        self.start.plus_days(*start_day),
                        self.start.plus_days(*finish_day),
                        *total_rewards,
                        BasisPoints::new(*rate_bps),
                        now,
                    )
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            }
            Step::Stake { account, amount } => self
                .engine
                .stake(account, &mut self.tokens, *amount, now)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            Step::Unstake { account } => self
                .engine
                .unstake(account, &mut self.tokens, now)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            Step::Withdraw { caller } => {
                let caller = self.caller(caller);
                self.engine
                    .withdraw_amounts(&caller, &mut self.tokens)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            }
            Step::Approve {
                owner,
                spender,
                amount,
            } => {
                self.tokens.approve(owner, spender, *amount);
                Ok(())
            }
            Step::SetPrice { price, caller } => {
                let caller = self.caller(caller);
                self.vendor
                    .set_price(&caller, *price)
                    .map_err(|e| e.to_string())
            }
            Step::Buy { account, payment } => self
                .vendor
                .buy_tokens(account, *payment, &mut self.tokens, &mut self.payments)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            Step::Sell { account, amount } => self
                .vendor
                .sell_tokens(account, *amount, &mut self.tokens, &mut self.payments)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            Step::VendorWithdraw { caller } => {
                let caller = self.caller(caller);
                self.vendor
                    .withdraw(&caller, &mut self.payments)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            }
        }
    }

    fn drain_events(&self, step: usize, at: Timestamp, records: &mut Vec<Record>) -> Result<()> {
        let staking = std::mem::take(
            &mut *self
                .staking_events
                .lock()
                .map_err(|_| anyhow!("staking event sink poisoned"))?,
        );
        records.extend(
            staking
                .into_iter()
                .map(|event| Record::Staking { step, at, event }),
        );
        let vendor = std::mem::take(
            &mut *self
                .vendor_events
                .lock()
                .map_err(|_| anyhow!("vendor event sink poisoned"))?,
        );
        records.extend(
            vendor
                .into_iter()
                .map(|event| Record::Vendor { step, at, event }),
        );
        Ok(())
    }

    fn summary(&self) -> Summary {
        Summary {
            finished_at: self.clock.now(),
            reward_period: self.engine.reward_period().cloned(),
            archived_periods: self.engine.archived_periods().len(),
            active_stakers: self.engine.active_stakers(),
            total_staked: self.engine.total_staked(),
            reserved_rewards: self.engine.reserved_rewards(),
            retained_fees: self.engine.retained_fees(),
            token_balances: self.tokens.holders(),
            payment_balances: self.payments.holders(),
        }
    }
}

/// Replay `scenario` from scratch.
///
/// Rejected steps are recorded and skipped; with `strict` the first
/// rejection aborts the replay instead.
pub fn run(scenario: &Scenario, config: StakingConfig, strict: bool) -> Result<Outcome> {
    let mut replay = Replay::new(scenario, config)?;
    let mut records = Vec::new();

    for (index, step) in scenario.steps.iter().enumerate() {
        let at = replay.clock.now();
        if let Err(error) = replay.apply(step) {
            if strict {
                bail!("step {index} ({}) rejected: {error}", step.name());
            }
            warn!(step = index, action = step.name(), %error, "step rejected");
            records.push(Record::Rejected {
                step: index,
                at,
                action: step.name().to_string(),
                error,
            });
        }
        replay.drain_events(index, at, &mut records)?;
    }

    let summary = replay.summary();
    info!(
        steps = scenario.steps.len(),
        records = records.len(),
        active_stakers = summary.active_stakers,
        "replay finished"
    );
    Ok(Outcome { records, summary })
}
