//! Scenario replay against an in-memory pool

use amm::{quote, Address, Decimal, InMemoryLedger, Pool, PoolEvent, PoolResult, Reserves};
use anyhow::{bail, Context, Result};
use pool_config::{SimulatorConfig, Step};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// Value returned by a successful step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepResult {
    TotalShares(u128),
    Output(u128),
    TokenPulled(u128),
    Withdrawn { native_paid: u128, token_paid: u128 },
    Shares(u128),
}

/// Result of one replayed step
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub step: Step,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<StepResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final state of a run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub steps: Vec<StepOutcome>,
    pub events: Vec<PoolEvent>,
    pub reserves: Reserves,
    pub total_shares: u128,
    pub shares: BTreeMap<String, u128>,
    pub spot_price: Option<Decimal>,
}

pub struct Simulator {
    pool: Pool,
    accounts: HashMap<String, Address>,
}

impl Simulator {
    /// Build a pool and seed every configured account on both ledgers
    pub fn from_config(config: &SimulatorConfig) -> Result<Self> {
        config.validate()?;
        let pool_addr = parse_address(&config.pool.address)
            .with_context(|| format!("Invalid pool address: {}", config.pool.address))?;

        let mut native = InMemoryLedger::native();
        let mut token = InMemoryLedger::token();
        let mut accounts = HashMap::new();

        for seed in &config.accounts {
            let who = Address::from_label(&seed.name);
            if who == pool_addr {
                bail!("Account {} resolves to the pool address {}", seed.name, pool_addr);
            }
            native.mint(who, u128::from(seed.native));
            token.mint(who, u128::from(seed.token));
            token.approve(who, pool_addr, u128::from(seed.allowance()));
            if seed.reject_native {
                native.reject_incoming(who);
            }
            if seed.reject_token {
                token.reject_incoming(who);
            }
            accounts.insert(seed.name.clone(), who);
        }

        info!(pool = %pool_addr, accounts = accounts.len(), "Simulator seeded");
        Ok(Self {
            pool: Pool::new(pool_addr, native, token),
            accounts,
        })
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Replay `steps` in order; failed steps are recorded and the run continues
    pub fn run(&mut self, steps: &[Step]) -> Report {
        let outcomes = steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let (result, error) = match self.apply(step) {
                    Ok(value) => (Some(value), None),
                    Err(e) => {
                        warn!(index, ?step, error = %e, "Step failed");
                        (None, Some(e.to_string()))
                    }
                };
                StepOutcome {
                    index,
                    step: step.clone(),
                    result,
                    error,
                }
            })
            .collect();

        self.report(outcomes)
    }

    fn apply(&mut self, step: &Step) -> PoolResult<StepResult> {
        match step {
            Step::Initialize {
                account,
                token,
                native,
            } => {
                let who = self.address(account);
                let total = self.pool.initialize(who, u128::from(*token), u128::from(*native))?;
                Ok(StepResult::TotalShares(total))
            }
            Step::SwapAToB { account, amount } => {
                let who = self.address(account);
                let output = self.pool.swap_a_to_b(who, u128::from(*amount))?;
                Ok(StepResult::Output(output))
            }
            Step::SwapBToA { account, amount } => {
                let who = self.address(account);
                let output = self.pool.swap_b_to_a(who, u128::from(*amount))?;
                Ok(StepResult::Output(output))
            }
            Step::ProvideLiquidity { account, native } => {
                let who = self.address(account);
                let pulled = self.pool.provide_liquidity(who, u128::from(*native))?;
                Ok(StepResult::TokenPulled(pulled))
            }
            Step::WithdrawLiquidity { account, shares } => {
                let who = self.address(account);
                let (native, token) = self.pool.withdraw_liquidity(who, u128::from(*shares))?;
                Ok(StepResult::Withdrawn {
                    native_paid: native,
                    token_paid: token,
                })
            }
            Step::Quote {
                input,
                input_reserve,
                output_reserve,
            } => {
                let output = quote(
                    u128::from(*input),
                    u128::from(*input_reserve),
                    u128::from(*output_reserve),
                )?;
                Ok(StepResult::Output(output))
            }
            Step::ShareOf { account } => {
                let who = self.address(account);
                Ok(StepResult::Shares(self.pool.share_of(&who)))
            }
        }
    }

    /// Accounts are validated by the config loader; unknown names map to their label address
    fn address(&self, name: &str) -> Address {
        self.accounts
            .get(name)
            .copied()
            .unwrap_or_else(|| Address::from_label(name))
    }

    fn report(&mut self, steps: Vec<StepOutcome>) -> Report {
        let shares = self
            .accounts
            .iter()
            .map(|(name, who)| (name.clone(), self.pool.share_of(who)))
            .filter(|(_, held)| *held > 0)
            .collect();

        Report {
            steps,
            events: self.pool.take_events(),
            reserves: self.pool.reserves(),
            total_shares: self.pool.total_shares(),
            shares,
            spot_price: self.pool.spot_price(),
        }
    }
}

fn parse_address(value: &str) -> Result<Address> {
    if value.starts_with("0x") {
        value.parse().context("Address is not 20 bytes of hex")
    } else {
        Ok(Address::from_label(value))
    }
}
