//! Simulator Configuration Module
//!
//! Loads the pool simulator's scenario from a TOML file with environment
//! variable overrides (`AMM_` prefix, `__` between nested keys).

use crate::defaults::{
    DEFAULT_LOG_LEVEL, DEFAULT_POOL_LABEL, ENV_PREFIX, ENV_SEPARATOR, LABEL_MAX_BYTES,
};
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Main simulator configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SimulatorConfig {
    /// Global settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// Pool account settings
    #[serde(default)]
    pub pool: PoolSettings,

    /// Accounts seeded on both ledgers before the run
    #[serde(default)]
    pub accounts: Vec<AccountSeed>,

    /// Operations replayed in order
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Global configuration settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GlobalConfig {
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PoolSettings {
    /// Label or `0x`-prefixed hex address of the pool's custody account
    pub address: String,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            address: DEFAULT_POOL_LABEL.to_string(),
        }
    }
}

/// Starting balances for one participant
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AccountSeed {
    pub name: String,
    #[serde(default)]
    pub native: u64,
    #[serde(default)]
    pub token: u64,
    /// Token allowance granted to the pool; defaults to the full token balance
    pub token_allowance: Option<u64>,
    /// Native payouts to this account are rejected
    #[serde(default)]
    pub reject_native: bool,
    /// Token payouts to this account are rejected
    #[serde(default)]
    pub reject_token: bool,
}

impl AccountSeed {
    pub fn allowance(&self) -> u64 {
        self.token_allowance.unwrap_or(self.token)
    }
}

/// One scripted pool operation
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Initialize { account: String, token: u64, native: u64 },
    SwapAToB { account: String, amount: u64 },
    SwapBToA { account: String, amount: u64 },
    ProvideLiquidity { account: String, native: u64 },
    WithdrawLiquidity { account: String, shares: u64 },
    Quote { input: u64, input_reserve: u64, output_reserve: u64 },
    ShareOf { account: String },
}

impl Step {
    /// Account the step acts for, if any
    pub fn account(&self) -> Option<&str> {
        match self {
            Step::Initialize { account, .. }
            | Step::SwapAToB { account, .. }
            | Step::SwapBToA { account, .. }
            | Step::ProvideLiquidity { account, .. }
            | Step::WithdrawLiquidity { account, .. }
            | Step::ShareOf { account } => Some(account),
            Step::Quote { .. } => None,
        }
    }
}

impl SimulatorConfig {
    /// Load configuration from a TOML file with environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_env(path, env_overrides())
    }

    /// Load with an explicit environment source layered over the file
    pub fn load_with_env(path: &Path, env: Environment) -> Result<Self> {
        info!("Loading simulator config: {:?}", path);

        let config = Config::builder()
            .add_source(File::from(path).required(true))
            .add_source(env)
            .build()
            .context("Failed to build configuration")?;

        let parsed: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        parsed.validate()?;

        debug!(
            accounts = parsed.accounts.len(),
            steps = parsed.steps.len(),
            "Simulator config loaded"
        );
        Ok(parsed)
    }

    /// Reject account names that would share an address and steps naming unknown accounts
    pub fn validate(&self) -> Result<()> {
        let pool_label = (!self.pool.address.starts_with("0x"))
            .then_some(self.pool.address.as_str());
        if let Some(label) = pool_label {
            check_label(label).context("Invalid pool label")?;
        }

        let mut names = HashSet::new();
        for account in &self.accounts {
            check_label(&account.name)?;
            if pool_label == Some(account.name.as_str()) {
                bail!("Account name collides with the pool label: {}", account.name);
            }
            if !names.insert(account.name.as_str()) {
                bail!("Duplicate account name: {}", account.name);
            }
        }

        for (index, step) in self.steps.iter().enumerate() {
            if let Some(account) = step.account() {
                if !names.contains(account) {
                    bail!("Step {} references unknown account: {}", index, account);
                }
            }
        }
        Ok(())
    }

    pub fn get_account(&self, name: &str) -> Option<&AccountSeed> {
        self.accounts.iter().find(|a| a.name == name)
    }
}

/// `AMM_GLOBAL__LOG_LEVEL` maps to `global.log_level`
pub fn env_overrides() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}

/// Labels become addresses byte for byte, so only names that fit and carry
/// no NUL map to distinct addresses
fn check_label(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("Account name is empty");
    }
    if name.len() > LABEL_MAX_BYTES {
        bail!("Account name longer than {} bytes: {}", LABEL_MAX_BYTES, name);
    }
    if name.contains('\0') {
        bail!("Account name contains a NUL byte: {:?}", name);
    }
    Ok(())
}

/// Convenience function to load configuration from an optional path
pub fn load_config(path: Option<&Path>) -> Result<SimulatorConfig> {
    let path = path.unwrap_or(Path::new(crate::defaults::DEFAULT_CONFIG_PATH));
    SimulatorConfig::load(path)
}
