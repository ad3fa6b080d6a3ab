//! # Pool Simulator Configuration
//!
//! Scenario configuration for the pool simulator: global logging settings,
//! the pool's custody account, seeded participant balances, and the scripted
//! list of operations to replay.
//!
//! ## Usage
//!
//! ```no_run
//! use pool_config::{load_config, Step};
//!
//! let config = load_config(None).unwrap();
//! for step in &config.steps {
//!     if let Step::SwapAToB { account, amount } = step {
//!         println!("{} sells {} native", account, amount);
//!     }
//! }
//! ```

pub mod defaults;
pub mod simulator_config;

// Re-export commonly used types
pub use simulator_config::{
    env_overrides, load_config, AccountSeed, GlobalConfig, PoolSettings, SimulatorConfig, Step,
};
