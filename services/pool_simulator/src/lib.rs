//! Pool simulator
//!
//! Seeds in-memory ledgers from a [`pool_config::SimulatorConfig`] and replays
//! its scripted steps against a single pool.

pub mod simulator;

pub use simulator::{Report, Simulator, StepOutcome, StepResult};
