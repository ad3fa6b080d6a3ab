//! Simulator defaults
//!
//! Default values shared by the configuration loader and the simulator binary.

/// Configuration file used when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "config/pool_simulator.toml";

/// Environment variable prefix for overrides, e.g. `AMM_GLOBAL__LOG_LEVEL=debug`
pub const ENV_PREFIX: &str = "AMM";

/// Separator between nested keys in environment overrides
pub const ENV_SEPARATOR: &str = "__";

/// Label of the pool's own account when the config names none
pub const DEFAULT_POOL_LABEL: &str = "pool";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Address width; account labels longer than this would truncate into each other
pub const LABEL_MAX_BYTES: usize = 20;
