//! Pool error taxonomy
//!
//! Every variant is terminal for the operation that raised it. Callers are
//! expected to surface the kind verbatim; the pool performs no recovery.

use crate::ledger::Asset;
use thiserror::Error;

/// Errors raised by pool operations and the pricing formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("Pool already initialized")]
    AlreadyInitialized,

    #[error("Pool not initialized")]
    NotInitialized,

    #[error("Input amount must be positive")]
    ZeroInput,

    #[error("Reserves must be positive")]
    InvalidReserve,

    #[error("Insufficient shares: requested {requested}, available {available}")]
    InsufficientShares { requested: u128, available: u128 },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("{0} transfer rejected by ledger")]
    TransferFailed(Asset),

    /// A ledger callback tried to enter the pool while an operation was in flight
    #[error("Re-entrant pool call rejected")]
    Reentrancy,

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

pub type PoolResult<T> = Result<T, PoolError>;
