//! Events emitted by completed pool operations
//!
//! Events are for observability only; nothing in the pool reads them back.

use crate::ledger::Address;
use crate::pricing::SwapDirection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PoolEvent {
    Initialized {
        provider: Address,
        native_amount: u128,
        token_amount: u128,
        shares: u128,
    },
    Swap {
        trader: Address,
        direction: SwapDirection,
        input_amount: u128,
        output_amount: u128,
    },
    LiquidityProvided {
        provider: Address,
        native_amount: u128,
        token_amount: u128,
        shares_minted: u128,
    },
    LiquidityRemoved {
        provider: Address,
        shares_burned: u128,
        native_amount: u128,
        token_amount: u128,
    },
}

impl PoolEvent {
    /// Account that triggered the event
    pub fn actor(&self) -> &Address {
        match self {
            PoolEvent::Initialized { provider, .. }
            | PoolEvent::LiquidityProvided { provider, .. }
            | PoolEvent::LiquidityRemoved { provider, .. } => provider,
            PoolEvent::Swap { trader, .. } => trader,
        }
    }
}
