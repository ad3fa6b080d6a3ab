//! # Constant Product Pool Engine
//!
//! ## Purpose
//!
//! Pricing and liquidity engine for a two-asset constant product market maker
//! pairing a native value asset (asset A) with a fungible token (asset B).
//! Participants swap one asset for the other at the reserve ratio minus a 0.3%
//! input fee, and deposit or withdraw paired liquidity against proportional
//! shares of the pool.
//!
//! ## Integration Points
//!
//! - **Asset Custody**: Both reserves live in external ledgers behind the
//!   [`AssetLedger`] trait; the pool reads its own balances on every operation
//! - **Share Accounting**: [`ShareLedger`] tracks provider claims, with
//!   `total_shares == sum(shares)` held at all times
//! - **Observability**: Completed operations emit [`PoolEvent`]s and `tracing` spans
//! - **Concurrency**: [`SharedPool`] serializes operations across threads and
//!   rejects re-entrant calls from ledger hooks
//!
//! ## Arithmetic
//!
//! - Unsigned 128-bit integers only, every multiplication checked
//! - Truncating division always rounds in the pool's favour
//! - Deposit and withdrawal ratios divide before multiplying; small pools with a
//!   high reserve-per-share ratio can mint zero shares on deposit

pub mod error;
pub mod events;
pub mod ledger;
pub mod pool;
pub mod pricing;
pub mod shared;
pub mod shares;

pub use error::{PoolError, PoolResult};
pub use events::PoolEvent;
pub use ledger::{Address, Asset, AssetLedger, InMemoryLedger};
pub use pool::{Pool, Reserves};
pub use pricing::{quote, quote_input, SwapDirection, FEE_DENOMINATOR, FEE_NUMERATOR};
pub use shared::SharedPool;
pub use shares::ShareLedger;

/// Common types for price reporting
pub use rust_decimal::Decimal;
