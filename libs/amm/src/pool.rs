//! Constant product pool over two external asset ledgers
//!
//! The pool keeps only the share ledger. Reserves are the pool address's
//! balances on the native and token ledgers, read fresh by every operation.
//! Inputs are pulled into custody before any math runs, so the pre-trade
//! reserve of the input asset is the current balance minus the input.

use crate::error::{PoolError, PoolResult};
use crate::events::PoolEvent;
use crate::ledger::{Address, Asset, AssetLedger, InMemoryLedger};
use crate::pricing::{self, SwapDirection};
use crate::shares::ShareLedger;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Snapshot of the pool's custody on both ledgers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reserves {
    pub native: u128,
    pub token: u128,
}

impl Reserves {
    pub fn of(&self, asset: Asset) -> u128 {
        match asset {
            Asset::Native => self.native,
            Asset::Token => self.token,
        }
    }
}

/// Amounts computed for a deposit before any funds move
#[derive(Debug, Clone, Copy)]
struct DepositTerms {
    token_required: u128,
    shares_minted: u128,
}

#[derive(Debug)]
pub struct Pool<N = InMemoryLedger, T = InMemoryLedger> {
    address: Address,
    native: N,
    token: T,
    shares: ShareLedger,
    events: Vec<PoolEvent>,
}

impl<N: AssetLedger, T: AssetLedger> Pool<N, T> {
    /// Create an empty pool holding custody at `address` on both ledgers
    pub fn new(address: Address, native: N, token: T) -> Self {
        Self {
            address,
            native,
            token,
            shares: ShareLedger::new(),
            events: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn native_ledger(&self) -> &N {
        &self.native
    }

    pub fn native_ledger_mut(&mut self) -> &mut N {
        &mut self.native
    }

    pub fn token_ledger(&self) -> &T {
        &self.token
    }

    pub fn token_ledger_mut(&mut self) -> &mut T {
        &mut self.token
    }

    pub fn total_shares(&self) -> u128 {
        self.shares.total()
    }

    /// Liquidity share held by `holder`; zero when absent
    pub fn share_of(&self, holder: &Address) -> u128 {
        self.shares.balance_of(holder)
    }

    pub fn shares(&self) -> &ShareLedger {
        &self.shares
    }

    pub fn is_initialized(&self) -> bool {
        self.shares.total() > 0
    }

    pub fn reserves(&self) -> Reserves {
        Reserves {
            native: self.balance(Asset::Native),
            token: self.balance(Asset::Token),
        }
    }

    /// Native asset price in token units
    pub fn spot_price(&self) -> Option<Decimal> {
        let reserves = self.reserves();
        pricing::spot_price(reserves.native, reserves.token)
    }

    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    /// Drain emitted events
    pub fn take_events(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.events)
    }

    /// Seed the pool with its first liquidity.
    ///
    /// Pulls `attached` native units and `token_amount` tokens from `caller` and
    /// mints `attached` shares to them. Returns the new `total_shares`.
    pub fn initialize(
        &mut self,
        caller: Address,
        token_amount: u128,
        attached: u128,
    ) -> PoolResult<u128> {
        if self.shares.total() != 0 {
            return Err(PoolError::AlreadyInitialized);
        }
        if token_amount == 0 || attached == 0 {
            return Err(PoolError::ZeroInput);
        }

        self.pull(Asset::Native, caller, attached)?;
        if let Err(e) = self.pull(Asset::Token, caller, token_amount) {
            self.refund(Asset::Native, caller, attached);
            return Err(e);
        }

        self.shares.credit(caller, attached)?;
        let total = self.shares.total();

        info!(
            provider = %caller,
            native = attached,
            token = token_amount,
            total_shares = total,
            "Pool initialized"
        );
        self.events.push(PoolEvent::Initialized {
            provider: caller,
            native_amount: attached,
            token_amount,
            shares: total,
        });
        Ok(total)
    }

    /// Quote a swap against current reserves without moving funds
    pub fn preview_swap(&self, direction: SwapDirection, input_amount: u128) -> PoolResult<u128> {
        let (asset_in, asset_out) = direction.assets();
        let reserves = self.reserves();
        pricing::quote(input_amount, reserves.of(asset_in), reserves.of(asset_out))
    }

    /// Sell native for tokens
    pub fn swap_a_to_b(&mut self, caller: Address, input_amount: u128) -> PoolResult<u128> {
        self.swap(caller, SwapDirection::AToB, input_amount)
    }

    /// Sell tokens for native; requires prior token allowance to the pool
    pub fn swap_b_to_a(&mut self, caller: Address, input_amount: u128) -> PoolResult<u128> {
        self.swap(caller, SwapDirection::BToA, input_amount)
    }

    /// Execute a swap in either direction, returning the amount paid out.
    ///
    /// The input is received first; if pricing or the payout fails it is
    /// returned to the caller and no state changes.
    pub fn swap(
        &mut self,
        caller: Address,
        direction: SwapDirection,
        input_amount: u128,
    ) -> PoolResult<u128> {
        if input_amount == 0 {
            return Err(PoolError::ZeroInput);
        }
        if !self.is_initialized() {
            return Err(PoolError::NotInitialized);
        }

        let (asset_in, asset_out) = direction.assets();
        self.pull(asset_in, caller, input_amount)?;

        let output = match self.swap_output(asset_in, asset_out, input_amount) {
            Ok(output) => output,
            Err(e) => {
                self.refund(asset_in, caller, input_amount);
                return Err(e);
            }
        };

        if let Err(e) = self.pay(asset_out, caller, output) {
            self.refund(asset_in, caller, input_amount);
            return Err(e);
        }

        info!(
            trader = %caller,
            ?direction,
            input = input_amount,
            output,
            "Swap executed"
        );
        self.events.push(PoolEvent::Swap {
            trader: caller,
            direction,
            input_amount,
            output_amount: output,
        });
        Ok(output)
    }

    fn swap_output(&self, asset_in: Asset, asset_out: Asset, input_amount: u128) -> PoolResult<u128> {
        let reserve_in = self
            .balance(asset_in)
            .checked_sub(input_amount)
            .ok_or(PoolError::InvalidReserve)?;
        let reserve_out = self.balance(asset_out);

        let output = pricing::quote(input_amount, reserve_in, reserve_out)?;
        debug!(reserve_in, reserve_out, input_amount, output, "Swap quoted");

        // A payout that empties the output reserve is never allowed
        if output >= reserve_out {
            return Err(PoolError::InvalidReserve);
        }
        Ok(output)
    }

    /// Add liquidity at the current ratio.
    ///
    /// `attached` native units define the deposit; the matching token amount
    /// (rounded up by one) is pulled from `caller`. Returns the tokens pulled.
    pub fn provide_liquidity(&mut self, caller: Address, attached: u128) -> PoolResult<u128> {
        let total = self.shares.total();
        if total == 0 {
            return Err(PoolError::NotInitialized);
        }
        if attached == 0 {
            return Err(PoolError::ZeroInput);
        }

        self.pull(Asset::Native, caller, attached)?;

        let terms = match self.deposit_terms(attached, total) {
            Ok(terms) => terms,
            Err(e) => {
                self.refund(Asset::Native, caller, attached);
                return Err(e);
            }
        };

        if let Err(e) = self.shares.credit(caller, terms.shares_minted) {
            self.refund(Asset::Native, caller, attached);
            return Err(e);
        }

        if let Err(e) = self.pull(Asset::Token, caller, terms.token_required) {
            self.shares.debit(&caller, terms.shares_minted)?;
            self.refund(Asset::Native, caller, attached);
            return Err(e);
        }

        info!(
            provider = %caller,
            native = attached,
            token = terms.token_required,
            minted = terms.shares_minted,
            "Liquidity provided"
        );
        self.events.push(PoolEvent::LiquidityProvided {
            provider: caller,
            native_amount: attached,
            token_amount: terms.token_required,
            shares_minted: terms.shares_minted,
        });
        Ok(terms.token_required)
    }

    fn deposit_terms(&self, attached: u128, total: u128) -> PoolResult<DepositTerms> {
        let native_reserve = self
            .balance(Asset::Native)
            .checked_sub(attached)
            .ok_or(PoolError::InvalidReserve)?;
        if native_reserve == 0 {
            return Err(PoolError::InvalidReserve);
        }
        let token_reserve = self.balance(Asset::Token);

        let token_required = attached
            .checked_mul(token_reserve)
            .map(|n| n / native_reserve)
            .and_then(|n| n.checked_add(1))
            .ok_or(PoolError::Overflow)?;
        // Ratio is truncated before scaling; small pools can mint zero shares
        let shares_minted = attached
            .checked_mul(total / native_reserve)
            .ok_or(PoolError::Overflow)?;

        debug!(native_reserve, token_reserve, token_required, shares_minted, "Deposit terms");
        Ok(DepositTerms {
            token_required,
            shares_minted,
        })
    }

    /// Burn `amount` shares and pay out the proportional reserves.
    ///
    /// Native is paid before tokens. If the native payment fails the burn is
    /// undone. If the token payment fails the native payment and the burn
    /// stand, and `TransferFailed(Token)` is returned.
    pub fn withdraw_liquidity(&mut self, caller: Address, amount: u128) -> PoolResult<(u128, u128)> {
        if amount == 0 {
            return Err(PoolError::ZeroInput);
        }
        let available = self.shares.balance_of(&caller);
        if available < amount {
            return Err(PoolError::InsufficientShares {
                requested: amount,
                available,
            });
        }

        let total = self.shares.total();
        let reserves = self.reserves();
        // Ratio is truncated before scaling, matching deposits
        let native_out = amount
            .checked_mul(reserves.native / total)
            .ok_or(PoolError::Overflow)?;
        let token_out = amount
            .checked_mul(reserves.token / total)
            .ok_or(PoolError::Overflow)?;

        self.shares.debit(&caller, amount)?;

        if let Err(e) = self.pay(Asset::Native, caller, native_out) {
            self.shares.credit(caller, amount)?;
            return Err(e);
        }
        if let Err(e) = self.pay(Asset::Token, caller, token_out) {
            error!(
                provider = %caller,
                shares_burned = amount,
                native_paid = native_out,
                token_owed = token_out,
                "Token leg failed after native payment; withdrawal left partially applied"
            );
            return Err(e);
        }

        info!(
            provider = %caller,
            burned = amount,
            native = native_out,
            token = token_out,
            "Liquidity removed"
        );
        self.events.push(PoolEvent::LiquidityRemoved {
            provider: caller,
            shares_burned: amount,
            native_amount: native_out,
            token_amount: token_out,
        });
        Ok((native_out, token_out))
    }

    /// Verify share bookkeeping and reserve positivity
    pub fn check_invariants(&self) -> PoolResult<()> {
        self.shares.verify()?;
        if self.is_initialized() {
            let reserves = self.reserves();
            if reserves.native == 0 || reserves.token == 0 {
                return Err(PoolError::InvariantViolation(format!(
                    "empty reserve with {} shares outstanding: {:?}",
                    self.shares.total(),
                    reserves
                )));
            }
        }
        Ok(())
    }

    fn balance(&self, asset: Asset) -> u128 {
        match asset {
            Asset::Native => self.native.balance_of(&self.address),
            Asset::Token => self.token.balance_of(&self.address),
        }
    }

    fn ledger_mut(&mut self, asset: Asset) -> &mut dyn AssetLedger {
        match asset {
            Asset::Native => &mut self.native,
            Asset::Token => &mut self.token,
        }
    }

    fn pull(&mut self, asset: Asset, from: Address, amount: u128) -> PoolResult<()> {
        let pool = self.address;
        if self.ledger_mut(asset).transfer_from(&pool, &from, &pool, amount) {
            Ok(())
        } else {
            warn!(%asset, %from, amount, "Inbound transfer rejected");
            Err(PoolError::TransferFailed(asset))
        }
    }

    fn pay(&mut self, asset: Asset, to: Address, amount: u128) -> PoolResult<()> {
        let pool = self.address;
        if self.ledger_mut(asset).transfer(&pool, &to, amount) {
            Ok(())
        } else {
            warn!(%asset, %to, amount, "Outbound transfer rejected");
            Err(PoolError::TransferFailed(asset))
        }
    }

    /// Return funds received earlier in a failed operation
    fn refund(&mut self, asset: Asset, to: Address, amount: u128) {
        let pool = self.address;
        if !self.ledger_mut(asset).transfer(&pool, &to, amount) {
            error!(%asset, %to, amount, "Refund rejected; funds remain in pool custody");
        }
    }
}
