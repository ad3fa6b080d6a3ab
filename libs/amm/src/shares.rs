//! Liquidity share bookkeeping
//!
//! `total` always equals the sum of all holder balances. Every mutation goes
//! through [`ShareLedger::credit`] or [`ShareLedger::debit`], which validate
//! before writing so a failed call leaves the ledger untouched.

use crate::error::{PoolError, PoolResult};
use crate::ledger::Address;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ShareLedger {
    total: u128,
    balances: HashMap<Address, u128>,
}

impl ShareLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> u128 {
        self.total
    }

    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Mint `amount` shares to `holder`
    pub fn credit(&mut self, holder: Address, amount: u128) -> PoolResult<()> {
        let total = self.total.checked_add(amount).ok_or(PoolError::Overflow)?;
        let balance = self
            .balance_of(&holder)
            .checked_add(amount)
            .ok_or(PoolError::Overflow)?;

        self.total = total;
        if balance > 0 {
            self.balances.insert(holder, balance);
        }
        Ok(())
    }

    /// Burn `amount` shares from `holder`
    pub fn debit(&mut self, holder: &Address, amount: u128) -> PoolResult<()> {
        let available = self.balance_of(holder);
        if available < amount {
            return Err(PoolError::InsufficientShares {
                requested: amount,
                available,
            });
        }

        self.total -= amount;
        let remaining = available - amount;
        if remaining == 0 {
            self.balances.remove(holder);
        } else {
            self.balances.insert(*holder, remaining);
        }
        Ok(())
    }

    /// Holders with a positive balance
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.balances.iter()
    }

    /// Recompute the holder sum and compare it with the running total
    pub fn verify(&self) -> PoolResult<()> {
        let sum = self
            .balances
            .values()
            .try_fold(0u128, |acc, v| acc.checked_add(*v))
            .ok_or(PoolError::Overflow)?;
        if sum != self.total {
            return Err(PoolError::InvariantViolation(format!(
                "share sum {} != total {}",
                sum, self.total
            )));
        }
        Ok(())
    }
}
