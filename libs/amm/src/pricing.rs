//! Constant product pricing with a 0.3% input fee
//!
//! All swap math stays in unsigned integers. The fee is applied by scaling the
//! input by 997/1000 inside a single division, and every division truncates,
//! so rounding always favours the pool.

use crate::error::{PoolError, PoolResult};
use crate::ledger::Asset;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Input multiplier after the fee skim
pub const FEE_NUMERATOR: u128 = 997;
/// Fee scale
pub const FEE_DENOMINATOR: u128 = 1000;

/// Swap direction; asset A is the native asset, asset B the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapDirection {
    /// Native in, token out
    AToB,
    /// Token in, native out
    BToA,
}

impl SwapDirection {
    /// (asset received by the pool, asset paid out)
    pub fn assets(self) -> (Asset, Asset) {
        match self {
            SwapDirection::AToB => (Asset::Native, Asset::Token),
            SwapDirection::BToA => (Asset::Token, Asset::Native),
        }
    }
}

/// Output amount for selling `input_amount` into the pool
///
/// ```text
/// input_with_fee = input_amount * 997
/// output = input_with_fee * output_reserve / (input_reserve * 1000 + input_with_fee)
/// ```
pub fn quote(input_amount: u128, input_reserve: u128, output_reserve: u128) -> PoolResult<u128> {
    if input_reserve == 0 || output_reserve == 0 {
        return Err(PoolError::InvalidReserve);
    }

    let input_with_fee = input_amount
        .checked_mul(FEE_NUMERATOR)
        .ok_or(PoolError::Overflow)?;
    let numerator = input_with_fee
        .checked_mul(output_reserve)
        .ok_or(PoolError::Overflow)?;
    let denominator = input_reserve
        .checked_mul(FEE_DENOMINATOR)
        .and_then(|scaled| scaled.checked_add(input_with_fee))
        .ok_or(PoolError::Overflow)?;

    Ok(numerator / denominator)
}

/// Minimum input that yields at least `output_amount` (reverse of [`quote`])
pub fn quote_input(
    output_amount: u128,
    input_reserve: u128,
    output_reserve: u128,
) -> PoolResult<u128> {
    if output_amount == 0 {
        return Err(PoolError::ZeroInput);
    }
    if input_reserve == 0 || output_amount >= output_reserve {
        return Err(PoolError::InvalidReserve);
    }

    let numerator = input_reserve
        .checked_mul(output_amount)
        .and_then(|n| n.checked_mul(FEE_DENOMINATOR))
        .ok_or(PoolError::Overflow)?;
    let denominator = (output_reserve - output_amount)
        .checked_mul(FEE_NUMERATOR)
        .ok_or(PoolError::Overflow)?;

    // Add 1 to round up (ensures sufficient input)
    Ok(numerator / denominator + 1)
}

/// Spot price of the input asset in units of the output asset
pub fn spot_price(input_reserve: u128, output_reserve: u128) -> Option<Decimal> {
    if input_reserve == 0 {
        return None;
    }
    let input = Decimal::try_from_i128_with_scale(i128::try_from(input_reserve).ok()?, 0).ok()?;
    let output =
        Decimal::try_from_i128_with_scale(i128::try_from(output_reserve).ok()?, 0).ok()?;
    output.checked_div(input)
}

/// Price impact of a trade as a percentage of the pre-trade spot price
pub fn price_impact(
    input_amount: u128,
    input_reserve: u128,
    output_reserve: u128,
) -> PoolResult<Decimal> {
    let output = quote(input_amount, input_reserve, output_reserve)?;
    let before = spot_price(input_reserve, output_reserve).ok_or(PoolError::Overflow)?;
    let new_input = input_reserve
        .checked_add(input_amount)
        .ok_or(PoolError::Overflow)?;
    let after = spot_price(new_input, output_reserve - output).ok_or(PoolError::Overflow)?;

    if before.is_zero() {
        return Err(PoolError::InvalidReserve);
    }
    Ok((before - after).abs() / before * Decimal::ONE_HUNDRED)
}
