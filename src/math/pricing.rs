//! Constant-product pricing shared by pools and the arbitrage executor.
//!
//! Every function here is pure: pools call them to price live swaps and the
//! executor calls them to simulate legs before committing anything.

use rust_decimal::{Decimal, MathematicalOps};
use serde::Serialize;

use super::fixed::{
    checked_add, checked_div, checked_mul, checked_sub, mul_div_floor, truncate, Amount,
};
use crate::error::PoolError;

/// Result of pricing one swap against a pair of reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapOutput {
    /// Output token paid to the trader.
    pub amount_out: Amount,
    /// Input-side fee retained in the reserve.
    pub fee: Amount,
    /// Input after fee, the part that moves the price.
    pub amount_in_eff: Amount,
}

/// Spot price `reserve_a / reserve_b`: token A per unit of token B.
pub fn spot_price(reserve_a: Amount, reserve_b: Amount) -> Result<Decimal, PoolError> {
    if reserve_b.is_zero() {
        return Err(PoolError::DivisionByZero);
    }
    checked_div(reserve_a, reserve_b).map(truncate)
}

/// Price a swap of `amount_in` with an input-side fee.
///
/// `amount_out = reserve_out - reserve_in * reserve_out / (reserve_in + amount_in_eff)`,
/// evaluated as `reserve_out * amount_in_eff / (reserve_in + amount_in_eff)` and
/// truncated so rounding always favours the pool. Large reserves fall back to
/// ratio scaling in [`mul_div_floor`].
pub fn swap_output(
    amount_in: Amount,
    reserve_in: Amount,
    reserve_out: Amount,
    fee_rate: Decimal,
) -> Result<SwapOutput, PoolError> {
    if amount_in <= Decimal::ZERO {
        return Err(PoolError::InvalidAmount(amount_in));
    }

    let fee = truncate(checked_mul(amount_in, fee_rate)?);
    let amount_in_eff = checked_sub(amount_in, fee)?;
    let denominator = checked_add(reserve_in, amount_in_eff)?;
    if denominator.is_zero() {
        return Err(PoolError::InsufficientLiquidity);
    }

    let amount_out = mul_div_floor(reserve_out, amount_in_eff, denominator)?;

    Ok(SwapOutput {
        amount_out,
        fee,
        amount_in_eff,
    })
}

/// Percentage deviation of the realized rate from the pre-swap rate.
///
/// Negative for a normal swap: the trader always gets less than spot.
pub fn slippage(
    actual_out: Amount,
    amount_in: Amount,
    reserve_in_before: Amount,
    reserve_out_before: Amount,
) -> Result<Decimal, PoolError> {
    let realized = checked_div(actual_out, amount_in)?;
    let expected = checked_div(reserve_out_before, reserve_in_before)?;
    let deviation = checked_div(checked_sub(realized, expected)?, expected)?;
    checked_mul(deviation, Decimal::ONE_HUNDRED)
}

/// Profit-maximising input for a two-leg constant-product round trip.
///
/// Leg one trades `X -> Y` against `(leg1_reserve_in, leg1_reserve_out)`, leg two
/// trades `Y -> X` against `(leg2_reserve_in, leg2_reserve_out)`. The composition of
/// two constant-product curves is itself a constant-product curve with virtual
/// reserves `e_in`, `e_out`, so the optimum is `(sqrt(g * e_in * e_out) - e_in) / g`.
///
/// Returns `None` when no positive input makes a profit.
pub fn optimal_round_trip_input(
    leg1_reserve_in: Amount,
    leg1_reserve_out: Amount,
    leg2_reserve_in: Amount,
    leg2_reserve_out: Amount,
    fee_1: Decimal,
    fee_2: Decimal,
) -> Result<Option<Amount>, PoolError> {
    let gamma_1 = Decimal::ONE - fee_1;
    let gamma_2 = Decimal::ONE - fee_2;

    let combined = checked_add(leg2_reserve_in, checked_mul(gamma_2, leg1_reserve_out)?)?;
    let e_in = checked_div(checked_mul(leg1_reserve_in, leg2_reserve_in)?, combined)?;
    let e_out = checked_div(
        checked_mul(gamma_2, checked_mul(leg1_reserve_out, leg2_reserve_out)?)?,
        combined,
    )?;

    if checked_mul(gamma_1, e_out)? <= e_in {
        return Ok(None);
    }

    let root = checked_mul(checked_mul(gamma_1, e_in)?, e_out)?
        .sqrt()
        .ok_or(PoolError::Overflow)?;
    let amount = truncate(checked_div(checked_sub(root, e_in)?, gamma_1)?);

    Ok((amount > Decimal::ZERO).then_some(amount))
}
