//! Fixed-point helpers for 18-decimal token amounts.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

use crate::error::PoolError;

/// Token amount, price or share quantity with 18 fractional digits.
pub type Amount = Decimal;

/// Number of fractional digits every stored amount is truncated to.
pub const SCALE: u32 = 18;

/// Truncate toward zero to [`SCALE`] fractional digits.
pub fn truncate(value: Decimal) -> Amount {
    value.round_dp_with_strategy(SCALE, RoundingStrategy::ToZero)
}

/// `a + b`, reporting overflow instead of panicking.
pub fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal, PoolError> {
    a.checked_add(b).ok_or(PoolError::Overflow)
}

/// `a - b`, reporting overflow instead of panicking.
pub fn checked_sub(a: Decimal, b: Decimal) -> Result<Decimal, PoolError> {
    a.checked_sub(b).ok_or(PoolError::Overflow)
}

/// `a * b`, reporting overflow instead of panicking.
pub fn checked_mul(a: Decimal, b: Decimal) -> Result<Decimal, PoolError> {
    a.checked_mul(b).ok_or(PoolError::Overflow)
}

/// `a / b`, with a zero divisor reported as [`PoolError::DivisionByZero`].
pub fn checked_div(a: Decimal, b: Decimal) -> Result<Decimal, PoolError> {
    if b.is_zero() {
        return Err(PoolError::DivisionByZero);
    }
    a.checked_div(b).ok_or(PoolError::Overflow)
}

/// Smallest representable step at [`SCALE`].
const ULP: Decimal = Decimal::from_parts(1, 0, 0, false, SCALE);

/// `value * numerator / denominator`, truncated.
///
/// Multiplies first. When that product leaves the `Decimal` range, `value` is
/// scaled by the ratio instead. The ratio is truncated to [`SCALE`] and
/// lowered by one unit if `ratio * denominator` still exceeds `numerator`, so
/// the result never exceeds the exact quotient.
pub fn mul_div_floor(
    value: Amount,
    numerator: Amount,
    denominator: Amount,
) -> Result<Amount, PoolError> {
    if denominator.is_zero() {
        return Err(PoolError::DivisionByZero);
    }
    if let Some(product) = value.checked_mul(numerator) {
        return checked_div(product, denominator).map(truncate);
    }

    let mut ratio = truncate(checked_div(numerator, denominator)?);
    if checked_mul(ratio, denominator)? > numerator {
        ratio = checked_sub(ratio, ULP)?;
    }
    checked_mul(value, ratio).map(truncate)
}

/// `sqrt(a * b)`, truncated. Used to size the first liquidity deposit.
pub fn geometric_mean(a: Amount, b: Amount) -> Result<Amount, PoolError> {
    let product = checked_mul(a, b)?;
    product.sqrt().map(truncate).ok_or(PoolError::Overflow)
}

/// `|a - b| / max(|a|, |b|)`; zero when both are zero.
pub fn relative_difference(a: Decimal, b: Decimal) -> Decimal {
    let scale = a.abs().max(b.abs());
    if scale.is_zero() {
        return Decimal::ZERO;
    }
    (a - b).abs() / scale
}

/// Lossy conversion for metrics and log fields only.
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
