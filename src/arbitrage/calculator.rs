//! Round-trip simulation for arbitrage between two pools.

use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;

use super::detector::{detect_route, ArbitrageRoute};
use crate::error::ArbitrageError;
use crate::math::fixed::{checked_div, checked_mul, checked_sub};
use crate::math::{optimal_round_trip_input, Amount};
use crate::pool::PoolState;

/// Simulated two-leg round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArbitrageQuote {
    /// Swap directions on each pool.
    pub route: ArbitrageRoute,
    /// Spot price of the first pool when quoted.
    pub price_1: Decimal,
    /// Spot price of the second pool when quoted.
    pub price_2: Decimal,
    /// Amount put into leg one.
    pub amount_in: Amount,
    /// Output of leg one, input of leg two.
    pub intermediate_out: Amount,
    /// Output of leg two, in the start token.
    pub final_out: Amount,
    /// `final_out - amount_in`; negative when the trip loses.
    pub profit: Decimal,
    /// Fee charged by leg one, in the start token.
    pub fee_1: Amount,
    /// Fee charged by leg two, in the intermediate token.
    pub fee_2: Amount,
    /// Timestamp when the quote was computed.
    pub quoted_at: OffsetDateTime,
}

impl ArbitrageQuote {
    /// Profit as a percentage of the input.
    pub fn roi(&self) -> Decimal {
        checked_div(self.profit, self.amount_in)
            .and_then(|ratio| checked_mul(ratio, Decimal::ONE_HUNDRED))
            .unwrap_or_default()
    }

    /// Whether the trip clears `min_profit`.
    pub fn is_profitable(&self, min_profit: Decimal) -> bool {
        self.profit > min_profit
    }
}

/// Simulate both legs of a round trip of `amount_in` against pool states.
///
/// Leg two is priced against the second pool's untouched reserves: the legs
/// run on different pools, so leg one cannot move them.
pub fn calculate_round_trip(
    state_1: &PoolState,
    fee_rate_1: Decimal,
    state_2: &PoolState,
    fee_rate_2: Decimal,
    amount_in: Amount,
) -> Result<ArbitrageQuote, ArbitrageError> {
    if amount_in <= Decimal::ZERO {
        return Err(ArbitrageError::InvalidAmount(amount_in));
    }

    let price_1 = state_1.spot_price()?;
    let price_2 = state_2.spot_price()?;
    let route = detect_route(price_1, price_2).ok_or(ArbitrageError::Unprofitable {
        amount_in,
        amount_out: amount_in,
    })?;

    let leg_1 = state_1.quote_swap(route.leg_1, amount_in, fee_rate_1)?;
    let leg_2 = state_2.quote_swap(route.leg_2, leg_1.amount_out, fee_rate_2)?;

    Ok(ArbitrageQuote {
        route,
        price_1,
        price_2,
        amount_in,
        intermediate_out: leg_1.amount_out,
        final_out: leg_2.amount_out,
        profit: checked_sub(leg_2.amount_out, amount_in)?,
        fee_1: leg_1.fee,
        fee_2: leg_2.fee,
        quoted_at: OffsetDateTime::now_utc(),
    })
}

/// Profit-maximising input for the route the two pools currently imply.
///
/// `None` when prices are equal or the gap cannot pay the fees.
pub fn optimal_amount(
    state_1: &PoolState,
    fee_rate_1: Decimal,
    state_2: &PoolState,
    fee_rate_2: Decimal,
) -> Result<Option<Amount>, ArbitrageError> {
    let Some(route) = detect_route(state_1.spot_price()?, state_2.spot_price()?) else {
        return Ok(None);
    };

    let (leg1_in, leg1_out) = state_1.reserves_for(route.leg_1);
    let (leg2_in, leg2_out) = state_2.reserves_for(route.leg_2);

    Ok(optimal_round_trip_input(
        leg1_in, leg1_out, leg2_in, leg2_out, fee_rate_1, fee_rate_2,
    )?)
}
