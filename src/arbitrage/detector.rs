//! Arbitrage route detection from spot prices.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::pool::SwapDirection;

/// Ordered pair of swaps: `leg_1` on the first pool, `leg_2` on the second.
///
/// The round trip starts and ends in `leg_1`'s input token, which is also the
/// token profit is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ArbitrageRoute {
    /// Swap on the first pool.
    pub leg_1: SwapDirection,
    /// Swap on the second pool.
    pub leg_2: SwapDirection,
}

impl ArbitrageRoute {
    /// Route whose first leg is `leg_1`; the second leg swaps back.
    pub fn starting_with(leg_1: SwapDirection) -> Self {
        Self {
            leg_1,
            leg_2: leg_1.reverse(),
        }
    }

    /// Whether profit is denominated in token A.
    pub fn starts_in_a(&self) -> bool {
        self.leg_1 == SwapDirection::AToB
    }
}

impl fmt::Display for ArbitrageRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool_1 {} -> pool_2 {}", self.leg_1, self.leg_2)
    }
}

/// Pick the route for two spot prices (token A per token B).
///
/// B is cheaper on the first pool when `price_1 < price_2`, so buy B there
/// with A and sell it back for A on the second pool. The opposite gap runs the
/// mirror route starting in B. Equal prices have no route.
pub fn detect_route(price_1: Decimal, price_2: Decimal) -> Option<ArbitrageRoute> {
    match price_1.cmp(&price_2) {
        std::cmp::Ordering::Less => Some(ArbitrageRoute::starting_with(SwapDirection::AToB)),
        std::cmp::Ordering::Greater => Some(ArbitrageRoute::starting_with(SwapDirection::BToA)),
        std::cmp::Ordering::Equal => None,
    }
}

/// Quick check whether the price gap can pay both fees at the margin.
///
/// An infinitesimal round trip returns `(1 - fee_1) * (1 - fee_2) * high / low`
/// per unit put in, so anything at or below one can never be profitable.
pub fn quick_opportunity_check(
    price_1: Decimal,
    price_2: Decimal,
    fee_1: Decimal,
    fee_2: Decimal,
) -> bool {
    let low = price_1.min(price_2);
    let high = price_1.max(price_2);
    if low <= Decimal::ZERO {
        return false;
    }

    let retained = (Decimal::ONE - fee_1) * (Decimal::ONE - fee_2);
    match (high * retained).checked_div(low) {
        Some(marginal_return) => marginal_return > Decimal::ONE,
        None => false,
    }
}

/// Get diagnostic information about why two pools offer no opportunity.
pub fn diagnose_no_opportunity(
    price_1: Decimal,
    price_2: Decimal,
    fee_1: Decimal,
    fee_2: Decimal,
) -> NoOpportunityDiagnosis {
    let low = price_1.min(price_2);
    let gap_pct = if low > Decimal::ZERO {
        ((price_1.max(price_2) - low) / low) * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };
    let retained = (Decimal::ONE - fee_1) * (Decimal::ONE - fee_2);
    let fee_hurdle_pct = if retained > Decimal::ZERO {
        (Decimal::ONE / retained - Decimal::ONE) * Decimal::ONE_HUNDRED
    } else {
        Decimal::ONE_HUNDRED
    };

    let diagnosis = NoOpportunityDiagnosis {
        price_1,
        price_2,
        route: detect_route(price_1, price_2),
        gap_pct,
        fee_hurdle_pct,
    };
    debug!(%diagnosis, "No arbitrage opportunity");
    diagnosis
}

/// Diagnostic information for debugging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoOpportunityDiagnosis {
    /// Spot price of the first pool.
    pub price_1: Decimal,
    /// Spot price of the second pool.
    pub price_2: Decimal,
    /// Route the gap points to, if any.
    pub route: Option<ArbitrageRoute>,
    /// Price gap relative to the lower price, in percent.
    pub gap_pct: Decimal,
    /// Gap the two fees need before a marginal trade breaks even, in percent.
    pub fee_hurdle_pct: Decimal,
}

impl fmt::Display for NoOpportunityDiagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "price_1={} price_2={} gap={}% (fee hurdle={}%) | route={}",
            self.price_1,
            self.price_2,
            self.gap_pct.round_dp(6),
            self.fee_hurdle_pct.round_dp(6),
            self.route
                .map(|r| r.to_string())
                .unwrap_or_else(|| "none".to_string()),
        )
    }
}
