//! Pool identifiers, directions, quotes and read-only views.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rust_decimal::Decimal;
use serde::Serialize;
use strum::{Display, EnumString};

use crate::ledger::AccountId;
use crate::math::Amount;

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique pool identifier. Multi-pool operations lock in ascending id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PoolId(u64);

impl PoolId {
    /// Allocate the next identifier.
    pub fn next() -> Self {
        Self(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool-{}", self.0)
    }
}

/// Which reserve a swap takes from the trader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
pub enum SwapDirection {
    /// Token A in, token B out.
    #[strum(to_string = "a_to_b", serialize = "AtoB")]
    AToB,
    /// Token B in, token A out.
    #[strum(to_string = "b_to_a", serialize = "BtoA")]
    BToA,
}

impl SwapDirection {
    /// The opposite direction.
    pub fn reverse(&self) -> Self {
        match self {
            SwapDirection::AToB => SwapDirection::BToA,
            SwapDirection::BToA => SwapDirection::AToB,
        }
    }
}

/// Priced but not yet executed swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapQuote {
    /// Swap direction.
    pub direction: SwapDirection,
    /// Input amount, fee included.
    pub amount_in: Amount,
    /// Output paid to the trader.
    pub amount_out: Amount,
    /// Fee retained in the input reserve.
    pub fee: Amount,
    /// Input reserve before the swap.
    pub reserve_in: Amount,
    /// Output reserve before the swap.
    pub reserve_out: Amount,
    /// Realized rate vs pre-swap rate, in percent.
    pub slippage_pct: Decimal,
}

/// Executed swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapReceipt {
    /// Pool the swap ran against.
    pub pool_id: PoolId,
    /// Swap direction.
    pub direction: SwapDirection,
    /// Input amount pulled from the trader.
    pub amount_in: Amount,
    /// Output amount pushed to the trader.
    pub amount_out: Amount,
    /// Fee retained by the pool.
    pub fee: Amount,
    /// Realized rate vs pre-swap rate, in percent.
    pub slippage_pct: Decimal,
}

impl SwapReceipt {
    pub(crate) fn from_quote(pool_id: PoolId, quote: &SwapQuote) -> Self {
        Self {
            pool_id,
            direction: quote.direction,
            amount_in: quote.amount_in,
            amount_out: quote.amount_out,
            fee: quote.fee,
            slippage_pct: quote.slippage_pct,
        }
    }
}

/// Point-in-time view of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    /// Pool identifier.
    pub pool_id: PoolId,
    /// Token A reserve.
    pub reserve_a: Amount,
    /// Token B reserve.
    pub reserve_b: Amount,
    /// Outstanding liquidity shares.
    pub total_shares: Amount,
    /// `reserve_a / reserve_b`, absent while the pool is empty.
    pub spot_price: Option<Decimal>,
    /// Total value locked, denominated in token A.
    pub tvl_in_a: Amount,
    /// Fee charged by the latest A-side swap.
    pub last_fee_a: Amount,
    /// Fee charged by the latest B-side swap.
    pub last_fee_b: Amount,
    /// Number of accounts holding shares.
    pub providers: usize,
}

/// An account's claim on a pool, derived from its share balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiquidityPosition {
    /// Share holder.
    pub account: AccountId,
    /// Shares held.
    pub shares: Amount,
    /// `shares / total_shares`.
    pub share_fraction: Decimal,
    /// Token A the shares would redeem for now.
    pub claim_a: Amount,
    /// Token B the shares would redeem for now.
    pub claim_b: Amount,
}

impl LiquidityPosition {
    /// Whether the account holds any shares.
    pub fn is_empty(&self) -> bool {
        self.shares.is_zero()
    }
}
