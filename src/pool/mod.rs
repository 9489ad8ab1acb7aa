//! Constant-product liquidity pools.
//!
//! This module handles:
//! - Reserve and liquidity-share bookkeeping
//! - Deposits, withdrawals and fee-charging swaps
//! - Read-only snapshots and liquidity positions

pub mod dex;
pub mod state;
pub mod types;

pub use dex::Pool;
pub use state::PoolState;
pub use types::{LiquidityPosition, PoolId, PoolSnapshot, SwapDirection, SwapQuote, SwapReceipt};
