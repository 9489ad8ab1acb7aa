//! Constant-product AMM pools with a cross-pool arbitrage executor.
//!
//! A [`pool::Pool`] holds reserves of two tokens and a ledger of liquidity
//! shares. Traders swap against the reserves and pay an input-side fee that
//! stays in the pool, so the reserve product only ever grows:
//!
//! ```text
//! reserves:   200 A / 300 B       spot = 0.666.. A per B
//! swap in:    50 A  (fee 0.15 A, 49.85 A effective)
//! swap out:   300 * 49.85 / 249.85 = 59.856 B
//! reserves:   250 A / 240.144 B
//! ```
//!
//! An [`arbitrage::ArbitrageExecutor`] watches two pools over the same pair and,
//! when their prices disagree by more than both fees, buys on the cheap pool
//! and sells on the dear one in a single all-or-nothing round trip.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`ledger`]: Token ledger contract and in-memory ledger
//! - [`math`]: Fixed-point amounts, pricing and slippage
//! - [`pool`]: Liquidity pools
//! - [`arbitrage`]: Route detection and atomic execution
//! - [`metrics`]: Metric names and recorders
//! - [`utils`]: Utility functions

pub mod arbitrage;
pub mod config;
pub mod error;
pub mod ledger;
pub mod math;
pub mod metrics;
pub mod pool;
pub mod utils;

pub use config::Config;
pub use error::{EngineError, Result};
