//! Price and slippage calculations.
//!
//! This module handles:
//! - 18-decimal fixed-point amounts and checked arithmetic
//! - Spot price, constant-product swap output and slippage
//! - Optimal sizing of a two-pool round trip

pub mod fixed;
pub mod pricing;

pub use fixed::{geometric_mean, mul_div_floor, truncate, Amount, SCALE};
pub use pricing::{optimal_round_trip_input, slippage, spot_price, swap_output, SwapOutput};
