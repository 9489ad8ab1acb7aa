//! Metrics for pool activity and arbitrage execution.
//!
//! This module provides metrics for:
//! - Deposits, withdrawals and swaps per pool
//! - Failed pool operations by kind
//! - Swap slippage and arbitrage profit distributions
//! - Arbitrage execution latency
//! - Reserve levels
//!
//! Only the `metrics` facade is used; installing a recorder is up to the caller.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use rust_decimal::Decimal;
use tracing::debug;

use crate::math::fixed::to_f64;
use crate::pool::{PoolId, SwapDirection};

// === Metric Name Constants ===

/// Deposits counter metric name.
pub const METRIC_DEPOSITS: &str = "pool_deposits_total";
/// Withdrawals counter metric name.
pub const METRIC_WITHDRAWALS: &str = "pool_withdrawals_total";
/// Swaps counter metric name.
pub const METRIC_SWAPS: &str = "pool_swaps_total";
/// Failed pool operations counter metric name.
pub const METRIC_POOL_FAILURES: &str = "pool_operation_failures_total";
/// Swap slippage histogram metric name.
pub const METRIC_SWAP_SLIPPAGE: &str = "pool_swap_slippage_pct";
/// Reserve gauge metric name.
pub const METRIC_RESERVE: &str = "pool_reserve";
/// Arbitrage executions counter metric name.
pub const METRIC_ARBITRAGE_EXECUTED: &str = "arbitrage_executed_total";
/// Arbitrage rejections counter metric name.
pub const METRIC_ARBITRAGE_REJECTED: &str = "arbitrage_rejected_total";
/// Arbitrage profit histogram metric name.
pub const METRIC_ARBITRAGE_PROFIT: &str = "arbitrage_profit";
/// Arbitrage execution latency metric name.
pub const METRIC_ARBITRAGE_LATENCY: &str = "arbitrage_execution_latency_ms";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_counter!(METRIC_DEPOSITS, "Total number of liquidity deposits");
    describe_counter!(METRIC_WITHDRAWALS, "Total number of liquidity withdrawals");
    describe_counter!(METRIC_SWAPS, "Total number of swaps by direction");
    describe_counter!(
        METRIC_POOL_FAILURES,
        "Total number of rejected pool operations by operation"
    );
    describe_counter!(
        METRIC_ARBITRAGE_EXECUTED,
        "Total number of arbitrage round trips executed"
    );
    describe_counter!(
        METRIC_ARBITRAGE_REJECTED,
        "Total number of arbitrage attempts rejected"
    );

    describe_histogram!(
        METRIC_SWAP_SLIPPAGE,
        "Swap slippage against pre-swap spot, in percent"
    );
    describe_histogram!(
        METRIC_ARBITRAGE_PROFIT,
        "Realized arbitrage profit in the route's start token"
    );
    describe_histogram!(
        METRIC_ARBITRAGE_LATENCY,
        "Arbitrage execution latency in milliseconds"
    );

    describe_gauge!(METRIC_RESERVE, "Current pool reserve by token side");

    debug!("Metrics initialized");
}

/// Increment deposit counter.
pub fn inc_deposits(pool: PoolId) {
    counter!(METRIC_DEPOSITS, "pool" => pool.to_string()).increment(1);
}

/// Increment withdrawal counter.
pub fn inc_withdrawals(pool: PoolId) {
    counter!(METRIC_WITHDRAWALS, "pool" => pool.to_string()).increment(1);
}

/// Record a completed swap and its slippage.
pub fn record_swap(pool: PoolId, direction: SwapDirection, slippage_pct: Decimal) {
    counter!(
        METRIC_SWAPS,
        "pool" => pool.to_string(),
        "direction" => direction.to_string()
    )
    .increment(1);
    histogram!(METRIC_SWAP_SLIPPAGE, "pool" => pool.to_string()).record(to_f64(slippage_pct));
}

/// Increment failure counter for a pool operation.
pub fn inc_pool_failures(pool: PoolId, operation: &'static str) {
    counter!(
        METRIC_POOL_FAILURES,
        "pool" => pool.to_string(),
        "operation" => operation
    )
    .increment(1);
}

/// Publish both reserves of a pool.
pub fn set_reserves(pool: PoolId, reserve_a: Decimal, reserve_b: Decimal) {
    gauge!(METRIC_RESERVE, "pool" => pool.to_string(), "side" => "a").set(to_f64(reserve_a));
    gauge!(METRIC_RESERVE, "pool" => pool.to_string(), "side" => "b").set(to_f64(reserve_b));
}

/// Record an executed arbitrage.
pub fn record_arbitrage_executed(profit: Decimal) {
    counter!(METRIC_ARBITRAGE_EXECUTED).increment(1);
    histogram!(METRIC_ARBITRAGE_PROFIT).record(to_f64(profit));
}

/// Increment arbitrage rejection counter.
pub fn inc_arbitrage_rejected(reason: &'static str) {
    counter!(METRIC_ARBITRAGE_REJECTED, "reason" => reason).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for an arbitrage execution.
pub fn timer_arbitrage() -> LatencyTimer {
    LatencyTimer::new(METRIC_ARBITRAGE_LATENCY)
}
