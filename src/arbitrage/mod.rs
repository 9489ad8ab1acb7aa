//! Arbitrage module for detecting and executing opportunities.
//!
//! This module handles:
//! - Route detection from two pools' spot prices
//! - Round-trip simulation and optimal sizing
//! - Atomic execution with unwind on failure

pub mod calculator;
pub mod detector;
pub mod executor;

pub use calculator::{calculate_round_trip, optimal_amount, ArbitrageQuote};
pub use detector::{
    detect_route, diagnose_no_opportunity, quick_opportunity_check, ArbitrageRoute,
    NoOpportunityDiagnosis,
};
pub use executor::{ArbitrageExecutor, ArbitrageReport, ExecutorStats};
