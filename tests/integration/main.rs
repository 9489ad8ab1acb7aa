//! Integration tests for pools and the arbitrage executor.
//!
//! Everything runs against the in-memory ledger; no environment is required.
//! Run with: cargo test --test integration

mod concurrency;
mod helpers;
mod scenarios;
