//! Atomic two-pool arbitrage execution.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, error, info, instrument, warn};

use super::calculator::{calculate_round_trip, optimal_amount, ArbitrageQuote};
use super::detector::{diagnose_no_opportunity, ArbitrageRoute};
use crate::config::Config;
use crate::error::ArbitrageError;
use crate::ledger::{AccountId, TokenId, TokenLedger};
use crate::math::fixed::relative_difference;
use crate::math::Amount;
use crate::metrics;
use crate::pool::{Pool, PoolState, SwapReceipt};

/// Outcome of an executed round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArbitrageReport {
    /// Swap directions on each pool.
    pub route: ArbitrageRoute,
    /// Token the trip starts and ends in.
    pub profit_token: TokenId,
    /// Amount taken from the caller.
    pub amount_in: Amount,
    /// Amount paid back to the caller.
    pub amount_out: Amount,
    /// Realized profit in `profit_token`.
    pub profit: Decimal,
    /// First leg, on the first pool.
    pub leg_1: SwapReceipt,
    /// Second leg, on the second pool.
    pub leg_2: SwapReceipt,
    /// Completion timestamp.
    pub executed_at: OffsetDateTime,
}

/// Running totals for one executor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutorStats {
    /// Calls to any execute method.
    pub attempts: u64,
    /// Round trips completed.
    pub executions: u64,
    /// Attempts refused as unprofitable or stale.
    pub rejections: u64,
    /// Attempts that failed for any other reason.
    pub failures: u64,
    /// Accumulated profit from routes starting in token A.
    pub profit_a: Decimal,
    /// Accumulated profit from routes starting in token B.
    pub profit_b: Decimal,
    /// Timestamp of the last completed round trip.
    pub last_execution: Option<OffsetDateTime>,
}

/// Executes round trips across two pools over the same token pair.
///
/// The executor trades under its own account: it pulls the start token from
/// the caller (who must approve the executor's account), swaps through both
/// pools and pays the whole output back to the caller.
#[derive(Debug)]
pub struct ArbitrageExecutor {
    account: AccountId,
    pool_1: Arc<Pool>,
    pool_2: Arc<Pool>,
    min_profit: Decimal,
    price_tolerance: Decimal,
    stats: Mutex<ExecutorStats>,
}

impl ArbitrageExecutor {
    /// Create an executor over two distinct pools of the same pair.
    pub fn new(
        account: AccountId,
        pool_1: Arc<Pool>,
        pool_2: Arc<Pool>,
        config: &Config,
    ) -> Result<Self, ArbitrageError> {
        if pool_1.id() == pool_2.id() || !pool_1.same_pair(&pool_2) {
            return Err(ArbitrageError::MismatchedPools);
        }

        Ok(Self {
            account,
            pool_1,
            pool_2,
            min_profit: config.min_profit,
            price_tolerance: config.price_tolerance,
            stats: Mutex::new(ExecutorStats::default()),
        })
    }

    /// Account the executor trades under.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// First pool.
    pub fn pool_1(&self) -> &Arc<Pool> {
        &self.pool_1
    }

    /// Second pool.
    pub fn pool_2(&self) -> &Arc<Pool> {
        &self.pool_2
    }

    /// Snapshot of the running totals.
    pub fn stats(&self) -> ExecutorStats {
        self.stats_guard().clone()
    }

    /// Simulate a round trip of `amount` without touching either pool.
    pub fn quote(&self, amount: Amount) -> Result<ArbitrageQuote, ArbitrageError> {
        let (state_1, state_2) = self.lock_pools();
        calculate_round_trip(
            &state_1,
            self.pool_1.fee_rate(),
            &state_2,
            self.pool_2.fee_rate(),
            amount,
        )
    }

    /// Run a round trip of `amount` and pay the proceeds to `caller`.
    #[instrument(skip(self), fields(pool_1 = %self.pool_1.id(), pool_2 = %self.pool_2.id()))]
    pub fn execute(&self, caller: &AccountId, amount: Amount) -> Result<ArbitrageReport, ArbitrageError> {
        let _timer = metrics::timer_arbitrage();
        let result = {
            let (mut state_1, mut state_2) = self.lock_pools();
            self.run_locked(&mut state_1, &mut state_2, caller, amount, None)
        };
        self.record(&result);
        result
    }

    /// Commit a previously obtained quote.
    ///
    /// Fails with [`ArbitrageError::StalePrice`] if either pool's spot price
    /// drifted beyond the configured tolerance since the quote was taken.
    #[instrument(skip(self, quote), fields(amount = %quote.amount_in, route = %quote.route))]
    pub fn execute_quote(
        &self,
        caller: &AccountId,
        quote: &ArbitrageQuote,
    ) -> Result<ArbitrageReport, ArbitrageError> {
        let _timer = metrics::timer_arbitrage();
        let result = {
            let (mut state_1, mut state_2) = self.lock_pools();
            self.run_locked(&mut state_1, &mut state_2, caller, quote.amount_in, Some(quote))
        };
        self.record(&result);
        result
    }

    /// Run a round trip sized for maximum profit, capped at `max_amount`.
    #[instrument(skip(self), fields(pool_1 = %self.pool_1.id(), pool_2 = %self.pool_2.id()))]
    pub fn execute_optimal(
        &self,
        caller: &AccountId,
        max_amount: Amount,
    ) -> Result<ArbitrageReport, ArbitrageError> {
        let _timer = metrics::timer_arbitrage();
        let result = {
            let (mut state_1, mut state_2) = self.lock_pools();
            self.size_optimal(&state_1, &state_2, max_amount)
                .and_then(|amount| {
                    debug!(%amount, "Sized round trip");
                    self.run_locked(&mut state_1, &mut state_2, caller, amount, None)
                })
        };
        self.record(&result);
        result
    }

    fn size_optimal(
        &self,
        state_1: &PoolState,
        state_2: &PoolState,
        max_amount: Amount,
    ) -> Result<Amount, ArbitrageError> {
        if max_amount <= Decimal::ZERO {
            return Err(ArbitrageError::InvalidAmount(max_amount));
        }
        let optimal = optimal_amount(
            state_1,
            self.pool_1.fee_rate(),
            state_2,
            self.pool_2.fee_rate(),
        )?;
        optimal
            .map(|amount| amount.min(max_amount))
            .ok_or(ArbitrageError::Unprofitable {
                amount_in: Decimal::ZERO,
                amount_out: Decimal::ZERO,
            })
    }

    /// Lock both pools in ascending id order; returns guards as (pool_1, pool_2).
    fn lock_pools(&self) -> (MutexGuard<'_, PoolState>, MutexGuard<'_, PoolState>) {
        if self.pool_1.id() < self.pool_2.id() {
            let state_1 = self.pool_1.lock();
            let state_2 = self.pool_2.lock();
            (state_1, state_2)
        } else {
            let state_2 = self.pool_2.lock();
            let state_1 = self.pool_1.lock();
            (state_1, state_2)
        }
    }

    fn run_locked(
        &self,
        state_1: &mut PoolState,
        state_2: &mut PoolState,
        caller: &AccountId,
        amount: Amount,
        expected: Option<&ArbitrageQuote>,
    ) -> Result<ArbitrageReport, ArbitrageError> {
        // Phase 1: simulate with both pools held
        let quote = calculate_round_trip(
            state_1,
            self.pool_1.fee_rate(),
            state_2,
            self.pool_2.fee_rate(),
            amount,
        )?;

        if let Some(expected) = expected {
            self.check_fresh(expected, &quote)?;
        }

        if !quote.is_profitable(self.min_profit) {
            diagnose_no_opportunity(
                quote.price_1,
                quote.price_2,
                self.pool_1.fee_rate(),
                self.pool_2.fee_rate(),
            );
            return Err(ArbitrageError::Unprofitable {
                amount_in: quote.amount_in,
                amount_out: quote.final_out,
            });
        }

        // Phase 2: commit
        self.commit_locked(state_1, state_2, caller, &quote)
    }

    fn check_fresh(&self, expected: &ArbitrageQuote, current: &ArbitrageQuote) -> Result<(), ArbitrageError> {
        for (then, now) in [
            (expected.price_1, current.price_1),
            (expected.price_2, current.price_2),
        ] {
            if relative_difference(then, now) > self.price_tolerance {
                warn!(expected = %then, actual = %now, "Spot price moved since quote");
                return Err(ArbitrageError::StalePrice {
                    expected: then,
                    actual: now,
                });
            }
        }
        Ok(())
    }

    fn commit_locked(
        &self,
        state_1: &mut PoolState,
        state_2: &mut PoolState,
        caller: &AccountId,
        quote: &ArbitrageQuote,
    ) -> Result<ArbitrageReport, ArbitrageError> {
        let route = quote.route;
        let (start_token, mid_token) = self.pool_1.tokens_for(route.leg_1);

        start_token.transfer_from(&self.account, caller, &self.account, quote.amount_in)?;

        // Leg 1
        let before_1 = state_1.clone();
        start_token.approve(&self.account, self.pool_1.account(), quote.amount_in);
        let leg_1 = match self
            .pool_1
            .swap_locked(state_1, &self.account, route.leg_1, quote.amount_in)
        {
            Ok(receipt) => receipt,
            Err(err) => {
                start_token.approve(&self.account, self.pool_1.account(), Decimal::ZERO);
                self.refund(start_token, caller, quote.amount_in);
                return Err(err.into());
            }
        };

        if relative_difference(leg_1.amount_out, quote.intermediate_out) > self.price_tolerance {
            warn!(
                expected = %quote.intermediate_out,
                actual = %leg_1.amount_out,
                "First leg diverged from simulation"
            );
            self.unwind(&self.pool_1, state_1, before_1, &leg_1);
            self.refund(start_token, caller, quote.amount_in);
            return Err(ArbitrageError::StalePrice {
                expected: quote.intermediate_out,
                actual: leg_1.amount_out,
            });
        }

        // Leg 2
        let before_2 = state_2.clone();
        mid_token.approve(&self.account, self.pool_2.account(), leg_1.amount_out);
        let leg_2 = match self
            .pool_2
            .swap_locked(state_2, &self.account, route.leg_2, leg_1.amount_out)
        {
            Ok(receipt) => receipt,
            Err(err) => {
                mid_token.approve(&self.account, self.pool_2.account(), Decimal::ZERO);
                self.unwind(&self.pool_1, state_1, before_1, &leg_1);
                self.refund(start_token, caller, quote.amount_in);
                return Err(err.into());
            }
        };

        if let Err(err) = start_token.transfer(&self.account, caller, leg_2.amount_out) {
            self.unwind(&self.pool_2, state_2, before_2, &leg_2);
            self.unwind(&self.pool_1, state_1, before_1, &leg_1);
            self.refund(start_token, caller, quote.amount_in);
            return Err(err.into());
        }

        let profit = leg_2.amount_out - quote.amount_in;
        info!(
            %caller,
            route = %route,
            token = %start_token.id(),
            amount_in = %quote.amount_in,
            amount_out = %leg_2.amount_out,
            %profit,
            "Arbitrage executed"
        );

        Ok(ArbitrageReport {
            route,
            profit_token: start_token.id().clone(),
            amount_in: quote.amount_in,
            amount_out: leg_2.amount_out,
            profit,
            leg_1,
            leg_2,
            executed_at: OffsetDateTime::now_utc(),
        })
    }

    fn unwind(&self, pool: &Pool, state: &mut PoolState, before: PoolState, receipt: &SwapReceipt) {
        if let Err(err) = pool.unwind_swap_locked(state, before, &self.account, receipt) {
            error!(pool = %pool.id(), error = %err, "Failed to unwind committed leg");
        }
    }

    fn refund(&self, token: &dyn TokenLedger, caller: &AccountId, amount: Amount) {
        if let Err(err) = token.transfer(&self.account, caller, amount) {
            error!(token = %token.id(), %caller, %amount, error = %err, "Failed to refund caller");
        }
    }

    fn stats_guard(&self) -> MutexGuard<'_, ExecutorStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, result: &Result<ArbitrageReport, ArbitrageError>) {
        let mut stats = self.stats_guard();
        stats.attempts += 1;

        match result {
            Ok(report) => {
                stats.executions += 1;
                if report.route.starts_in_a() {
                    stats.profit_a += report.profit;
                } else {
                    stats.profit_b += report.profit;
                }
                stats.last_execution = Some(report.executed_at);
                metrics::record_arbitrage_executed(report.profit);
            }
            Err(err) => {
                let reason = match err {
                    ArbitrageError::Unprofitable { .. } => "unprofitable",
                    ArbitrageError::StalePrice { .. } => "stale_price",
                    ArbitrageError::MismatchedPools => "mismatched_pools",
                    ArbitrageError::InvalidAmount(_) => "invalid_amount",
                    ArbitrageError::TransferFailed(_) => "transfer_failed",
                    ArbitrageError::Pool(_) => "pool",
                };
                if matches!(
                    err,
                    ArbitrageError::Unprofitable { .. } | ArbitrageError::StalePrice { .. }
                ) {
                    stats.rejections += 1;
                } else {
                    stats.failures += 1;
                }
                metrics::inc_arbitrage_rejected(reason);
                info!(reason, error = %err, "Arbitrage not executed");
            }
        }
    }
}
