//! Two-token constant-product pool.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use tracing::{debug, error, info, instrument, warn};

use super::state::PoolState;
use super::types::{LiquidityPosition, PoolId, PoolSnapshot, SwapDirection, SwapQuote, SwapReceipt};
use crate::config::Config;
use crate::error::PoolError;
use crate::ledger::{AccountId, TokenLedger};
use crate::math::fixed::{checked_add, checked_mul};
use crate::math::Amount;
use crate::metrics;

/// Constant-product pool over one token pair.
///
/// All state lives behind one mutex held for the whole of each operation,
/// ledger transfers included, so operations on one pool are serializable.
#[derive(Debug)]
pub struct Pool {
    id: PoolId,
    account: AccountId,
    token_a: Arc<dyn TokenLedger>,
    token_b: Arc<dyn TokenLedger>,
    fee_rate: Decimal,
    ratio_tolerance: Decimal,
    state: Mutex<PoolState>,
}

impl Pool {
    /// Create an empty pool using the configured fee and ratio tolerance.
    pub fn new(token_a: Arc<dyn TokenLedger>, token_b: Arc<dyn TokenLedger>, config: &Config) -> Self {
        Self::with_params(token_a, token_b, config.fee_rate, config.ratio_tolerance)
    }

    /// Create an empty pool with an explicit fee rate and deposit ratio tolerance.
    pub fn with_params(
        token_a: Arc<dyn TokenLedger>,
        token_b: Arc<dyn TokenLedger>,
        fee_rate: Decimal,
        ratio_tolerance: Decimal,
    ) -> Self {
        let id = PoolId::next();
        debug!(pool = %id, token_a = %token_a.id(), token_b = %token_b.id(), %fee_rate, "Pool created");
        Self {
            id,
            account: AccountId::new(id.to_string()),
            token_a,
            token_b,
            fee_rate,
            ratio_tolerance,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Pool identifier.
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// Account holding the pool's reserves on both ledgers.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Token A ledger.
    pub fn token_a(&self) -> &Arc<dyn TokenLedger> {
        &self.token_a
    }

    /// Token B ledger.
    pub fn token_b(&self) -> &Arc<dyn TokenLedger> {
        &self.token_b
    }

    /// Fraction of every swap input kept as fee.
    pub fn fee_rate(&self) -> Decimal {
        self.fee_rate
    }

    /// Whether `other` trades the same (A, B) pair.
    pub fn same_pair(&self, other: &Pool) -> bool {
        self.token_a.id() == other.token_a.id() && self.token_b.id() == other.token_b.id()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, PoolState> {
        // state is only written after every fallible step, so a poisoned guard is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // === Liquidity ===

    /// Add liquidity and mint shares to `caller`.
    ///
    /// The caller must have approved the pool's account for both amounts.
    #[instrument(skip(self), fields(pool = %self.id))]
    pub fn deposit(
        &self,
        caller: &AccountId,
        amount_a: Amount,
        amount_b: Amount,
    ) -> Result<Amount, PoolError> {
        let mut state = self.lock();
        let result = self.deposit_locked(&mut state, caller, amount_a, amount_b);
        self.track("deposit", &state, result)
    }

    fn deposit_locked(
        &self,
        state: &mut PoolState,
        caller: &AccountId,
        amount_a: Amount,
        amount_b: Amount,
    ) -> Result<Amount, PoolError> {
        let (minted, transition) =
            state.plan_deposit(caller, amount_a, amount_b, self.ratio_tolerance)?;

        self.pull(self.token_a.as_ref(), caller, amount_a)?;
        if let Err(err) = self.pull(self.token_b.as_ref(), caller, amount_b) {
            self.compensate(self.token_a.as_ref(), &self.account, caller, amount_a);
            return Err(err);
        }

        state.commit(transition);
        metrics::inc_deposits(self.id);
        info!(%caller, %amount_a, %amount_b, shares = %minted, "Liquidity deposited");
        Ok(minted)
    }

    /// Burn `shares` of `caller` and pay out the proportional reserves.
    #[instrument(skip(self), fields(pool = %self.id))]
    pub fn withdraw(&self, caller: &AccountId, shares: Amount) -> Result<(Amount, Amount), PoolError> {
        let mut state = self.lock();
        let result = self.withdraw_locked(&mut state, caller, shares);
        self.track("withdraw", &state, result)
    }

    fn withdraw_locked(
        &self,
        state: &mut PoolState,
        caller: &AccountId,
        shares: Amount,
    ) -> Result<(Amount, Amount), PoolError> {
        let ((amount_a, amount_b), transition) = state.plan_withdraw(caller, shares)?;

        self.push(self.token_a.as_ref(), caller, amount_a)?;
        if let Err(err) = self.push(self.token_b.as_ref(), caller, amount_b) {
            self.compensate(self.token_a.as_ref(), caller, &self.account, amount_a);
            return Err(err);
        }

        state.commit(transition);
        metrics::inc_withdrawals(self.id);
        info!(%caller, %shares, %amount_a, %amount_b, "Liquidity withdrawn");
        Ok((amount_a, amount_b))
    }

    // === Swaps ===

    /// Swap `amount_in` of the direction's input token for the output token.
    ///
    /// The caller must have approved the pool's account for `amount_in`.
    #[instrument(skip(self), fields(pool = %self.id))]
    pub fn swap(
        &self,
        caller: &AccountId,
        direction: SwapDirection,
        amount_in: Amount,
    ) -> Result<SwapReceipt, PoolError> {
        let mut state = self.lock();
        let result = self.swap_locked(&mut state, caller, direction, amount_in);
        self.track("swap", &state, result)
    }

    /// Swap token A for token B, returning the B received.
    pub fn swap_a_for_b(&self, caller: &AccountId, amount_in: Amount) -> Result<Amount, PoolError> {
        self.swap(caller, SwapDirection::AToB, amount_in)
            .map(|receipt| receipt.amount_out)
    }

    /// Swap token B for token A, returning the A received.
    pub fn swap_b_for_a(&self, caller: &AccountId, amount_in: Amount) -> Result<Amount, PoolError> {
        self.swap(caller, SwapDirection::BToA, amount_in)
            .map(|receipt| receipt.amount_out)
    }

    /// Price a swap against current reserves without executing it.
    pub fn quote(&self, direction: SwapDirection, amount_in: Amount) -> Result<SwapQuote, PoolError> {
        self.lock().quote_swap(direction, amount_in, self.fee_rate)
    }

    pub(crate) fn swap_locked(
        &self,
        state: &mut PoolState,
        trader: &AccountId,
        direction: SwapDirection,
        amount_in: Amount,
    ) -> Result<SwapReceipt, PoolError> {
        let (quote, transition) = state.plan_swap(direction, amount_in, self.fee_rate)?;
        let (token_in, token_out) = self.tokens_for(direction);

        self.pull(token_in, trader, quote.amount_in)?;
        if let Err(err) = self.push(token_out, trader, quote.amount_out) {
            self.compensate(token_in, &self.account, trader, quote.amount_in);
            return Err(err);
        }

        state.commit(transition);
        metrics::record_swap(self.id, direction, quote.slippage_pct);
        debug!(
            %trader,
            %direction,
            amount_in = %quote.amount_in,
            amount_out = %quote.amount_out,
            fee = %quote.fee,
            slippage_pct = %quote.slippage_pct,
            "Swap executed"
        );
        Ok(SwapReceipt::from_quote(self.id, &quote))
    }

    /// Reverse a swap performed by `swap_locked` and restore `before`.
    ///
    /// The trader hands back the output and the pool refunds the input. State is
    /// only restored when both movements succeed.
    pub(crate) fn unwind_swap_locked(
        &self,
        state: &mut PoolState,
        before: PoolState,
        trader: &AccountId,
        receipt: &SwapReceipt,
    ) -> Result<(), PoolError> {
        let (token_in, token_out) = self.tokens_for(receipt.direction);

        token_out.reverse_transfer(trader, &self.account, receipt.amount_out)?;
        if let Err(err) = token_in.transfer(&self.account, trader, receipt.amount_in) {
            self.compensate(token_out, &self.account, trader, receipt.amount_out);
            return Err(err.into());
        }

        *state = before;
        warn!(pool = %self.id, %trader, direction = %receipt.direction, "Swap unwound");
        Ok(())
    }

    // === Queries ===

    /// Spot price `reserve_a / reserve_b`.
    pub fn spot_price(&self) -> Result<Decimal, PoolError> {
        self.lock().spot_price()
    }

    /// Token A reserve.
    pub fn reserve_a(&self) -> Amount {
        self.lock().reserve_a()
    }

    /// Token B reserve.
    pub fn reserve_b(&self) -> Amount {
        self.lock().reserve_b()
    }

    /// Outstanding liquidity shares.
    pub fn total_shares(&self) -> Amount {
        self.lock().total_shares()
    }

    /// Alias of [`Pool::total_shares`].
    pub fn reserve_lpt(&self) -> Amount {
        self.total_shares()
    }

    /// Shares held by `account`.
    pub fn shares_of(&self, account: &AccountId) -> Amount {
        self.lock().shares_of(account)
    }

    /// Alias of [`Pool::shares_of`].
    pub fn lpt_balance_of(&self, account: &AccountId) -> Amount {
        self.shares_of(account)
    }

    /// Fee charged by the latest A-to-B swap.
    pub fn last_fee_a(&self) -> Amount {
        self.lock().last_fee_a()
    }

    /// Alias of [`Pool::last_fee_a`].
    pub fn fee_a(&self) -> Amount {
        self.last_fee_a()
    }

    /// Fee charged by the latest B-to-A swap.
    pub fn last_fee_b(&self) -> Amount {
        self.lock().last_fee_b()
    }

    /// Alias of [`Pool::last_fee_b`].
    pub fn fee_b(&self) -> Amount {
        self.last_fee_b()
    }

    /// An account's share balance and current claim.
    pub fn position(&self, account: &AccountId) -> Result<LiquidityPosition, PoolError> {
        self.lock().position(account)
    }

    /// Point-in-time view of the pool.
    pub fn snapshot(&self) -> Result<PoolSnapshot, PoolError> {
        let state = self.lock();
        self.snapshot_of(&state)
    }

    pub(crate) fn snapshot_of(&self, state: &PoolState) -> Result<PoolSnapshot, PoolError> {
        let (spot_price, tvl_in_a) = if state.is_empty() {
            (None, Decimal::ZERO)
        } else {
            let price = state.spot_price()?;
            let tvl = checked_add(state.reserve_a(), checked_mul(state.reserve_b(), price)?)?;
            (Some(price), tvl)
        };

        Ok(PoolSnapshot {
            pool_id: self.id,
            reserve_a: state.reserve_a(),
            reserve_b: state.reserve_b(),
            total_shares: state.total_shares(),
            spot_price,
            tvl_in_a,
            last_fee_a: state.last_fee_a(),
            last_fee_b: state.last_fee_b(),
            providers: state.provider_count(),
        })
    }

    /// Ledger invariants of the current state.
    pub fn invariants_hold(&self) -> bool {
        self.lock().invariants_hold()
    }

    // === Internals ===

    pub(crate) fn tokens_for(&self, direction: SwapDirection) -> (&dyn TokenLedger, &dyn TokenLedger) {
        match direction {
            SwapDirection::AToB => (self.token_a.as_ref(), self.token_b.as_ref()),
            SwapDirection::BToA => (self.token_b.as_ref(), self.token_a.as_ref()),
        }
    }

    fn pull(&self, token: &dyn TokenLedger, from: &AccountId, amount: Amount) -> Result<(), PoolError> {
        token
            .transfer_from(&self.account, from, &self.account, amount)
            .map_err(PoolError::from)
    }

    fn push(&self, token: &dyn TokenLedger, to: &AccountId, amount: Amount) -> Result<(), PoolError> {
        token
            .transfer(&self.account, to, amount)
            .map_err(PoolError::from)
    }

    /// Return a leg that already moved. Failure here leaves the ledgers out of
    /// step with the pool and is logged, not retried.
    /// Reverse a movement made earlier in the same operation. Failures are
    /// logged and not retried.
    fn compensate(&self, token: &dyn TokenLedger, from: &AccountId, to: &AccountId, amount: Amount) {
        if let Err(err) = token.reverse_transfer(from, to, amount) {
            error!(
                pool = %self.id,
                token = %token.id(),
                %from,
                %to,
                %amount,
                error = %err,
                "Compensating transfer failed"
            );
        }
    }

    fn track<T>(
        &self,
        operation: &'static str,
        state: &PoolState,
        result: Result<T, PoolError>,
    ) -> Result<T, PoolError> {
        match &result {
            Ok(_) => metrics::set_reserves(self.id, state.reserve_a(), state.reserve_b()),
            Err(err) => {
                metrics::inc_pool_failures(self.id, operation);
                warn!(pool = %self.id, operation, error = %err, "Pool operation rejected");
            }
        }
        result
    }
}
