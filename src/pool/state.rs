//! Reserve and liquidity-share ledger of a single pool.
//!
//! Every mutating operation is split in two: `plan_*` validates and computes
//! the complete next state without touching `self`, and [`PoolState::commit`]
//! installs it. The pool moves tokens between the two steps, so a rejected
//! transfer leaves the ledger exactly as it was.

use std::collections::HashMap;

use rust_decimal::Decimal;

use super::types::{LiquidityPosition, SwapDirection, SwapQuote};
use crate::error::PoolError;
use crate::ledger::AccountId;
use crate::math::fixed::{checked_add, checked_div, checked_mul, checked_sub, relative_difference};
use crate::math::{geometric_mean, mul_div_floor, slippage, spot_price, swap_output, truncate, Amount};

/// Reserves, outstanding shares and per-account share balances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolState {
    reserve_a: Amount,
    reserve_b: Amount,
    total_shares: Amount,
    shares: HashMap<AccountId, Amount>,
    last_fee_a: Amount,
    last_fee_b: Amount,
}

/// Fully computed next state for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    reserve_a: Amount,
    reserve_b: Amount,
    total_shares: Amount,
    account_shares: Option<(AccountId, Amount)>,
    fee: Option<(SwapDirection, Amount)>,
}

impl PoolState {
    /// Token A reserve.
    pub fn reserve_a(&self) -> Amount {
        self.reserve_a
    }

    /// Token B reserve.
    pub fn reserve_b(&self) -> Amount {
        self.reserve_b
    }

    /// Outstanding liquidity shares.
    pub fn total_shares(&self) -> Amount {
        self.total_shares
    }

    /// Shares held by `account`.
    pub fn shares_of(&self, account: &AccountId) -> Amount {
        self.shares.get(account).copied().unwrap_or_default()
    }

    /// Fee charged by the latest A-to-B swap.
    pub fn last_fee_a(&self) -> Amount {
        self.last_fee_a
    }

    /// Fee charged by the latest B-to-A swap.
    pub fn last_fee_b(&self) -> Amount {
        self.last_fee_b
    }

    /// Number of accounts holding shares.
    pub fn provider_count(&self) -> usize {
        self.shares.len()
    }

    /// No shares outstanding.
    pub fn is_empty(&self) -> bool {
        self.total_shares.is_zero()
    }

    /// `(reserve_in, reserve_out)` for a swap direction.
    pub fn reserves_for(&self, direction: SwapDirection) -> (Amount, Amount) {
        match direction {
            SwapDirection::AToB => (self.reserve_a, self.reserve_b),
            SwapDirection::BToA => (self.reserve_b, self.reserve_a),
        }
    }

    /// `reserve_a / reserve_b`.
    pub fn spot_price(&self) -> Result<Decimal, PoolError> {
        spot_price(self.reserve_a, self.reserve_b)
    }

    /// Derived claim of `account` on current reserves.
    pub fn position(&self, account: &AccountId) -> Result<LiquidityPosition, PoolError> {
        let shares = self.shares_of(account);
        let (share_fraction, claim_a, claim_b) = if shares.is_zero() {
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
        } else {
            let (claim_a, claim_b) = self.redeemable(shares)?;
            (truncate(checked_div(shares, self.total_shares)?), claim_a, claim_b)
        };

        Ok(LiquidityPosition {
            account: account.clone(),
            shares,
            share_fraction,
            claim_a,
            claim_b,
        })
    }

    /// Validate a deposit and compute the shares it mints.
    ///
    /// The first deposit sets the price and mints `sqrt(a * b)` shares. Later
    /// deposits must match the reserve ratio within `ratio_tolerance`
    /// (relative) and mint `total_shares * min(a / reserve_a, b / reserve_b)`.
    pub fn plan_deposit(
        &self,
        account: &AccountId,
        amount_a: Amount,
        amount_b: Amount,
        ratio_tolerance: Decimal,
    ) -> Result<(Amount, Transition), PoolError> {
        if amount_a <= Decimal::ZERO {
            return Err(PoolError::InvalidAmount(amount_a));
        }
        if amount_b <= Decimal::ZERO {
            return Err(PoolError::InvalidAmount(amount_b));
        }

        let minted = if self.is_empty() {
            geometric_mean(amount_a, amount_b)?
        } else {
            let ratio_a = checked_div(amount_a, self.reserve_a)?;
            let ratio_b = checked_div(amount_b, self.reserve_b)?;
            if relative_difference(ratio_a, ratio_b) > ratio_tolerance {
                return Err(PoolError::RatioMismatch { ratio_a, ratio_b });
            }
            truncate(checked_mul(self.total_shares, ratio_a.min(ratio_b))?)
        };

        if minted.is_zero() {
            return Err(PoolError::InsufficientLiquidity);
        }

        let transition = Transition {
            reserve_a: checked_add(self.reserve_a, amount_a)?,
            reserve_b: checked_add(self.reserve_b, amount_b)?,
            total_shares: checked_add(self.total_shares, minted)?,
            account_shares: Some((account.clone(), checked_add(self.shares_of(account), minted)?)),
            fee: None,
        };

        Ok((minted, transition))
    }

    /// Validate a withdrawal and compute the reserves it releases.
    pub fn plan_withdraw(
        &self,
        account: &AccountId,
        shares: Amount,
    ) -> Result<((Amount, Amount), Transition), PoolError> {
        if shares <= Decimal::ZERO {
            return Err(PoolError::InvalidAmount(shares));
        }
        let held = self.shares_of(account);
        if shares > held {
            return Err(PoolError::InsufficientShares {
                requested: shares,
                available: held,
            });
        }

        let (amount_a, amount_b) = self.redeemable(shares)?;

        let transition = Transition {
            reserve_a: checked_sub(self.reserve_a, amount_a)?,
            reserve_b: checked_sub(self.reserve_b, amount_b)?,
            total_shares: checked_sub(self.total_shares, shares)?,
            account_shares: Some((account.clone(), checked_sub(held, shares)?)),
            fee: None,
        };

        Ok(((amount_a, amount_b), transition))
    }

    /// Price a swap and compute the reserves after it.
    ///
    /// The whole `amount_in`, fee included, lands in the input reserve.
    pub fn plan_swap(
        &self,
        direction: SwapDirection,
        amount_in: Amount,
        fee_rate: Decimal,
    ) -> Result<(SwapQuote, Transition), PoolError> {
        if amount_in <= Decimal::ZERO {
            return Err(PoolError::InvalidAmount(amount_in));
        }
        if self.is_empty() {
            return Err(PoolError::InsufficientLiquidity);
        }

        let (reserve_in, reserve_out) = self.reserves_for(direction);
        let priced = swap_output(amount_in, reserve_in, reserve_out, fee_rate)?;

        if priced.amount_out <= Decimal::ZERO {
            return Err(PoolError::InsufficientOutput { amount_in });
        }
        if priced.amount_out >= reserve_out {
            return Err(PoolError::ExcessiveOutput {
                amount_out: priced.amount_out,
                reserve_out,
            });
        }

        let quote = SwapQuote {
            direction,
            amount_in,
            amount_out: priced.amount_out,
            fee: priced.fee,
            reserve_in,
            reserve_out,
            slippage_pct: slippage(priced.amount_out, amount_in, reserve_in, reserve_out)?,
        };

        let new_in = checked_add(reserve_in, amount_in)?;
        let new_out = checked_sub(reserve_out, priced.amount_out)?;
        let (reserve_a, reserve_b) = match direction {
            SwapDirection::AToB => (new_in, new_out),
            SwapDirection::BToA => (new_out, new_in),
        };

        let transition = Transition {
            reserve_a,
            reserve_b,
            total_shares: self.total_shares,
            account_shares: None,
            fee: Some((direction, priced.fee)),
        };

        Ok((quote, transition))
    }

    /// Price a swap without planning the state change.
    pub fn quote_swap(
        &self,
        direction: SwapDirection,
        amount_in: Amount,
        fee_rate: Decimal,
    ) -> Result<SwapQuote, PoolError> {
        self.plan_swap(direction, amount_in, fee_rate).map(|(quote, _)| quote)
    }

    /// Install a planned transition.
    pub fn commit(&mut self, transition: Transition) {
        self.reserve_a = transition.reserve_a;
        self.reserve_b = transition.reserve_b;
        self.total_shares = transition.total_shares;

        if let Some((account, balance)) = transition.account_shares {
            if balance.is_zero() {
                self.shares.remove(&account);
            } else {
                self.shares.insert(account, balance);
            }
        }

        match transition.fee {
            Some((SwapDirection::AToB, fee)) => self.last_fee_a = fee,
            Some((SwapDirection::BToA, fee)) => self.last_fee_b = fee,
            None => {}
        }
    }

    /// Ledger invariants: shares sum to the total, and the pool is empty in
    /// shares exactly when it is empty in both reserves.
    pub fn invariants_hold(&self) -> bool {
        let share_sum: Amount = self.shares.values().copied().sum();
        let empty_shares = self.total_shares.is_zero();
        let empty_reserves = self.reserve_a.is_zero() && self.reserve_b.is_zero();

        share_sum == self.total_shares
            && empty_shares == empty_reserves
            && self.reserve_a >= Decimal::ZERO
            && self.reserve_b >= Decimal::ZERO
    }

    fn redeemable(&self, shares: Amount) -> Result<(Amount, Amount), PoolError> {
        // burning everything returns the reserves exactly, dust included
        if shares == self.total_shares {
            return Ok((self.reserve_a, self.reserve_b));
        }
        let amount_a = mul_div_floor(self.reserve_a, shares, self.total_shares)?;
        let amount_b = mul_div_floor(self.reserve_b, shares, self.total_shares)?;
        Ok((amount_a, amount_b))
    }
}
