//! In-memory token ledger.
//!
//! Stands in for the on-chain token contract in tests and in callers that
//! embed the engine. Supports freezing accounts to simulate rejected
//! transfers.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use tracing::trace;

use super::types::{AccountId, TokenId};
use super::TokenLedger;
use crate::error::LedgerError;
use crate::math::Amount;

#[derive(Debug, Default)]
struct Book {
    balances: HashMap<AccountId, Amount>,
    allowances: HashMap<(AccountId, AccountId), Amount>,
    frozen: HashSet<AccountId>,
    total_supply: Amount,
}

/// Mutex-guarded fungible token ledger.
#[derive(Debug)]
pub struct InMemoryToken {
    id: TokenId,
    symbol: String,
    book: Mutex<Book>,
}

impl InMemoryToken {
    /// Create a token and credit the whole initial supply to `holder`.
    pub fn new(
        id: impl Into<TokenId>,
        symbol: impl Into<String>,
        holder: &AccountId,
        initial_supply: Amount,
    ) -> Self {
        let token = Self {
            id: id.into(),
            symbol: symbol.into(),
            book: Mutex::new(Book::default()),
        };
        token.mint(holder, initial_supply);
        token
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Total tokens in existence.
    pub fn total_supply(&self) -> Amount {
        self.book().total_supply
    }

    /// Create `amount` new tokens for `account`. Non-positive amounts are ignored.
    pub fn mint(&self, account: &AccountId, amount: Amount) {
        if amount <= Decimal::ZERO {
            return;
        }
        let mut book = self.book();
        *book.balances.entry(account.clone()).or_default() += amount;
        book.total_supply += amount;
    }

    /// Make every transfer from or to `account` fail.
    pub fn freeze(&self, account: &AccountId) {
        self.book().frozen.insert(account.clone());
    }

    /// Undo [`InMemoryToken::freeze`].
    pub fn unfreeze(&self, account: &AccountId) {
        self.book().frozen.remove(account);
    }

    fn book(&self) -> MutexGuard<'_, Book> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_movable(
        &self,
        book: &Book,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        for account in [from, to] {
            if book.frozen.contains(account) {
                return Err(LedgerError::AccountFrozen {
                    token: self.id.clone(),
                    account: account.clone(),
                });
            }
        }
        let available = book.balances.get(from).copied().unwrap_or_default();
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                token: self.id.clone(),
                account: from.clone(),
                required: amount,
                available,
            });
        }
        Ok(())
    }

    fn settle(book: &mut Book, from: &AccountId, to: &AccountId, amount: Amount) {
        if let Some(balance) = book.balances.get_mut(from) {
            *balance -= amount;
        }
        *book.balances.entry(to.clone()).or_default() += amount;
    }
}

impl TokenLedger for InMemoryToken {
    fn id(&self) -> &TokenId {
        &self.id
    }

    fn balance_of(&self, account: &AccountId) -> Amount {
        self.book().balances.get(account).copied().unwrap_or_default()
    }

    fn transfer(&self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<(), LedgerError> {
        let mut book = self.book();
        self.check_movable(&book, from, to, amount)?;
        Self::settle(&mut book, from, to, amount);
        trace!(token = %self.id, %from, %to, %amount, "transfer");
        Ok(())
    }

    fn approve(&self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        self.book()
            .allowances
            .insert((owner.clone(), spender.clone()), amount.max(Decimal::ZERO));
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.book()
            .allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or_default()
    }

    fn transfer_from(
        &self,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let mut book = self.book();
        let key = (owner.clone(), spender.clone());
        let allowed = book.allowances.get(&key).copied().unwrap_or_default();
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance {
                token: self.id.clone(),
                owner: owner.clone(),
                spender: spender.clone(),
                required: amount,
                available: allowed,
            });
        }
        self.check_movable(&book, owner, to, amount)?;
        book.allowances.insert(key, allowed - amount);
        Self::settle(&mut book, owner, to, amount);
        trace!(token = %self.id, %spender, %owner, %to, %amount, "transfer_from");
        Ok(())
    }
}
