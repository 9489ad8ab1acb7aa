//! Token ledger collaborator.
//!
//! This module handles:
//! - Account and token identifiers
//! - The fungible-token contract pools and executors move funds through
//! - An in-memory ledger for tests and embedding callers

pub mod memory;
pub mod types;

pub use memory::InMemoryToken;
pub use types::{AccountId, TokenId};

use std::fmt::Debug;

use crate::error::LedgerError;
use crate::math::Amount;

/// Fungible token balance ledger.
///
/// Implementations must apply each call atomically: a failed transfer leaves
/// balances and allowances untouched.
pub trait TokenLedger: Debug + Send + Sync {
    /// Identifier of this token.
    fn id(&self) -> &TokenId;

    /// Balance held by `account`.
    fn balance_of(&self, account: &AccountId) -> Amount;

    /// Move `amount` from `from` to `to`.
    ///
    /// The ledger does not authenticate `from`; callers only debit accounts
    /// they act for.
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<(), LedgerError>;

    /// Take back `amount` that the caller credited to `from` earlier in the
    /// same operation.
    ///
    /// This is a privileged reversal: it needs no allowance from `from`. Pools
    /// use it only to roll back their own payouts when a later step fails.
    /// Ledgers that restrict debits must grant it to pool accounts.
    fn reverse_transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.transfer(from, to, amount)
    }

    /// Allow `spender` to move up to `amount` of `owner`'s tokens.
    fn approve(&self, owner: &AccountId, spender: &AccountId, amount: Amount);

    /// Remaining amount `spender` may move on behalf of `owner`.
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount;

    /// Move `amount` from `owner` to `to` using `spender`'s allowance.
    fn transfer_from(
        &self,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError>;
}
