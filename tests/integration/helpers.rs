//! Shared fixtures.

use std::sync::Arc;

use amm_arb::ledger::{AccountId, InMemoryToken, TokenLedger};
use amm_arb::pool::Pool;
use amm_arb::Config;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Supply minted to the liquidity provider on each token.
pub const LP_SUPPLY: Decimal = dec!(1000000);

/// Two tokens and the account that seeds every pool.
pub struct Market {
    pub token_a: Arc<InMemoryToken>,
    pub token_b: Arc<InMemoryToken>,
    pub lp: AccountId,
}

impl Market {
    pub fn new() -> Self {
        let lp = AccountId::new("lp");
        Self {
            token_a: Arc::new(InMemoryToken::new("tka", "TKA", &lp, LP_SUPPLY)),
            token_b: Arc::new(InMemoryToken::new("tkb", "TKB", &lp, LP_SUPPLY)),
            lp,
        }
    }

    /// Empty pool with default fee.
    pub fn empty_pool(&self) -> Arc<Pool> {
        Arc::new(Pool::new(
            self.token_a.clone(),
            self.token_b.clone(),
            &Config::default(),
        ))
    }

    /// Pool seeded by the liquidity provider.
    pub fn pool(&self, reserve_a: Decimal, reserve_b: Decimal) -> Arc<Pool> {
        let pool = self.empty_pool();
        self.approve_pool(&self.lp, &pool, reserve_a, reserve_b);
        pool.deposit(&self.lp, reserve_a, reserve_b)
            .expect("seed deposit");
        pool
    }

    /// Fresh account holding `amount` of both tokens.
    pub fn trader(&self, name: &str, amount: Decimal) -> AccountId {
        let account = AccountId::new(name);
        self.token_a.mint(&account, amount);
        self.token_b.mint(&account, amount);
        account
    }

    pub fn approve_pool(&self, owner: &AccountId, pool: &Pool, amount_a: Decimal, amount_b: Decimal) {
        self.token_a.approve(owner, pool.account(), amount_a);
        self.token_b.approve(owner, pool.account(), amount_b);
    }

    pub fn balances(&self, account: &AccountId) -> (Decimal, Decimal) {
        (self.token_a.balance_of(account), self.token_b.balance_of(account))
    }
}
