//! Unified error types for the AMM engine.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::ledger::{AccountId, TokenId};

/// Unified error type for the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Pool operation error.
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),

    /// Arbitrage detection/execution error.
    #[error("arbitrage error: {0}")]
    Arbitrage(#[from] ArbitrageError),

    /// Token ledger error.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Token ledger errors, raised by the token collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Sender does not hold enough tokens.
    #[error("insufficient {token} balance for {account}: need {required}, have {available}")]
    InsufficientBalance {
        /// Token being moved.
        token: TokenId,
        /// Account that was debited.
        account: AccountId,
        /// Requested amount.
        required: Decimal,
        /// Current balance.
        available: Decimal,
    },

    /// Spender was not approved for enough tokens.
    #[error("insufficient {token} allowance from {owner} to {spender}: need {required}, have {available}")]
    InsufficientAllowance {
        /// Token being moved.
        token: TokenId,
        /// Token owner.
        owner: AccountId,
        /// Approved spender.
        spender: AccountId,
        /// Requested amount.
        required: Decimal,
        /// Current allowance.
        available: Decimal,
    },

    /// Account is frozen and cannot send or receive.
    #[error("{token} account {account} is frozen")]
    AccountFrozen {
        /// Token being moved.
        token: TokenId,
        /// Frozen account.
        account: AccountId,
    },

    /// Negative transfer amount.
    #[error("invalid transfer amount: {0}")]
    InvalidAmount(Decimal),
}

/// Pool and pricing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Zero or negative input amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Deposit amounts are not in the current reserve ratio.
    #[error("deposit ratio mismatch: token A ratio {ratio_a}, token B ratio {ratio_b}")]
    RatioMismatch {
        /// `amount_a / reserve_a`.
        ratio_a: Decimal,
        /// `amount_b / reserve_b`.
        ratio_b: Decimal,
    },

    /// Caller tried to burn more shares than it holds.
    #[error("insufficient shares: requested {requested}, available {available}")]
    InsufficientShares {
        /// Shares requested.
        requested: Decimal,
        /// Shares held.
        available: Decimal,
    },

    /// Swap would pay out nothing.
    #[error("insufficient output for input {amount_in}")]
    InsufficientOutput {
        /// Input amount.
        amount_in: Decimal,
    },

    /// Swap would drain the output reserve.
    #[error("excessive output: {amount_out} would drain reserve {reserve_out}")]
    ExcessiveOutput {
        /// Computed output.
        amount_out: Decimal,
        /// Output reserve.
        reserve_out: Decimal,
    },

    /// Pool has no liquidity for the requested operation.
    #[error("insufficient liquidity")]
    InsufficientLiquidity,

    /// Price query on an empty reserve.
    #[error("division by zero")]
    DivisionByZero,

    /// Fixed-point arithmetic overflowed.
    #[error("arithmetic overflow")]
    Overflow,

    /// Token collaborator rejected a transfer.
    #[error("transfer failed: {0}")]
    TransferFailed(#[from] LedgerError),
}

/// Arbitrage detection and execution errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArbitrageError {
    /// The round trip would not leave the caller better off.
    #[error("unprofitable: {amount_in} in, {amount_out} out")]
    Unprofitable {
        /// Amount put into leg one.
        amount_in: Decimal,
        /// Simulated or realized output of leg two.
        amount_out: Decimal,
    },

    /// Pool state moved between simulation and commit.
    #[error("stale price: expected {expected}, got {actual}")]
    StalePrice {
        /// Value seen at simulation time.
        expected: Decimal,
        /// Value seen at commit time.
        actual: Decimal,
    },

    /// Pools do not trade the same pair, or are the same pool.
    #[error("pools are not a distinct pair over the same tokens")]
    MismatchedPools,

    /// Zero or negative trade size.
    #[error("invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Token collaborator rejected a transfer.
    #[error("transfer failed: {0}")]
    TransferFailed(#[from] LedgerError),

    /// A leg failed inside a pool.
    #[error("pool leg failed: {0}")]
    Pool(#[from] PoolError),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, EngineError>;
