//! Engine configuration loaded from environment variables.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::EngineError;

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "AMM_";

/// Engine configuration loaded from `AMM_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Pool Parameters ===
    /// Input-side swap fee as a fraction (0.003 = 0.3%).
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,

    /// Maximum relative disagreement between the two deposit ratios.
    #[serde(default = "default_ratio_tolerance")]
    pub ratio_tolerance: Decimal,

    // === Arbitrage Parameters ===
    /// Profit must be strictly greater than this to execute.
    #[serde(default)]
    pub min_profit: Decimal,

    /// Maximum relative drift between simulated and realized values.
    #[serde(default = "default_price_tolerance")]
    pub price_tolerance: Decimal,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub log_json: bool,
}

fn default_fee_rate() -> Decimal {
    Decimal::new(3, 3) // 0.003
}

fn default_ratio_tolerance() -> Decimal {
    Decimal::new(1, 4) // 0.0001
}

fn default_price_tolerance() -> Decimal {
    Decimal::new(1, 6) // 0.000001
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fee_rate: default_fee_rate(),
            ratio_tolerance: default_ratio_tolerance(),
            min_profit: Decimal::ZERO,
            price_tolerance: default_price_tolerance(),
            rust_log: default_log_level(),
            verbose: false,
            log_json: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, EngineError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::prefixed(ENV_PREFIX).from_env()?;
        config.validate().map_err(EngineError::InvalidConfig)?;
        Ok(config)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.fee_rate < Decimal::ZERO || self.fee_rate >= Decimal::ONE {
            return Err("AMM_FEE_RATE must be in [0, 1)".to_string());
        }

        if self.ratio_tolerance < Decimal::ZERO {
            return Err("AMM_RATIO_TOLERANCE must not be negative".to_string());
        }

        if self.min_profit < Decimal::ZERO {
            return Err("AMM_MIN_PROFIT must not be negative".to_string());
        }

        if self.price_tolerance < Decimal::ZERO {
            return Err("AMM_PRICE_TOLERANCE must not be negative".to_string());
        }

        Ok(())
    }

    /// Fee rate expressed in basis points.
    pub fn fee_bps(&self) -> Decimal {
        self.fee_rate * Decimal::new(10_000, 0)
    }
}
