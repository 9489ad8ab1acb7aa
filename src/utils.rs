//! Utility functions.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;

/// Install the global tracing subscriber.
///
/// Verbose mode forces `amm_arb=debug,info`; otherwise `RUST_LOG` wins over the
/// configured level. Returns `false` if a subscriber was already installed.
pub fn init_logging(config: &Config) -> bool {
    let filter = if config.verbose {
        EnvFilter::new("amm_arb=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.rust_log))
    };

    let installed = if config.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .try_init()
    };

    installed.is_ok()
}
