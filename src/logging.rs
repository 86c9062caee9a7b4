//! Structured logging setup

use std::sync::Once;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Install the global subscriber. `RUST_LOG` wins over `logging.level`.
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(&config.level);

        if config.json {
            let _ = tracing_subscriber::fmt()
                .json()
                .with_target(true)
                .with_env_filter(filter)
                .try_init();
        } else {
            let _ = tracing_subscriber::fmt()
                .with_target(true)
                .with_env_filter(filter)
                .try_init();
        }

        tracing::info!(level = %config.level, json = config.json, "Logging initialized");
    });
}

fn build_filter(level: &str) -> EnvFilter {
    let base = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Suppress noisy libraries
    ["hyper=warn", "reqwest=warn"]
        .into_iter()
        .filter_map(|d| d.parse().ok())
        .fold(base, |filter, directive| filter.add_directive(directive))
}
