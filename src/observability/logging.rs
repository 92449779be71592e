//! Structured logging.
//!
//! # Design Decisions
//! - Uses `tracing` with an `EnvFilter`
//! - `RUST_LOG` wins over the configured level
//! - `tower_http` request spans follow the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive for a configured level such as `info` or `debug`.
pub fn default_directive(log_level: &str) -> String {
    format!(
        "redirect_gateway={level},tower_http={level}",
        level = log_level.to_ascii_lowercase()
    )
}

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(log_level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
