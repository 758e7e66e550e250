//! # Logging
//!
//! Diagnostics go to stderr through `tracing`; stdout is reserved for the
//! benchmark report.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor the config names one.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Builds the active filter: `RUST_LOG` first, then `fallback`, then
/// [`DEFAULT_LOG_FILTER`].
#[must_use]
pub fn filter(fallback: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback.unwrap_or(DEFAULT_LOG_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global stderr subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init(fallback: Option<&str>) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter(fallback))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
