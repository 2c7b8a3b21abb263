//! Tracing subscriber setup

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AppConfig;

/// Builds the event filter; `RUST_LOG` overrides the configured level
pub fn env_filter(min_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(min_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber
///
/// JSON output is used in production unless `logging.json` says otherwise.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: &AppConfig) -> Result<(), TryInitError> {
    let logging = &config.logging;
    let registry = tracing_subscriber::registry().with(env_filter(&logging.min_level));

    if config.json_logs() {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(logging.report_caller)
                    .with_line_number(logging.report_caller),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(logging.use_color)
                    .with_file(logging.report_caller)
                    .with_line_number(logging.report_caller),
            )
            .try_init()
    }
}
