//! Logging bootstrap
//!
//! Installs a `tracing` subscriber writing to stderr. The filter comes from
//! `BUDGETME_LOG` when set, otherwise from the configured level.
//!
//! Initialization is idempotent: later calls are no-ops and never panic.

use std::sync::OnceLock;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable overriding the configured filter
pub const LOG_ENV_VAR: &str = "BUDGETME_LOG";

static ACTIVE_FILTER: OnceLock<String> = OnceLock::new();

/// Initialize logging with a default filter such as `info` or `budgetme=debug`.
///
/// Returns the filter that is active after the call. If another subscriber
/// was installed first (e.g. by a test harness) the error is ignored.
pub fn init_logging(default_level: &str) -> &'static str {
    ACTIVE_FILTER.get_or_init(|| {
        let directive = std::env::var(LOG_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default_level.to_string());

        let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init();

        tracing::debug!(filter = %directive, version = env!("CARGO_PKG_VERSION"), "logging initialized");
        directive
    })
}

/// The active filter, or `None` before [`init_logging`] ran
pub fn active_filter() -> Option<&'static str> {
    ACTIVE_FILTER.get().map(String::as_str)
}
